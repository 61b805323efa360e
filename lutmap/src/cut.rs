//! Covering candidates.

use itertools::Itertools;

use crate::logexpr::LogExpr;
use crate::traits::{Signal, SubjectGraph};

/// A cut: a set of subject-graph leaves together with the function a LUT would compute from them to replace `root`.
///
/// Variable `i` of the expression stands for leaf `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cut {
    root: usize,
    inputs: Vec<usize>,
    expr: LogExpr,
}

impl Cut {
    /// Creates a cut.
    ///
    /// # Panics
    ///
    /// Panics if the expression uses a variable with no leaf.
    #[must_use]
    pub fn new(root: usize, inputs: Vec<usize>, expr: LogExpr) -> Self {
        assert!(
            expr.input_size() <= inputs.len(),
            "cut of node {} has {} leaves but its expression uses {} variables",
            root,
            inputs.len(),
            expr.input_size()
        );

        Self { root, inputs, expr }
    }

    /// Creates the cut of a logic node over its own fanins.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a logic node.
    #[must_use]
    pub fn trivial<G: SubjectGraph + ?Sized>(sbj: &G, node: usize) -> Self {
        assert!(sbj.is_logic(node), "node {} is not a logic node", node);

        let fanins = [sbj.fanin(node, 0), sbj.fanin(node, 1)];
        let inputs = fanins.iter().filter_map(|signal| signal.node).unique().collect::<Vec<_>>();

        let literal = |signal: &Signal| match signal.node {
            None => LogExpr::Const(signal.inv),
            Some(leaf) => {
                let var = inputs.iter().position(|&input| input == leaf).unwrap_or_default();
                LogExpr::literal(var, signal.inv)
            }
        };
        let expr = literal(&fanins[0]) & literal(&fanins[1]);

        Self::new(node, inputs, expr)
    }

    /// Returns the node this cut covers.
    #[must_use]
    pub const fn root(&self) -> usize {
        self.root
    }

    /// Returns the number of leaves.
    #[must_use]
    pub fn ni(&self) -> usize {
        self.inputs.len()
    }

    /// Returns leaf `i`.
    #[must_use]
    pub fn input(&self, i: usize) -> usize {
        self.inputs[i]
    }

    /// Returns every leaf, in variable order.
    #[must_use]
    pub fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    /// Returns the function of the leaves.
    #[must_use]
    pub const fn expr(&self) -> &LogExpr {
        &self.expr
    }
}
