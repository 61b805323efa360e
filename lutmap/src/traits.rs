use std::ops::Not;

use crate::lngraph::DffPin;

/// A subject-graph node as seen from a consumer: a driver plus a polarity.
///
/// A `node` of `None` is a constant: zero, or one when `inv` is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signal {
    /// The driving node, if any.
    pub node: Option<usize>,
    /// Whether the driver's value is inverted.
    pub inv: bool,
}

impl Signal {
    /// Constant zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self { node: None, inv: false }
    }

    /// Constant one.
    #[must_use]
    pub const fn one() -> Self {
        Self { node: None, inv: true }
    }

    /// The constant `value`.
    #[must_use]
    pub const fn constant(value: bool) -> Self {
        Self { node: None, inv: value }
    }

    /// The value of `node`.
    #[must_use]
    pub const fn direct(node: usize) -> Self {
        Self { node: Some(node), inv: false }
    }

    /// The inversion of `node`.
    #[must_use]
    pub const fn inverted(node: usize) -> Self {
        Self { node: Some(node), inv: true }
    }

    /// Returns true if this signal is a constant.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        self.node.is_none()
    }
}

impl Not for Signal {
    type Output = Self;

    fn not(self) -> Self {
        Self { node: self.node, inv: !self.inv }
    }
}

/// A two-input Boolean network to be covered with LUTs.
///
/// Nodes are named by dense integer ids below [`SubjectGraph::max_node_id`]. A node is a primary input, a primary
/// output, a flip-flop, or a logic node with exactly two fanins. Inputs and flip-flops together are the pseudo-primary
/// inputs (ppi); outputs and flip-flops together are the pseudo-primary outputs (ppo).
pub trait SubjectGraph {
    /// Returns the name of the network.
    fn name(&self) -> &str;
    /// Returns one more than the largest node id.
    fn max_node_id(&self) -> usize;

    /// Returns the primary inputs in creation order.
    fn input_list(&self) -> Vec<usize>;
    /// Returns the primary outputs in creation order.
    fn output_list(&self) -> Vec<usize>;
    /// Returns the flip-flops in creation order.
    fn dff_list(&self) -> Vec<usize>;

    /// Returns the inputs followed by the flip-flops.
    fn ppi_list(&self) -> Vec<usize> {
        let mut list = self.input_list();
        list.extend(self.dff_list());
        list
    }

    /// Returns the outputs followed by the flip-flops.
    fn ppo_list(&self) -> Vec<usize> {
        let mut list = self.output_list();
        list.extend(self.dff_list());
        list
    }

    /// Returns true if this node is an input or a flip-flop.
    fn is_ppi(&self, node: usize) -> bool;
    /// Returns true if this node is a two-input logic node.
    fn is_logic(&self, node: usize) -> bool;

    /// Returns fanin `pos` (0 or 1) of a logic node.
    fn fanin(&self, node: usize, pos: usize) -> Signal;
    /// Returns the driver of a primary output.
    fn output_fanin(&self, onode: usize) -> Signal;
    /// Returns the driver of one pin of a flip-flop. A constant means the pin is unconnected.
    fn dff_fanin(&self, dff: usize, pin: DffPin) -> Signal;

    /// Returns the number of ports.
    fn port_num(&self) -> usize;
    /// Returns the name of port `i`.
    fn port_name(&self, i: usize) -> &str;
    /// Returns the input or output nodes making up port `i`, least significant bit first.
    fn port_bits(&self, i: usize) -> Vec<usize>;
}
