//! An and-inverter graph to map from.
//!
//! The graph lives in a `petgraph` [`StableGraph`]. Node 0 is constant zero; an edge from it ties a fanin to a constant.
//! Inversions are carried on edges, and every edge records the fanin slot it occupies.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use petgraph::{
    prelude::*,
    visit::{EdgeRef, NodeIndexable},
};

use crate::error::SbjError;
use crate::lngraph::DffPin;
use crate::traits::{Signal, SubjectGraph};

/// The kind of a subject-graph node. Inputs, outputs and flip-flops carry their position in their list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SbjNode {
    /// Constant zero.
    Zero,
    /// A primary input.
    Input(usize),
    /// A primary output.
    Output(usize),
    /// A two-input AND gate.
    And,
    /// A flip-flop.
    Dff(usize),
}

/// An edge into fanin slot `pos`, inverted if `inv` is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SbjEdge {
    /// Fanin slot of the destination.
    pub pos: usize,
    /// Whether the source is inverted.
    pub inv: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct SbjPort {
    name: String,
    bits: Vec<usize>,
}

/// An and-inverter graph with flip-flops.
#[derive(Clone, Debug)]
pub struct SbjGraph {
    name: String,
    graph: StableGraph<SbjNode, SbjEdge>,
    zero: NodeIndex,
    inputs: Vec<NodeIndex>,
    outputs: Vec<NodeIndex>,
    dffs: Vec<NodeIndex>,
    logic: Vec<NodeIndex>,
    ports: Vec<SbjPort>,
    symbols: HashMap<NodeIndex, String>,
}

/// Splits `name[bit]` into `name` and `bit`. A symbol with no subscript is bit 0.
fn to_symbol_and_bit(s: &str) -> Result<(&str, u32), SbjError> {
    match s.find('[') {
        Some(open_square_index) => {
            let (symbol, rest) = s.split_at(open_square_index);
            if !rest.ends_with(']') {
                return Err(SbjError::MalformedSymbol(s.to_string()));
            }

            // Skip both brackets.
            let bit = rest[1..rest.len() - 1]
                .parse::<u32>()
                .map_err(|_| SbjError::MalformedSymbol(s.to_string()))?;
            Ok((symbol, bit))
        }
        None => Ok((s, 0)),
    }
}

fn define(vars: &mut HashMap<usize, usize>, kind: &'static str, var: usize, node: usize) -> Result<(), SbjError> {
    if var == 0 {
        return Err(SbjError::ConstantDefinition(kind));
    }
    if vars.insert(var, node).is_some() {
        return Err(SbjError::Redefined(var));
    }
    Ok(())
}

impl SbjGraph {
    /// Creates a graph holding only the constant node.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let mut graph = StableGraph::new();
        let zero = graph.add_node(SbjNode::Zero);
        assert_eq!(zero.index(), 0);

        Self {
            name: name.to_string(),
            graph,
            zero,
            inputs: Vec::new(),
            outputs: Vec::new(),
            dffs: Vec::new(),
            logic: Vec::new(),
            ports: Vec::new(),
            symbols: HashMap::new(),
        }
    }

    /// Reads an ASCII AIGER file.
    ///
    /// Every latch becomes a flip-flop clocked by an extra input named `clock`. Inputs and outputs are grouped into
    /// ports by their symbols, `name[bit]` making up bit `bit` of port `name`; unnamed ones get a port each, named
    /// `i<n>` or `o<n>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or refers to undefined variables.
    #[allow(clippy::similar_names)]
    pub fn from_aiger<R: Read + 'static>(name: &str, reader: R) -> Result<Self, SbjError> {
        let reader = aiger::Reader::from_reader(reader)?;
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;

        let mut sbj = Self::new(name);
        let mut vars = HashMap::new();
        let mut aiger_inputs = Vec::new();

        // Gates may refer to variables defined later, so define every variable first.
        for record in &records {
            match record {
                aiger::Aiger::Input(l) => {
                    let node = sbj.new_input();
                    define(&mut vars, "input", l.variable(), node)?;
                    aiger_inputs.push(node);
                }
                aiger::Aiger::Latch { output, .. } => {
                    let node = sbj.new_dff();
                    define(&mut vars, "latch", output.variable(), node)?;
                }
                aiger::Aiger::AndGate { output, .. } => {
                    let node = sbj.graph.add_node(SbjNode::And);
                    sbj.logic.push(node);
                    define(&mut vars, "gate", output.variable(), node.index())?;
                }
                aiger::Aiger::Output(_) | aiger::Aiger::Symbol { .. } => {}
            }
        }

        let signal = |l: &aiger::Literal| -> Result<Signal, SbjError> {
            let inv = l.is_inverted();
            match l.variable() {
                0 => Ok(Signal::constant(inv)),
                var => vars
                    .get(&var)
                    .map(|&node| Signal { node: Some(node), inv })
                    .ok_or(SbjError::UndefinedVariable(var)),
            }
        };

        let clock = if sbj.dffs.is_empty() {
            None
        } else {
            let clock = sbj.new_input();
            sbj.set_symbol(clock, "clock");
            Some(clock)
        };

        let mut aiger_outputs = Vec::new();
        let mut aiger_latches = Vec::new();
        let mut symbols = Vec::new();
        for record in &records {
            match record {
                aiger::Aiger::Input(_) => {}
                aiger::Aiger::Latch { output, input } => {
                    let dff = signal(output)?.node.ok_or(SbjError::ConstantDefinition("latch"))?;
                    sbj.set_dff_pin(dff, DffPin::Data, signal(input)?);
                    if let Some(clock) = clock {
                        sbj.set_dff_pin(dff, DffPin::Clock, Signal::direct(clock));
                    }
                    aiger_latches.push(dff);
                }
                aiger::Aiger::Output(l) => {
                    let driver = signal(l)?;
                    aiger_outputs.push(sbj.new_output(driver));
                }
                aiger::Aiger::AndGate { output, inputs } => {
                    let gate = signal(output)?.node.ok_or(SbjError::ConstantDefinition("gate"))?;
                    let gate = NodeIndex::new(gate);
                    sbj.connect(signal(&inputs[0])?, gate, 0);
                    sbj.connect(signal(&inputs[1])?, gate, 1);
                }
                aiger::Aiger::Symbol {
                    type_spec,
                    position,
                    symbol,
                } => symbols.push((type_spec, *position, symbol)),
            }
        }

        for (type_spec, position, symbol) in symbols {
            let (kind, nodes) = match type_spec {
                aiger::Symbol::Input => ("input", &aiger_inputs),
                aiger::Symbol::Output => ("output", &aiger_outputs),
                aiger::Symbol::Latch => ("latch", &aiger_latches),
            };
            let node = *nodes
                .get(position)
                .ok_or(SbjError::SymbolOutOfRange { kind, position })?;
            sbj.set_symbol(node, symbol);
        }

        let inputs = sbj.input_list();
        sbj.group_ports(&inputs, "i")?;
        let outputs = sbj.output_list();
        sbj.group_ports(&outputs, "o")?;

        debug!(
            "read {}: {} inputs, {} outputs, {} latches, {} gates",
            sbj.name,
            aiger_inputs.len(),
            aiger_outputs.len(),
            aiger_latches.len(),
            sbj.logic.len()
        );

        Ok(sbj)
    }

    /// Reads an ASCII AIGER file from disk. See [`SbjGraph::from_aiger`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is malformed.
    pub fn from_aiger_file(name: &str, path: &Path) -> Result<Self, SbjError> {
        let file = File::open(path)?;
        Self::from_aiger(name, file)
    }

    fn group_ports(&mut self, nodes: &[usize], prefix: &str) -> Result<(), SbjError> {
        let mut order = Vec::new();
        let mut groups: HashMap<String, BTreeMap<u32, usize>> = HashMap::new();

        for (n, &node) in nodes.iter().enumerate() {
            let (name, bit) = match self.symbol(node) {
                Some(symbol) => {
                    let (name, bit) = to_symbol_and_bit(symbol)?;
                    (name.to_string(), bit)
                }
                None => (format!("{}{}", prefix, n), 0),
            };

            let group = groups.entry(name.clone()).or_insert_with(|| {
                order.push(name.clone());
                BTreeMap::new()
            });
            if group.insert(bit, node).is_some() {
                return Err(SbjError::DuplicateBit(name, bit));
            }
        }

        for name in order {
            let bits = groups.remove(&name).unwrap_or_default().into_values().collect();
            self.add_port(&name, bits);
        }

        Ok(())
    }

    /// Sets the network name.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Returns the underlying graph.
    #[must_use]
    pub fn graph(&self) -> &StableGraph<SbjNode, SbjEdge> {
        &self.graph
    }

    /// Returns the kind of `node`.
    #[must_use]
    pub fn node_type(&self, node: usize) -> SbjNode {
        *self
            .graph
            .node_weight(NodeIndex::new(node))
            .unwrap_or_else(|| panic!("node {} does not exist", node))
    }

    /// Returns every AND node, in creation order.
    #[must_use]
    pub fn logic_list(&self) -> Vec<usize> {
        self.logic.iter().map(|node| node.index()).collect()
    }

    /// Returns the symbol attached to `node`, if any.
    #[must_use]
    pub fn symbol(&self, node: usize) -> Option<&str> {
        self.symbols.get(&NodeIndex::new(node)).map(String::as_str)
    }

    /// Attaches a symbol to `node`, replacing any previous one.
    pub fn set_symbol(&mut self, node: usize, symbol: &str) {
        self.symbols.insert(NodeIndex::new(node), symbol.to_string());
    }

    /// Creates a primary input.
    pub fn new_input(&mut self) -> usize {
        let node = self.graph.add_node(SbjNode::Input(self.inputs.len()));
        self.inputs.push(node);
        node.index()
    }

    /// Creates the AND of two signals.
    pub fn new_and(&mut self, a: Signal, b: Signal) -> usize {
        let node = self.graph.add_node(SbjNode::And);
        self.logic.push(node);
        self.connect(a, node, 0);
        self.connect(b, node, 1);
        node.index()
    }

    /// Creates a primary output driven by `driver`.
    pub fn new_output(&mut self, driver: Signal) -> usize {
        let node = self.graph.add_node(SbjNode::Output(self.outputs.len()));
        self.outputs.push(node);
        self.connect(driver, node, 0);
        node.index()
    }

    /// Creates a flip-flop with every pin unconnected.
    pub fn new_dff(&mut self) -> usize {
        let node = self.graph.add_node(SbjNode::Dff(self.dffs.len()));
        self.dffs.push(node);
        node.index()
    }

    /// Connects `pin` of flip-flop `dff` to `driver`, replacing any previous driver.
    pub fn set_dff_pin(&mut self, dff: usize, pin: DffPin, driver: Signal) {
        assert!(
            matches!(self.node_type(dff), SbjNode::Dff(_)),
            "node {} is not a flip-flop",
            dff
        );

        let index = NodeIndex::new(dff);
        let old = self
            .graph
            .edges_directed(index, Incoming)
            .find(|edge| edge.weight().pos == pin.pos())
            .map(|edge| edge.id());
        if let Some(old) = old {
            self.graph.remove_edge(old);
        }

        self.connect(driver, index, pin.pos());
    }

    /// Adds a port made of the given inputs or outputs, least significant bit first.
    pub fn add_port(&mut self, name: &str, bits: Vec<usize>) {
        for &bit in &bits {
            assert!(
                matches!(self.node_type(bit), SbjNode::Input(_) | SbjNode::Output(_)),
                "port {} refers to node {}, which is not an input or output",
                name,
                bit
            );
        }

        self.ports.push(SbjPort {
            name: name.to_string(),
            bits,
        });
    }

    fn connect(&mut self, driver: Signal, to: NodeIndex, pos: usize) {
        let from = driver.node.map_or(self.zero, NodeIndex::new);
        assert!(self.graph.contains_node(from), "node {} does not exist", from.index());

        self.graph.add_edge(from, to, SbjEdge { pos, inv: driver.inv });
    }

    fn fanin_signal(&self, node: usize, pos: usize) -> Option<Signal> {
        self.graph
            .edges_directed(NodeIndex::new(node), Incoming)
            .find(|edge| edge.weight().pos == pos)
            .map(|edge| Signal {
                node: (edge.source() != self.zero).then(|| edge.source().index()),
                inv: edge.weight().inv,
            })
    }
}

impl SubjectGraph for SbjGraph {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_node_id(&self) -> usize {
        NodeIndexable::node_bound(&self.graph)
    }

    fn input_list(&self) -> Vec<usize> {
        self.inputs.iter().map(|node| node.index()).collect()
    }

    fn output_list(&self) -> Vec<usize> {
        self.outputs.iter().map(|node| node.index()).collect()
    }

    fn dff_list(&self) -> Vec<usize> {
        self.dffs.iter().map(|node| node.index()).collect()
    }

    fn is_ppi(&self, node: usize) -> bool {
        matches!(
            self.graph.node_weight(NodeIndex::new(node)),
            Some(SbjNode::Input(_) | SbjNode::Dff(_))
        )
    }

    fn is_logic(&self, node: usize) -> bool {
        matches!(self.graph.node_weight(NodeIndex::new(node)), Some(SbjNode::And))
    }

    fn fanin(&self, node: usize, pos: usize) -> Signal {
        assert!(self.is_logic(node), "node {} is not a logic node", node);

        self.fanin_signal(node, pos)
            .unwrap_or_else(|| panic!("node {} has no fanin {}", node, pos))
    }

    fn output_fanin(&self, onode: usize) -> Signal {
        assert!(
            matches!(self.node_type(onode), SbjNode::Output(_)),
            "node {} is not an output",
            onode
        );

        self.fanin_signal(onode, 0).unwrap_or_else(Signal::zero)
    }

    fn dff_fanin(&self, dff: usize, pin: DffPin) -> Signal {
        assert!(
            matches!(self.node_type(dff), SbjNode::Dff(_)),
            "node {} is not a flip-flop",
            dff
        );

        self.fanin_signal(dff, pin.pos()).unwrap_or_else(Signal::zero)
    }

    fn port_num(&self) -> usize {
        self.ports.len()
    }

    fn port_name(&self, i: usize) -> &str {
        &self.ports[i].name
    }

    fn port_bits(&self, i: usize) -> Vec<usize> {
        self.ports[i].bits.clone()
    }
}
