//! LUT networks.
//!
//! A LUT network is the result of technology mapping: a graph of K-input lookup tables, primary inputs and outputs,
//! and D flip-flops. Nodes live in an arena owned by the [`LnGraph`] and are referred to by small integer ids
//! ([`LnNodeId`]); a deleted node's id is handed out again by the next node created, smallest first.
//!
//! Every fanin slot of a node is an [`LnEdge`] owned by that node. The source of an edge also keeps a copy of it in
//! its fanout list, and the graph keeps the two sides consistent on every [`LnGraph::connect`]. An edge with no source
//! is driven by constant zero.

use std::cell::Cell;
use std::fmt;

use crate::id_mgr::IdMgr;

/// An index into the node arena of an [`LnGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LnNodeId(usize);

impl LnNodeId {
    /// Returns the bare arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for LnNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of a LUT network node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LnNodeKind {
    /// A primary input. Has no fanins.
    Input,
    /// A primary output. Has exactly one fanin.
    Output,
    /// A lookup table with as many fanins as it has inputs.
    Lut,
    /// A D flip-flop with data, clock, set and reset fanins.
    Dff,
}

/// A fanin slot of a flip-flop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DffPin {
    /// Data input.
    Data,
    /// Clock input.
    Clock,
    /// Asynchronous set.
    Set,
    /// Asynchronous reset.
    Reset,
}

impl DffPin {
    /// Every pin, in fanin slot order.
    pub const ALL: [Self; 4] = [Self::Data, Self::Clock, Self::Set, Self::Reset];

    /// Returns the fanin slot this pin occupies.
    #[must_use]
    pub const fn pos(self) -> usize {
        match self {
            Self::Data => 0,
            Self::Clock => 1,
            Self::Set => 2,
            Self::Reset => 3,
        }
    }
}

/// A directed connection into fanin slot `pos` of node `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LnEdge {
    from: Option<LnNodeId>,
    to: LnNodeId,
    pos: usize,
}

impl LnEdge {
    /// Returns the driving node, or `None` if the edge is driven by constant zero.
    #[must_use]
    pub const fn from(&self) -> Option<LnNodeId> {
        self.from
    }

    /// Returns the driven node.
    #[must_use]
    pub const fn to(&self) -> LnNodeId {
        self.to
    }

    /// Returns the fanin slot of `to` this edge occupies.
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.pos
    }
}

/// A node of a LUT network.
#[derive(Clone, Debug)]
pub struct LnNode {
    id: LnNodeId,
    kind: LnNodeKind,
    subid: usize,
    fanins: Box<[LnEdge]>,
    fanouts: Vec<LnEdge>,
    tv: Vec<bool>,
    pomark: bool,
    level: Cell<usize>,
}

impl LnNode {
    /// Returns the node's id.
    #[must_use]
    pub const fn id(&self) -> LnNodeId {
        self.id
    }

    /// Returns the node's id as a string.
    #[must_use]
    pub fn id_str(&self) -> String {
        self.id.to_string()
    }

    /// Returns the node's kind.
    #[must_use]
    pub const fn kind(&self) -> LnNodeKind {
        self.kind
    }

    /// Returns the position of an input in the input list, of an output in the output list, or of a flip-flop in the
    /// flip-flop list, at the time it was created.
    #[must_use]
    pub const fn subid(&self) -> usize {
        self.subid
    }

    /// Returns true if this node is a primary input.
    #[must_use]
    pub fn is_input(&self) -> bool {
        self.kind == LnNodeKind::Input
    }

    /// Returns true if this node is a primary output.
    #[must_use]
    pub fn is_output(&self) -> bool {
        self.kind == LnNodeKind::Output
    }

    /// Returns true if this node is a lookup table.
    #[must_use]
    pub fn is_lut(&self) -> bool {
        self.kind == LnNodeKind::Lut
    }

    /// Returns true if this node is a flip-flop.
    #[must_use]
    pub fn is_dff(&self) -> bool {
        self.kind == LnNodeKind::Dff
    }

    /// Returns true if this node is a pseudo-primary input (an input or a flip-flop).
    #[must_use]
    pub fn is_ppi(&self) -> bool {
        self.is_input() || self.is_dff()
    }

    /// Returns true if this node is a pseudo-primary output (an output or a flip-flop).
    #[must_use]
    pub fn is_ppo(&self) -> bool {
        self.is_output() || self.is_dff()
    }

    /// Returns the number of fanin slots.
    #[must_use]
    pub fn fanin_num(&self) -> usize {
        self.fanins.len()
    }

    /// Returns the node driving fanin slot `pos`, or `None` for constant zero.
    #[must_use]
    pub fn fanin(&self, pos: usize) -> Option<LnNodeId> {
        self.fanin_edge(pos).from
    }

    /// Returns the edge in fanin slot `pos`.
    #[must_use]
    pub fn fanin_edge(&self, pos: usize) -> &LnEdge {
        assert!(
            pos < self.fanins.len(),
            "fanin position {} out of range: node {} has {} fanins",
            pos,
            self.id,
            self.fanins.len()
        );
        &self.fanins[pos]
    }

    /// Returns every fanin edge, in slot order.
    #[must_use]
    pub fn fanin_edges(&self) -> &[LnEdge] {
        &self.fanins
    }

    /// Returns the edges this node drives.
    #[must_use]
    pub fn fanout_list(&self) -> &[LnEdge] {
        &self.fanouts
    }

    /// Returns the number of edges this node drives.
    #[must_use]
    pub fn fanout_num(&self) -> usize {
        self.fanouts.len()
    }

    /// Returns true if this node directly drives an output or a flip-flop.
    #[must_use]
    pub const fn pomark(&self) -> bool {
        self.pomark
    }

    /// Returns the truth table of a LUT; entry `i` is the output for the input assignment whose bit `j` is the value
    /// of fanin `j`. Empty for every other kind of node.
    #[must_use]
    pub fn tv(&self) -> &[bool] {
        &self.tv
    }

    /// Returns the combinational depth computed by the last [`LnGraph::level`] call.
    #[must_use]
    pub fn level(&self) -> usize {
        self.level.get()
    }
}

/// A named, ordered group of input or output nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LnPort {
    name: String,
    bits: Vec<LnNodeId>,
}

impl LnPort {
    /// Returns the port name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of bits in the port.
    #[must_use]
    pub fn bit_width(&self) -> usize {
        self.bits.len()
    }

    /// Returns the node for bit `pos`, least significant first.
    #[must_use]
    pub fn bit(&self, pos: usize) -> LnNodeId {
        self.bits[pos]
    }

    /// Returns every bit, least significant first.
    #[must_use]
    pub fn bits(&self) -> &[LnNodeId] {
        &self.bits
    }
}

#[derive(Clone, Copy, Debug)]
struct PortInfo {
    port: usize,
    pos: usize,
}

/// A LUT network.
#[derive(Debug, Default)]
pub struct LnGraph {
    name: String,
    nodes: Vec<Option<LnNode>>,
    id_mgr: IdMgr,
    inputs: Vec<LnNodeId>,
    outputs: Vec<LnNodeId>,
    luts: Vec<LnNodeId>,
    dffs: Vec<LnNodeId>,
    input_ports: Vec<Option<PortInfo>>,
    output_ports: Vec<Option<PortInfo>>,
    ports: Vec<LnPort>,
    level: Cell<usize>,
    level_valid: Cell<bool>,
}

impl Clone for LnGraph {
    fn clone(&self) -> Self {
        let mut graph = Self::new();
        graph.copy(self);
        graph
    }
}

impl LnGraph {
    /// Creates an empty LUT network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the module name.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    /// Returns one more than the largest node id ever handed out since the last [`LnGraph::clear`].
    #[must_use]
    pub fn max_node_id(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the node with the given id.
    #[must_use]
    pub fn node(&self, id: LnNodeId) -> &LnNode {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("node {} does not exist", id))
    }

    fn node_mut(&mut self, id: LnNodeId) -> &mut LnNode {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("node {} does not exist", id))
    }

    /// Returns the number of inputs.
    #[must_use]
    pub fn input_num(&self) -> usize {
        self.inputs.len()
    }

    /// Returns the input with sub-id `subid`.
    #[must_use]
    pub fn input(&self, subid: usize) -> LnNodeId {
        self.inputs[subid]
    }

    /// Returns every input, in sub-id order.
    #[must_use]
    pub fn input_list(&self) -> &[LnNodeId] {
        &self.inputs
    }

    /// Returns the number of outputs.
    #[must_use]
    pub fn output_num(&self) -> usize {
        self.outputs.len()
    }

    /// Returns the output with sub-id `subid`.
    #[must_use]
    pub fn output(&self, subid: usize) -> LnNodeId {
        self.outputs[subid]
    }

    /// Returns every output, in sub-id order.
    #[must_use]
    pub fn output_list(&self) -> &[LnNodeId] {
        &self.outputs
    }

    /// Returns the number of LUTs.
    #[must_use]
    pub fn lnode_num(&self) -> usize {
        self.luts.len()
    }

    /// Returns every LUT, in creation order.
    #[must_use]
    pub fn lnode_list(&self) -> &[LnNodeId] {
        &self.luts
    }

    /// Returns the number of flip-flops.
    #[must_use]
    pub fn dff_num(&self) -> usize {
        self.dffs.len()
    }

    /// Returns every flip-flop, in creation order.
    #[must_use]
    pub fn dff_list(&self) -> &[LnNodeId] {
        &self.dffs
    }

    /// Returns the inputs followed by the flip-flops.
    #[must_use]
    pub fn ppi_list(&self) -> Vec<LnNodeId> {
        self.inputs.iter().chain(&self.dffs).copied().collect()
    }

    /// Returns the outputs followed by the flip-flops.
    #[must_use]
    pub fn ppo_list(&self) -> Vec<LnNodeId> {
        self.outputs.iter().chain(&self.dffs).copied().collect()
    }

    /// Returns the edges driven by `id`.
    #[must_use]
    pub fn fanout_list(&self, id: LnNodeId) -> &[LnEdge] {
        self.node(id).fanout_list()
    }

    /// Returns true if `edge` drives a primary output.
    #[must_use]
    pub fn is_poedge(&self, edge: &LnEdge) -> bool {
        self.node(edge.to).is_output()
    }

    /// Returns the number of ports.
    #[must_use]
    pub fn port_num(&self) -> usize {
        self.ports.len()
    }

    /// Returns port `index`.
    #[must_use]
    pub fn port(&self, index: usize) -> &LnPort {
        &self.ports[index]
    }

    fn port_info(&self, id: LnNodeId) -> Option<PortInfo> {
        let node = self.node(id);
        match node.kind {
            LnNodeKind::Input => self.input_ports[node.subid],
            LnNodeKind::Output => self.output_ports[node.subid],
            LnNodeKind::Lut | LnNodeKind::Dff => None,
        }
    }

    /// Returns the port an input or output belongs to, if any.
    #[must_use]
    pub fn port_of(&self, id: LnNodeId) -> Option<&LnPort> {
        self.port_info(id).map(|info| &self.ports[info.port])
    }

    /// Returns the bit position of an input or output within its port, if it belongs to one.
    #[must_use]
    pub fn port_pos(&self, id: LnNodeId) -> Option<usize> {
        self.port_info(id).map(|info| info.pos)
    }

    /// Adds a port made of the given inputs or outputs, least significant bit first.
    pub fn add_port(&mut self, name: &str, bits: Vec<LnNodeId>) {
        let port = self.ports.len();
        for (pos, &bit) in bits.iter().enumerate() {
            let (kind, subid) = {
                let node = self.node(bit);
                (node.kind, node.subid)
            };
            let info = Some(PortInfo { port, pos });
            match kind {
                LnNodeKind::Input => self.input_ports[subid] = info,
                LnNodeKind::Output => self.output_ports[subid] = info,
                LnNodeKind::Lut | LnNodeKind::Dff => {
                    panic!("port {} bit {} is node {}, which is not an input or output", name, pos, bit)
                }
            }
        }

        self.ports.push(LnPort {
            name: name.to_string(),
            bits,
        });
    }

    fn new_node(&mut self, kind: LnNodeKind, subid: usize, fanin_num: usize) -> LnNodeId {
        debug_assert!(
            self.nodes.get(self.id_mgr.avail()).map_or(true, Option::is_none),
            "id {} is free but its slot is occupied",
            self.id_mgr.avail()
        );
        let id = LnNodeId(self.id_mgr.alloc());
        if self.nodes.len() <= id.0 {
            self.nodes.resize_with(id.0 + 1, || None);
        }

        let fanins = (0..fanin_num)
            .map(|pos| LnEdge { from: None, to: id, pos })
            .collect();

        self.nodes[id.0] = Some(LnNode {
            id,
            kind,
            subid,
            fanins,
            fanouts: Vec::new(),
            tv: Vec::new(),
            pomark: false,
            level: Cell::new(0),
        });

        id
    }

    /// Creates a primary input.
    pub fn new_input(&mut self) -> LnNodeId {
        let subid = self.inputs.len();
        let id = self.new_node(LnNodeKind::Input, subid, 0);
        self.inputs.push(id);
        self.input_ports.push(None);
        id
    }

    /// Creates a primary output driven by `driver`, or by constant zero if `driver` is `None`.
    pub fn new_output(&mut self, driver: Option<LnNodeId>) -> LnNodeId {
        let subid = self.outputs.len();
        let id = self.new_node(LnNodeKind::Output, subid, 1);
        self.outputs.push(id);
        self.output_ports.push(None);
        self.connect(driver, id, 0);
        id
    }

    /// Creates a LUT over `inputs` with truth table `tv`, which must have `2^inputs.len()` entries.
    pub fn new_lut(&mut self, inputs: &[LnNodeId], tv: Vec<bool>) -> LnNodeId {
        let inputs = inputs.iter().copied().map(Some).collect::<Vec<_>>();
        self.new_lut_with_fanins(&inputs, tv)
    }

    fn new_lut_with_fanins(&mut self, inputs: &[Option<LnNodeId>], tv: Vec<bool>) -> LnNodeId {
        let ni = inputs.len();
        assert_eq!(
            tv.len(),
            1 << ni,
            "truth table of a {}-input LUT must have {} entries",
            ni,
            1 << ni
        );

        let subid = self.luts.len();
        let id = self.new_node(LnNodeKind::Lut, subid, ni);
        self.node_mut(id).tv = tv;
        self.luts.push(id);

        for (pos, &input) in inputs.iter().enumerate() {
            self.connect(input, id, pos);
        }

        id
    }

    /// Creates a flip-flop with every pin unconnected.
    pub fn new_dff(&mut self) -> LnNodeId {
        let subid = self.dffs.len();
        let id = self.new_node(LnNodeKind::Dff, subid, DffPin::ALL.len());
        self.dffs.push(id);
        id
    }

    /// Connects `pin` of flip-flop `node` to `driver`.
    pub fn set_dff_pin(&mut self, node: LnNodeId, pin: DffPin, driver: Option<LnNodeId>) {
        assert!(self.node(node).is_dff(), "node {} is not a flip-flop", node);

        self.connect(driver, node, pin.pos());
    }

    /// Connects the data input of flip-flop `node`.
    pub fn set_dff_input(&mut self, node: LnNodeId, driver: Option<LnNodeId>) {
        self.set_dff_pin(node, DffPin::Data, driver);
    }

    /// Connects the clock of flip-flop `node`.
    pub fn set_dff_clock(&mut self, node: LnNodeId, driver: Option<LnNodeId>) {
        self.set_dff_pin(node, DffPin::Clock, driver);
    }

    /// Connects the asynchronous set of flip-flop `node`.
    pub fn set_dff_set(&mut self, node: LnNodeId, driver: Option<LnNodeId>) {
        self.set_dff_pin(node, DffPin::Set, driver);
    }

    /// Connects the asynchronous reset of flip-flop `node`.
    pub fn set_dff_reset(&mut self, node: LnNodeId, driver: Option<LnNodeId>) {
        self.set_dff_pin(node, DffPin::Reset, driver);
    }

    /// Recomputes the output mark of `id` from its fanout list.
    fn scan_po(&mut self, id: LnNodeId) {
        let pomark = self
            .node(id)
            .fanouts
            .iter()
            .any(|edge| self.node(edge.to).is_ppo());
        self.node_mut(id).pomark = pomark;
    }

    fn invalidate_level(&self) {
        self.level.set(0);
        self.level_valid.set(false);
    }

    /// Makes `from` drive fanin slot `pos` of `to`, replacing whatever drove it before. `None` ties the slot to
    /// constant zero.
    pub fn connect(&mut self, from: Option<LnNodeId>, to: LnNodeId, pos: usize) {
        let old_from = self.node(to).fanin_edge(pos).from;
        if let Some(from) = from {
            // Dangling sources are caught here rather than left in a fanout list.
            let _ = self.node(from);
        }

        if let Some(old_from) = old_from {
            let fanouts = &mut self.node_mut(old_from).fanouts;
            let index = fanouts
                .iter()
                .position(|edge| edge.to == to && edge.pos == pos)
                .unwrap_or_else(|| panic!("node {} is missing fanout edge to {}:{}", old_from, to, pos));
            fanouts.remove(index);
            self.scan_po(old_from);
        }

        let edge = LnEdge { from, to, pos };
        self.node_mut(to).fanins[pos] = edge;

        if let Some(from) = from {
            self.node_mut(from).fanouts.push(edge);
            self.scan_po(from);
        }

        self.invalidate_level();
    }

    fn delete_node(&mut self, id: LnNodeId) {
        debug_assert!(self.id_mgr.in_use(id.0), "node {} deleted twice", id);
        self.nodes[id.0] = None;
        self.id_mgr.release(id.0);
    }

    fn delete_input(&mut self, id: LnNodeId) {
        assert!(self.node(id).is_input(), "node {} is not an input", id);
        self.inputs.retain(|&node| node != id);
        self.delete_node(id);
    }

    fn delete_output(&mut self, id: LnNodeId) {
        assert!(self.node(id).is_output(), "node {} is not an output", id);
        self.connect(None, id, 0);
        self.outputs.retain(|&node| node != id);
        self.delete_node(id);
    }

    /// Deletes a LUT. The LUT must not drive anything.
    pub fn delete_lut(&mut self, id: LnNodeId) {
        let node = self.node(id);
        assert!(node.is_lut(), "node {} is not a LUT", id);
        assert_eq!(node.fanout_num(), 0, "LUT {} still has fanouts", id);

        for pos in 0..node.fanin_num() {
            self.connect(None, id, pos);
        }

        self.luts.retain(|&node| node != id);
        self.delete_node(id);
    }

    /// Deletes a flip-flop. The flip-flop must not drive anything.
    pub fn delete_dff(&mut self, id: LnNodeId) {
        let node = self.node(id);
        assert!(node.is_dff(), "node {} is not a flip-flop", id);
        assert_eq!(node.fanout_num(), 0, "flip-flop {} still has fanouts", id);

        for pin in DffPin::ALL {
            self.connect(None, id, pin.pos());
        }

        self.dffs.retain(|&node| node != id);
        self.delete_node(id);
    }

    /// Removes every node and port and the module name.
    pub fn clear(&mut self) {
        self.name.clear();
        self.ports.clear();

        // Cut every edge first so no fanout list refers to a deleted node.
        for index in 0..self.outputs.len() {
            let id = self.outputs[index];
            self.connect(None, id, 0);
        }
        for index in 0..self.luts.len() {
            let id = self.luts[index];
            for pos in 0..self.node(id).fanin_num() {
                self.connect(None, id, pos);
            }
        }
        for index in 0..self.dffs.len() {
            let id = self.dffs[index];
            for pin in DffPin::ALL {
                self.connect(None, id, pin.pos());
            }
        }

        while let Some(&id) = self.inputs.last() {
            self.delete_input(id);
        }
        assert!(self.inputs.is_empty());

        while let Some(&id) = self.outputs.last() {
            self.delete_output(id);
        }
        assert!(self.outputs.is_empty());

        while let Some(&id) = self.luts.last() {
            self.delete_lut(id);
        }
        assert!(self.luts.is_empty());

        while let Some(&id) = self.dffs.last() {
            self.delete_dff(id);
        }
        assert!(self.dffs.is_empty());

        self.input_ports.clear();
        self.output_ports.clear();
        self.nodes.clear();
        self.id_mgr.clear();
        self.invalidate_level();
    }

    /// Emits every LUT in the fanout of `node` whose fanins have all been emitted.
    fn sort_sub(&self, node: LnNodeId, mark: &mut [bool], node_list: &mut Vec<LnNodeId>) {
        for edge in self.node(node).fanout_list() {
            let onode = self.node(edge.to);
            if mark[onode.id.0] || !onode.is_lut() {
                continue;
            }

            let ready = onode
                .fanins
                .iter()
                .all(|fanin| fanin.from.map_or(true, |inode| mark[inode.0]));
            if ready {
                mark[onode.id.0] = true;
                node_list.push(onode.id);
            }
        }
    }

    /// Returns every LUT, each after all of its fanins.
    #[must_use]
    pub fn sort(&self) -> Vec<LnNodeId> {
        let mut node_list = Vec::with_capacity(self.lnode_num());
        let mut mark = vec![false; self.max_node_id()];

        // LUTs fed only by inputs and flip-flops.
        for node in self.ppi_list() {
            mark[node.0] = true;
            self.sort_sub(node, &mut mark, &mut node_list);
        }

        // Constant LUTs.
        for &node in &self.luts {
            let ln_node = self.node(node);
            if !mark[node.0] && ln_node.fanins.iter().all(|fanin| fanin.from.is_none()) {
                mark[node.0] = true;
                node_list.push(node);
            }
        }

        let mut rpos = 0;
        while rpos < node_list.len() {
            let node = node_list[rpos];
            rpos += 1;
            self.sort_sub(node, &mut mark, &mut node_list);
        }

        assert_eq!(
            node_list.len(),
            self.lnode_num(),
            "LUT network is not acyclic: sorted {} of {} LUTs",
            node_list.len(),
            self.lnode_num()
        );

        node_list
    }

    /// Returns the maximum number of LUTs on any path from a pseudo-primary input to a pseudo-primary output.
    #[must_use]
    pub fn level(&self) -> usize {
        if !self.level_valid.get() {
            for node in self.ppi_list() {
                self.node(node).level.set(0);
            }

            for node in self.sort() {
                let node = self.node(node);
                let level = node
                    .fanins
                    .iter()
                    .filter_map(LnEdge::from)
                    .map(|inode| self.node(inode).level())
                    .max()
                    .unwrap_or(0);
                node.level.set(level + 1);
            }

            let max_level = self
                .ppo_list()
                .into_iter()
                .flat_map(|node| self.node(node).fanins.iter())
                .filter_map(LnEdge::from)
                .map(|inode| self.node(inode).level())
                .max()
                .unwrap_or(0);

            self.level.set(max_level);
            self.level_valid.set(true);
        }

        self.level.get()
    }

    /// Replaces the contents of this network with a copy of `src`.
    ///
    /// Returns a map from node ids of `src` to the ids of their copies.
    pub fn copy(&mut self, src: &Self) -> Vec<Option<LnNodeId>> {
        self.clear();
        self.name = src.name.clone();

        let mut nodemap = vec![None; src.max_node_id()];
        let lookup = |nodemap: &[Option<LnNodeId>], id: LnNodeId| {
            nodemap[id.0].unwrap_or_else(|| panic!("node {} used before it was copied", id))
        };

        for &src_node in &src.inputs {
            nodemap[src_node.0] = Some(self.new_input());
        }

        for &src_node in &src.dffs {
            nodemap[src_node.0] = Some(self.new_dff());
        }

        for src_node in src.sort() {
            let src_node = src.node(src_node);
            let inputs = src_node
                .fanins
                .iter()
                .map(|edge| edge.from.map(|inode| lookup(&nodemap, inode)))
                .collect::<Vec<_>>();
            nodemap[src_node.id.0] = Some(self.new_lut_with_fanins(&inputs, src_node.tv.clone()));
        }

        for &src_node in &src.dffs {
            let dst_node = lookup(&nodemap, src_node);
            for pin in DffPin::ALL {
                if let Some(src_inode) = src.node(src_node).fanin(pin.pos()) {
                    let dst_inode = lookup(&nodemap, src_inode);
                    self.set_dff_pin(dst_node, pin, Some(dst_inode));
                }
            }
        }

        for &src_node in &src.outputs {
            let driver = src.node(src_node).fanin(0).map(|inode| lookup(&nodemap, inode));
            nodemap[src_node.0] = Some(self.new_output(driver));
        }

        for port in &src.ports {
            let bits = port.bits.iter().map(|&bit| lookup(&nodemap, bit)).collect();
            self.add_port(&port.name, bits);
        }

        nodemap
    }
}
