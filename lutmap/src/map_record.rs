//! Turning a cut assignment into a LUT network.
//!
//! A [`MapRecord`] remembers which [`Cut`] was chosen for each subject-graph node. From that assignment it can either
//! build the LUT network the cuts describe ([`MapRecord::gen_mapgraph`]) or count how many LUTs that network would
//! have without building it ([`MapRecord::estimate`]), which is what a covering heuristic calls when comparing many
//! assignments.
//!
//! Both work backwards from the pseudo-primary outputs. A node may be needed at both polarities; each polarity is a
//! separate LUT, built once and shared by every consumer.

use std::collections::HashSet;

use log::{debug, info, trace};

use crate::cut::Cut;
use crate::lngraph::{DffPin, LnGraph, LnNodeId};
use crate::logexpr::LogExpr;
use crate::traits::{Signal, SubjectGraph};

#[derive(Clone, Copy, Debug, Default)]
struct NodeInfo<'a> {
    cut: Option<&'a Cut>,
    /// The LUT network node computing this node, indexed by polarity.
    map_node: [Option<LnNodeId>; 2],
    depth: usize,
    /// Number of times each polarity was requested during an estimate.
    map_count: [usize; 2],
    /// Number of chosen cuts covering this node during an estimate.
    cov_count: usize,
}

/// The cut chosen for each subject-graph node, plus the working state of reconstruction and estimation.
///
/// Reconstruction and estimation share this state: do not interleave them on one record without an intervening
/// [`MapRecord::init`] or [`MapRecord::copy`].
#[derive(Clone, Debug, Default)]
pub struct MapRecord<'a> {
    node_info: Vec<NodeInfo<'a>>,
}

/// Builds the truth table of `expr` over `ni` variables, evaluating 64 input assignments at a time.
fn make_tv(ni: usize, expr: &LogExpr) -> Vec<bool> {
    let np = 1_usize << ni;
    let mut tv = Vec::with_capacity(np);
    let mut vals = vec![0_u64; ni];

    for base in (0..np).step_by(64) {
        let count = (np - base).min(64);
        for (i, val) in vals.iter_mut().enumerate() {
            *val = (0..count)
                .filter(|&b| (base + b) & (1 << i) != 0)
                .fold(0, |acc, b| acc | 1_u64 << b);
        }

        let bits = expr.eval(&vals);
        tv.extend((0..count).map(|b| bits & (1_u64 << b) != 0));
    }

    tv
}

impl<'a> MapRecord<'a> {
    /// Creates an empty record. Call [`MapRecord::init`] before use.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything and makes room for every node of `sbj`.
    pub fn init<G: SubjectGraph + ?Sized>(&mut self, sbj: &G) {
        self.node_info.clear();
        self.node_info.resize_with(sbj.max_node_id(), NodeInfo::default);
    }

    /// Replaces this record's cut assignment with that of `src`, dropping all other state.
    pub fn copy(&mut self, src: &MapRecord<'a>) {
        self.node_info = src
            .node_info
            .iter()
            .map(|info| NodeInfo {
                cut: info.cut,
                ..NodeInfo::default()
            })
            .collect();
    }

    fn info(&self, node: usize) -> &NodeInfo<'a> {
        self.node_info
            .get(node)
            .unwrap_or_else(|| panic!("node {} is out of range of the mapping record", node))
    }

    fn info_mut(&mut self, node: usize) -> &mut NodeInfo<'a> {
        self.node_info
            .get_mut(node)
            .unwrap_or_else(|| panic!("node {} is out of range of the mapping record", node))
    }

    /// Records `cut` as the cut implementing `node`.
    pub fn set_cut(&mut self, node: usize, cut: &'a Cut) {
        assert_eq!(cut.root(), node, "cut rooted at {} recorded for node {}", cut.root(), node);

        self.info_mut(node).cut = Some(cut);
    }

    /// Returns the cut recorded for `node`, if any.
    #[must_use]
    pub fn get_cut(&self, node: usize) -> Option<&'a Cut> {
        self.info(node).cut
    }

    /// Builds the LUT network described by the recorded cuts into `mapgraph`, replacing its contents.
    ///
    /// Returns the number of LUTs and the depth of the network.
    ///
    /// # Panics
    ///
    /// Panics if a logic node reachable from a pseudo-primary output has no recorded cut.
    pub fn gen_mapgraph<G: SubjectGraph + ?Sized>(&mut self, sbj: &G, mapgraph: &mut LnGraph) -> (usize, usize) {
        mapgraph.clear();
        mapgraph.set_name(sbj.name());

        for info in &mut self.node_info {
            info.map_node = [None; 2];
            info.depth = 0;
        }

        for node in sbj.input_list() {
            let id = mapgraph.new_input();
            self.info_mut(node).map_node[0] = Some(id);
        }

        for node in sbj.dff_list() {
            let id = mapgraph.new_dff();
            self.info_mut(node).map_node[0] = Some(id);
        }

        let mut max_depth = 0;
        for onode in sbj.output_list() {
            let (driver, depth) = self.map_sink(sbj, mapgraph, sbj.output_fanin(onode));
            debug!("output {} driven by {} at depth {}", onode, driver, depth);
            max_depth = max_depth.max(depth);

            let id = mapgraph.new_output(Some(driver));
            self.info_mut(onode).map_node[0] = Some(id);
        }

        for dff in sbj.dff_list() {
            let id = self.info(dff).map_node[0].unwrap_or_else(|| panic!("flip-flop {} was not mapped", dff));
            for pin in DffPin::ALL {
                let signal = sbj.dff_fanin(dff, pin);
                // Only the data input is tied to a constant; the other pins stay unconnected.
                if signal.is_constant() && pin != DffPin::Data {
                    continue;
                }

                let (driver, depth) = self.map_sink(sbj, mapgraph, signal);
                debug!("flip-flop {} {:?} driven by {} at depth {}", dff, pin, driver, depth);
                max_depth = max_depth.max(depth);

                mapgraph.set_dff_pin(id, pin, Some(driver));
            }
        }

        for i in 0..sbj.port_num() {
            let bits = sbj
                .port_bits(i)
                .into_iter()
                .map(|node| {
                    self.info(node).map_node[0]
                        .unwrap_or_else(|| panic!("port {} refers to unmapped node {}", sbj.port_name(i), node))
                })
                .collect();
            mapgraph.add_port(sbj.port_name(i), bits);
        }

        let lut_num = mapgraph.lnode_num();
        info!("mapped {} into {} LUTs of depth {}", sbj.name(), lut_num, max_depth);
        (lut_num, max_depth)
    }

    /// Returns the LUT network node to connect to a pseudo-primary output and its depth.
    fn map_sink<G: SubjectGraph + ?Sized>(
        &mut self,
        sbj: &G,
        mapgraph: &mut LnGraph,
        signal: Signal,
    ) -> (LnNodeId, usize) {
        match signal.node {
            None => (mapgraph.new_lut(&[], vec![signal.inv]), 1),
            Some(node) => {
                let id = self.back_trace(sbj, mapgraph, node, signal.inv);
                let depth = if sbj.is_ppi(node) {
                    // An inverter, or nothing at all.
                    usize::from(signal.inv)
                } else {
                    self.info(node).depth
                };
                (id, depth)
            }
        }
    }

    /// Returns the LUT network node computing `node` at the given polarity, building it and everything it depends on
    /// if needed.
    fn back_trace<G: SubjectGraph + ?Sized>(
        &mut self,
        sbj: &G,
        mapgraph: &mut LnGraph,
        node: usize,
        inv: bool,
    ) -> LnNodeId {
        let idx = usize::from(inv);
        if let Some(id) = self.info(node).map_node[idx] {
            return id;
        }

        if sbj.is_ppi(node) {
            assert!(inv, "pseudo-primary input {} was not mapped", node);

            let input = self.info(node).map_node[0]
                .unwrap_or_else(|| panic!("pseudo-primary input {} was not mapped", node));
            let id = mapgraph.new_lut(&[input], vec![true, false]);
            self.info_mut(node).map_node[1] = Some(id);
            return id;
        }

        let cut = self
            .info(node)
            .cut
            .unwrap_or_else(|| panic!("node {} has no cut", node));

        let mut fanins = Vec::with_capacity(cut.ni());
        let mut idepth = 0;
        for &leaf in cut.inputs() {
            fanins.push(self.back_trace(sbj, mapgraph, leaf, false));
            idepth = idepth.max(self.info(leaf).depth);
        }

        let expr = if inv { !cut.expr().clone() } else { cut.expr().clone() };
        let tv = make_tv(cut.ni(), &expr);
        let id = mapgraph.new_lut(&fanins, tv);

        let info = self.info_mut(node);
        info.map_node[idx] = Some(id);
        info.depth = idepth + 1;
        id
    }

    /// Counts the LUTs [`MapRecord::gen_mapgraph`] would build from the recorded cuts.
    ///
    /// Returns `None` if a logic node reachable from a pseudo-primary output has no recorded cut. Afterwards,
    /// [`MapRecord::cover_count`] and [`MapRecord::check_fonode`] describe the estimated network.
    pub fn estimate<G: SubjectGraph + ?Sized>(&mut self, sbj: &G) -> Option<usize> {
        for info in &mut self.node_info {
            info.map_count = [0; 2];
            info.cov_count = 0;
        }

        for node in sbj.ppi_list() {
            self.info_mut(node).map_count[0] = 1;
        }

        let mut lut_num = 0;
        for onode in sbj.output_list() {
            lut_num += self.estimate_sink(sbj, sbj.output_fanin(onode), true)?;
        }
        for dff in sbj.dff_list() {
            for pin in DffPin::ALL {
                lut_num += self.estimate_sink(sbj, sbj.dff_fanin(dff, pin), pin == DffPin::Data)?;
            }
        }

        trace!("estimated {} LUTs for {}", lut_num, sbj.name());
        Some(lut_num)
    }

    fn estimate_sink<G: SubjectGraph + ?Sized>(
        &mut self,
        sbj: &G,
        signal: Signal,
        constant_lut: bool,
    ) -> Option<usize> {
        match signal.node {
            None => Some(usize::from(constant_lut)),
            Some(node) => self.back_trace2(sbj, node, signal.inv),
        }
    }

    /// Counts the LUTs needed for `node` at the given polarity that have not been counted yet.
    fn back_trace2<G: SubjectGraph + ?Sized>(&mut self, sbj: &G, node: usize, inv: bool) -> Option<usize> {
        let idx = usize::from(inv);
        let info = self.info_mut(node);
        info.map_count[idx] += 1;
        if info.map_count[idx] > 1 {
            return Some(0);
        }

        if sbj.is_ppi(node) {
            // Direct polarity was counted up front, so this is an inverter.
            return Some(1);
        }

        let cut = match info.cut {
            Some(cut) => cut,
            None => {
                trace!("node {} has no cut", node);
                return None;
            }
        };

        self.mark_cover(sbj, cut);

        let mut lut_num = 1;
        for &leaf in cut.inputs() {
            lut_num += self.back_trace2(sbj, leaf, false)?;
        }
        Some(lut_num)
    }

    /// Counts one more cover for every logic node between the root of `cut` and its leaves.
    fn mark_cover<G: SubjectGraph + ?Sized>(&mut self, sbj: &G, cut: &Cut) {
        let mut visited = cut.inputs().iter().copied().collect::<HashSet<_>>();
        let mut stack = vec![cut.root()];

        while let Some(node) = stack.pop() {
            if !visited.insert(node) || !sbj.is_logic(node) {
                continue;
            }

            self.info_mut(node).cov_count += 1;
            stack.extend((0..2).filter_map(|pos| sbj.fanin(node, pos).node));
        }
    }

    /// Returns how many of the cuts counted by the last [`MapRecord::estimate`] cover `node`.
    #[must_use]
    pub fn cover_count(&self, node: usize) -> usize {
        self.info(node).cov_count
    }

    /// Returns true if the last [`MapRecord::estimate`] needed `node` more than once, counting both polarities.
    #[must_use]
    pub fn check_fonode(&self, node: usize) -> bool {
        let info = self.info(node);
        info.map_count[0] + info.map_count[1] > 1
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::{make_tv, MapRecord};
    use crate::cut::Cut;
    use crate::lngraph::{DffPin, LnGraph};
    use crate::logexpr::LogExpr;
    use crate::sbj::SbjGraph;
    use crate::traits::{Signal, SubjectGraph};

    /// Two inputs and their AND.
    fn and2() -> (SbjGraph, [usize; 3]) {
        let mut sbj = SbjGraph::new("top");
        let i0 = sbj.new_input();
        let i1 = sbj.new_input();
        let and = sbj.new_and(Signal::direct(i0), Signal::direct(i1));
        (sbj, [i0, i1, and])
    }

    fn trivial_cuts(sbj: &SbjGraph) -> Vec<Cut> {
        sbj.logic_list()
            .into_iter()
            .map(|node| Cut::trivial(sbj, node))
            .collect()
    }

    fn record_cuts<'a>(sbj: &SbjGraph, cuts: &'a [Cut]) -> MapRecord<'a> {
        let mut record = MapRecord::new();
        record.init(sbj);
        for cut in cuts {
            record.set_cut(cut.root(), cut);
        }
        record
    }

    #[test]
    fn single_and() {
        let (mut sbj, [i0, i1, and]) = and2();
        sbj.new_output(Signal::direct(and));
        let cut = Cut::new(and, vec![i0, i1], LogExpr::posi_literal(0) & LogExpr::posi_literal(1));
        let mut record = MapRecord::new();
        record.init(&sbj);
        record.set_cut(and, &cut);

        assert_eq!(record.estimate(&sbj), Some(1));

        let mut graph = LnGraph::new();
        assert_eq!(record.gen_mapgraph(&sbj, &mut graph), (1, 1));
        assert_eq!(graph.name(), "top");
        let lut = graph.node(graph.lnode_list()[0]);
        assert_eq!(lut.tv(), &[false, false, false, true]);
        assert_eq!(lut.fanin(0), Some(graph.input(0)));
        assert_eq!(lut.fanin(1), Some(graph.input(1)));
        assert_eq!(graph.node(graph.output(0)).fanin(0), Some(lut.id()));
        assert_eq!(graph.level(), 1);
    }

    #[test]
    fn single_and_inverted() {
        let (mut sbj, [_i0, _i1, and]) = and2();
        sbj.new_output(Signal::inverted(and));
        let cuts = trivial_cuts(&sbj);
        let mut record = record_cuts(&sbj, &cuts);

        assert_eq!(record.estimate(&sbj), Some(1));

        let mut graph = LnGraph::new();
        assert_eq!(record.gen_mapgraph(&sbj, &mut graph), (1, 1));
        assert_eq!(graph.node(graph.lnode_list()[0]).tv(), &[true, true, true, false]);
    }

    #[test]
    fn shared_driver() {
        let (mut sbj, [_i0, i1, and]) = and2();
        sbj.new_output(Signal::direct(and));
        sbj.new_output(Signal::direct(and));
        let cuts = trivial_cuts(&sbj);
        let mut record = record_cuts(&sbj, &cuts);

        assert_eq!(record.estimate(&sbj), Some(1));
        assert!(record.check_fonode(and));
        assert!(record.check_fonode(i1));
        assert_eq!(record.cover_count(and), 1);

        let mut graph = LnGraph::new();
        assert_eq!(record.gen_mapgraph(&sbj, &mut graph), (1, 1));
        let lut = graph.lnode_list()[0];
        assert_eq!(graph.node(graph.output(0)).fanin(0), Some(lut));
        assert_eq!(graph.node(graph.output(1)).fanin(0), Some(lut));
    }

    #[test]
    fn both_polarities_are_separate_luts() {
        let (mut sbj, [_i0, _i1, and]) = and2();
        sbj.new_output(Signal::direct(and));
        sbj.new_output(Signal::inverted(and));
        let cuts = trivial_cuts(&sbj);
        let mut record = record_cuts(&sbj, &cuts);

        assert_eq!(record.estimate(&sbj), Some(2));
        assert_eq!(record.cover_count(and), 2);

        let mut graph = LnGraph::new();
        assert_eq!(record.gen_mapgraph(&sbj, &mut graph), (2, 1));
    }

    #[test]
    fn missing_cut() {
        let (mut sbj, [_i0, _i1, and]) = and2();
        sbj.new_output(Signal::direct(and));
        let mut record = MapRecord::new();
        record.init(&sbj);

        assert_eq!(record.get_cut(and), None);
        assert_eq!(record.estimate(&sbj), None);
    }

    #[test]
    #[should_panic(expected = "node 3 has no cut")]
    fn missing_cut_during_reconstruction() {
        let (mut sbj, [_i0, _i1, and]) = and2();
        sbj.new_output(Signal::direct(and));
        let mut record = MapRecord::new();
        record.init(&sbj);

        let _ = record.gen_mapgraph(&sbj, &mut LnGraph::new());
    }

    #[test]
    fn constant_cut() {
        let (mut sbj, [_i0, _i1, and]) = and2();
        sbj.new_output(Signal::inverted(and));
        let cut = Cut::new(and, vec![], LogExpr::zero());
        let mut record = MapRecord::new();
        record.init(&sbj);
        record.set_cut(and, &cut);

        assert_eq!(record.estimate(&sbj), Some(1));

        let mut graph = LnGraph::new();
        assert_eq!(record.gen_mapgraph(&sbj, &mut graph), (1, 1));
        let lut = graph.node(graph.lnode_list()[0]);
        assert_eq!(lut.fanin_num(), 0);
        assert_eq!(lut.tv(), &[true]);
    }

    #[test]
    fn inverted_input() {
        let mut sbj = SbjGraph::new("top");
        let i0 = sbj.new_input();
        sbj.new_output(Signal::inverted(i0));
        sbj.new_output(Signal::inverted(i0));
        sbj.new_output(Signal::direct(i0));
        let mut record = MapRecord::new();
        record.init(&sbj);

        assert_eq!(record.estimate(&sbj), Some(1));

        let mut graph = LnGraph::new();
        assert_eq!(record.gen_mapgraph(&sbj, &mut graph), (1, 1));
        let not = graph.node(graph.lnode_list()[0]);
        assert_eq!(not.tv(), &[true, false]);
        assert_eq!(not.fanin(0), Some(graph.input(0)));
        assert_eq!(graph.node(graph.output(2)).fanin(0), Some(graph.input(0)));
        assert_eq!(graph.level(), 1);
    }

    #[test]
    fn constant_outputs() {
        let mut sbj = SbjGraph::new("top");
        sbj.new_output(Signal::one());
        sbj.new_output(Signal::zero());
        let mut record = MapRecord::new();
        record.init(&sbj);

        assert_eq!(record.estimate(&sbj), Some(2));

        let mut graph = LnGraph::new();
        assert_eq!(record.gen_mapgraph(&sbj, &mut graph), (2, 1));
        let tvs = graph
            .output_list()
            .iter()
            .map(|&o| graph.node(graph.node(o).fanin(0).unwrap()).tv().to_vec())
            .collect::<Vec<_>>();
        assert_eq!(tvs, vec![vec![true], vec![false]]);
    }

    #[test]
    fn estimate_is_repeatable() {
        let (mut sbj, [_i0, _i1, and]) = and2();
        let top = sbj.new_and(Signal::inverted(and), Signal::direct(and));
        sbj.new_output(Signal::direct(top));
        sbj.new_output(Signal::inverted(and));
        let cuts = trivial_cuts(&sbj);
        let mut record = record_cuts(&sbj, &cuts);

        let first = record.estimate(&sbj);
        assert_eq!(first, Some(3));
        assert_eq!(record.estimate(&sbj), first);
        assert_eq!(record.cover_count(and), 2);
    }

    #[test]
    fn copy_keeps_only_cuts() {
        let (mut sbj, [_i0, _i1, and]) = and2();
        sbj.new_output(Signal::direct(and));
        let cuts = trivial_cuts(&sbj);
        let mut record = record_cuts(&sbj, &cuts);
        assert_eq!(record.estimate(&sbj), Some(1));

        let mut other = MapRecord::new();
        other.copy(&record);
        assert!(std::ptr::eq(other.get_cut(and).unwrap(), &cuts[0]));
        assert_eq!(other.cover_count(and), 0);
        assert_eq!(other.estimate(&sbj), Some(1));
    }

    #[test]
    fn reconvergent_cover() {
        let mut sbj = SbjGraph::new("top");
        let a = sbj.new_input();
        let b = sbj.new_input();
        let c = sbj.new_input();
        let n1 = sbj.new_and(Signal::direct(a), Signal::direct(b));
        let n2 = sbj.new_and(Signal::direct(n1), Signal::direct(c));
        let n3 = sbj.new_and(Signal::direct(n1), Signal::inverted(c));
        sbj.new_output(Signal::direct(n2));
        sbj.new_output(Signal::direct(n3));

        let cuts = vec![
            Cut::trivial(&sbj, n1),
            Cut::new(
                n2,
                vec![a, b, c],
                LogExpr::posi_literal(0) & LogExpr::posi_literal(1) & LogExpr::posi_literal(2),
            ),
            Cut::trivial(&sbj, n3),
        ];
        let mut record = record_cuts(&sbj, &cuts);

        assert_eq!(record.estimate(&sbj), Some(3));
        assert_eq!(record.cover_count(n1), 2);
        assert_eq!(record.cover_count(n2), 1);
        assert_eq!(record.cover_count(a), 0);
        assert!(!record.check_fonode(n1));

        let mut graph = LnGraph::new();
        let (lut_num, depth) = record.gen_mapgraph(&sbj, &mut graph);
        assert_eq!((lut_num, depth), (3, 2));
        assert_eq!(graph.level(), depth);

        let wide = graph.node(graph.node(graph.output(0)).fanin(0).unwrap());
        assert_eq!(wide.fanin_num(), 3);
        assert_eq!(
            wide.tv(),
            &[false, false, false, false, false, false, false, true]
        );
    }

    #[test]
    fn flip_flops() {
        let mut sbj = SbjGraph::new("seq");
        let a = sbj.new_input();
        let clk = sbj.new_input();
        let q = sbj.new_dff();
        let idle = sbj.new_dff();
        let n = sbj.new_and(Signal::direct(a), Signal::direct(q));
        sbj.new_output(Signal::direct(n));
        sbj.set_dff_pin(q, DffPin::Data, Signal::inverted(n));
        sbj.set_dff_pin(q, DffPin::Clock, Signal::direct(clk));
        sbj.set_dff_pin(q, DffPin::Reset, Signal::inverted(a));
        sbj.set_dff_pin(idle, DffPin::Clock, Signal::direct(clk));
        sbj.add_port("a", vec![a]);
        sbj.add_port("clk", vec![clk]);

        let cuts = trivial_cuts(&sbj);
        let mut record = record_cuts(&sbj, &cuts);

        // n, !n, !a and the constant data input of `idle`.
        assert_eq!(record.estimate(&sbj), Some(4));

        let mut graph = LnGraph::new();
        assert_eq!(record.gen_mapgraph(&sbj, &mut graph), (4, 1));
        assert_eq!(graph.level(), 1);
        assert_eq!(graph.port_num(), 2);
        assert_eq!(graph.port(1).bits(), &[graph.input(1)]);

        let q = graph.node(graph.dff_list()[0]);
        assert_eq!(q.fanin(DffPin::Clock.pos()), Some(graph.input(1)));
        assert_eq!(q.fanin(DffPin::Set.pos()), None);
        let reset = graph.node(q.fanin(DffPin::Reset.pos()).unwrap());
        assert_eq!(reset.tv(), &[true, false]);
        let data = graph.node(q.fanin(DffPin::Data.pos()).unwrap());
        assert_eq!(data.tv(), &[true, true, true, false]);
        assert_eq!(data.fanin(1), Some(q.id()));

        let idle = graph.node(graph.dff_list()[1]);
        let konst = graph.node(idle.fanin(DffPin::Data.pos()).unwrap());
        assert_eq!(konst.tv(), &[false]);
    }

    #[test]
    fn truth_table_matches_evaluation() {
        for ni in [0, 1, 6, 7, 8] {
            // x0 ^ x1 ^ ... plus a term keeping the function asymmetric.
            let mut expr = LogExpr::zero();
            for var in 0..ni {
                expr = expr ^ LogExpr::posi_literal(var);
            }
            if ni >= 2 {
                expr = expr | (LogExpr::posi_literal(ni - 1) & LogExpr::nega_literal(0));
            }

            let tv = make_tv(ni, &expr);
            assert_eq!(tv.len(), 1 << ni);
            for (p, &value) in tv.iter().enumerate() {
                let vals = (0..ni)
                    .map(|i| if p & (1 << i) != 0 { !0 } else { 0 })
                    .collect::<Vec<u64>>();
                assert_eq!(value, expr.eval(&vals) & 1 == 1, "{} inputs, row {}", ni, p);
            }
        }
    }

    /// Builds the cut of `root` over `leaves`, which must separate `root` from the inputs.
    fn cone_cut(sbj: &SbjGraph, root: usize, leaves: Vec<usize>) -> Cut {
        fn cone_expr(sbj: &SbjGraph, node: usize, leaves: &[usize]) -> LogExpr {
            if let Some(var) = leaves.iter().position(|&leaf| leaf == node) {
                return LogExpr::posi_literal(var);
            }

            let operand = |signal: Signal| match signal.node {
                None => LogExpr::Const(signal.inv),
                Some(inode) => {
                    let expr = cone_expr(sbj, inode, leaves);
                    if signal.inv {
                        !expr
                    } else {
                        expr
                    }
                }
            };
            operand(sbj.fanin(node, 0)) & operand(sbj.fanin(node, 1))
        }

        let expr = cone_expr(sbj, root, &leaves);
        Cut::new(root, leaves, expr)
    }

    fn random_signal(rng: &mut StdRng, nodes: &[usize]) -> Signal {
        if rng.gen_bool(0.05) {
            return Signal::constant(rng.gen());
        }
        Signal {
            node: Some(nodes[rng.gen_range(0..nodes.len())]),
            inv: rng.gen(),
        }
    }

    fn random_network(rng: &mut StdRng) -> SbjGraph {
        let mut sbj = SbjGraph::new("random");
        let mut nodes = (0..4).map(|_| sbj.new_input()).collect::<Vec<_>>();
        let dff = sbj.new_dff();
        nodes.push(dff);

        for _ in 0..30 {
            let a = random_signal(rng, &nodes);
            let b = random_signal(rng, &nodes);
            nodes.push(sbj.new_and(a, b));
        }

        for _ in 0..5 {
            let driver = random_signal(rng, &nodes);
            sbj.new_output(driver);
        }
        let data = random_signal(rng, &nodes);
        sbj.set_dff_pin(dff, DffPin::Data, data);
        sbj.set_dff_pin(dff, DffPin::Clock, Signal::direct(nodes[0]));
        sbj
    }

    fn random_cuts(rng: &mut StdRng, sbj: &SbjGraph) -> Vec<Cut> {
        sbj.logic_list()
            .into_iter()
            .map(|root| {
                let mut leaves = Vec::new();
                for pos in 0..2 {
                    let fanin = match sbj.fanin(root, pos).node {
                        Some(fanin) => fanin,
                        None => continue,
                    };
                    let expand = sbj.is_logic(fanin) && rng.gen_bool(0.5);
                    let candidates: Vec<usize> = if expand {
                        (0..2).filter_map(|pos| sbj.fanin(fanin, pos).node).collect()
                    } else {
                        vec![fanin]
                    };
                    for leaf in candidates {
                        if !leaves.contains(&leaf) {
                            leaves.push(leaf);
                        }
                    }
                }
                cone_cut(sbj, root, leaves)
            })
            .collect()
    }

    #[test]
    fn estimate_agrees_with_reconstruction() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sbj = random_network(&mut rng);
            let cuts = random_cuts(&mut rng, &sbj);
            let mut record = record_cuts(&sbj, &cuts);

            let estimate = record.estimate(&sbj);
            let mut graph = LnGraph::new();
            let (lut_num, depth) = record.gen_mapgraph(&sbj, &mut graph);

            assert_eq!(estimate, Some(lut_num), "seed {}", seed);
            assert_eq!(graph.level(), depth, "seed {}", seed);
            assert_eq!(graph.sort().len(), graph.lnode_num(), "seed {}", seed);
            for &lut in graph.lnode_list() {
                let node = graph.node(lut);
                assert_eq!(node.tv().len(), 1 << node.fanin_num(), "seed {}", seed);
            }
        }
    }
}
