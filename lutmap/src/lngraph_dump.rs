//! Textual and Verilog renderings of a LUT network.

use std::collections::HashSet;
use std::io;

use itertools::Itertools;

use crate::lngraph::{DffPin, LnGraph, LnNode, LnNodeId, LnPort};

/// Renders a port's bits most significant first, as `bit` for a one-bit port or `{msb, ..., lsb}` otherwise.
fn port_bits(port: &LnPort, name: impl Fn(LnNodeId) -> String) -> String {
    assert!(port.bit_width() > 0, "port {} has no bits", port.name());

    if port.bit_width() == 1 {
        name(port.bit(0))
    } else {
        format!("{{{}}}", port.bits().iter().rev().map(|&bit| name(bit)).join(", "))
    }
}

/// Renders ` : port[pos]` for an input or output that belongs to a port.
fn port_ref(graph: &LnGraph, id: LnNodeId) -> String {
    match (graph.port_of(id), graph.port_pos(id)) {
        (Some(port), Some(pos)) => format!(" : {}[{}]", port.name(), pos),
        _ => String::new(),
    }
}

fn id_or_zero(id: Option<LnNodeId>) -> String {
    id.map_or_else(|| "0".to_string(), |id| id.to_string())
}

/// Writes a line-oriented listing of `graph`: ports, inputs, outputs, flip-flops, then LUTs with their truth tables.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn dump<W: io::Write>(mut writer: W, graph: &LnGraph) -> io::Result<()> {
    for i in 0..graph.port_num() {
        let port = graph.port(i);
        writeln!(
            writer,
            "PORT#{}({}): {}",
            i,
            port.name(),
            port_bits(port, |bit| graph.node(bit).id_str())
        )?;
    }

    for &id in graph.input_list() {
        let node = graph.node(id);
        writeln!(writer, "INPUT#{}({}){}", node.subid(), node.id_str(), port_ref(graph, id))?;
    }

    for &id in graph.output_list() {
        let node = graph.node(id);
        writeln!(
            writer,
            "OUTPUT#{}({}){} = {}",
            node.subid(),
            node.id_str(),
            port_ref(graph, id),
            id_or_zero(node.fanin(0))
        )?;
    }

    for &id in graph.dff_list() {
        let node = graph.node(id);
        write!(
            writer,
            "DFF({}): DATA = {} , CLOCK = {}",
            node.id_str(),
            id_or_zero(node.fanin(DffPin::Data.pos())),
            id_or_zero(node.fanin(DffPin::Clock.pos()))
        )?;
        if let Some(set) = node.fanin(DffPin::Set.pos()) {
            write!(writer, ", SET = {}", set)?;
        }
        if let Some(reset) = node.fanin(DffPin::Reset.pos()) {
            write!(writer, ", RST = {}", reset)?;
        }
        writeln!(writer)?;
    }

    for &id in graph.lnode_list() {
        let node = graph.node(id);
        let fanins = (0..node.fanin_num()).map(|pos| id_or_zero(node.fanin(pos))).join(", ");
        writeln!(writer, "LUT({})  = ({})", node.id_str(), fanins)?;
        writeln!(writer, "\t{}", node.tv().iter().map(|&bit| u8::from(bit)).join(""))?;
    }

    Ok(())
}

fn node_name(id: LnNodeId) -> String {
    format!("n{}", id)
}

/// Names a driver, tying an unconnected one to zero.
fn driver_name(id: Option<LnNodeId>) -> String {
    id.map_or_else(|| "1'b0".to_string(), node_name)
}

fn pack(bits: &[bool]) -> u32 {
    bits.iter().rev().fold(0, |acc, &bit| acc << 1 | u32::from(bit))
}

/// Names the primitive implementing a LUT's function: `lut<k>_<truth table in hex>`.
fn lut_name(node: &LnNode) -> String {
    let ni = node.fanin_num();
    let tv = node.tv();

    if ni < 2 {
        format!("lut{}_{:x}", ni, pack(tv))
    } else {
        let hex = tv.chunks(4).rev().map(|nibble| format!("{:x}", pack(nibble))).join("");
        format!("lut{}_{}", ni, hex)
    }
}

fn dump_lut<W: io::Write>(writer: &mut W, node: &LnNode, name: &str) -> io::Result<()> {
    let ni = node.fanin_num();

    writeln!(writer)?;
    writeln!(
        writer,
        "primitive {} (  O{} );",
        name,
        (0..ni).map(|i| format!(", I{}", i)).join("")
    )?;
    writeln!(writer, "  output O;")?;
    writeln!(writer, "  input {};", (0..ni).map(|i| format!(" I{}", i)).join(", "))?;
    writeln!(writer)?;
    writeln!(writer, "  table")?;
    for (b, &value) in node.tv().iter().enumerate() {
        let row = (0..ni).map(|i| if b & (1 << i) != 0 { " 1" } else { " 0" }).join("");
        writeln!(writer, "    {} : {};", row, u8::from(value))?;
    }
    writeln!(writer, "  endtable")?;
    writeln!(writer, "endprimitive")
}

/// Writes `graph` as a Verilog module, with one user-defined primitive per distinct LUT function.
///
/// Every node is a net named `n<id>`; LUT instances are named `U<id>`.
///
/// # Errors
///
/// Returns any error from `writer`.
#[allow(clippy::too_many_lines)]
pub fn dump_verilog<W: io::Write>(mut writer: W, graph: &LnGraph) -> io::Result<()> {
    let mut written = HashSet::new();
    let mut lut_names = vec![String::new(); graph.max_node_id()];

    for &id in graph.lnode_list() {
        let node = graph.node(id);
        if node.fanin_num() > 0 {
            let name = lut_name(node);
            if written.insert(name.clone()) {
                dump_lut(&mut writer, node, &name)?;
            }
            lut_names[id.index()] = name;
        }
    }

    writeln!(writer)?;
    let ports = (0..graph.port_num())
        .map(|i| {
            let port = graph.port(i);
            format!(".{}({})", port.name(), port_bits(port, node_name))
        })
        .join(", ");
    writeln!(writer, "module {}({});", graph.name(), ports)?;

    for &id in graph.input_list() {
        writeln!(writer, "  input  {};", node_name(id))?;
    }
    for &id in graph.output_list() {
        writeln!(writer, "  output {};", node_name(id))?;
    }
    writeln!(writer)?;

    for &id in graph.dff_list() {
        writeln!(writer, "  reg    {};", node_name(id))?;
    }
    writeln!(writer)?;

    for &id in graph.lnode_list() {
        writeln!(writer, "  wire   {};", node_name(id))?;
    }
    writeln!(writer)?;

    for &id in graph.output_list() {
        writeln!(
            writer,
            "  assign {} = {};",
            node_name(id),
            driver_name(graph.node(id).fanin(0))
        )?;
    }

    for &id in graph.lnode_list() {
        let node = graph.node(id);
        if node.fanin_num() == 0 {
            writeln!(writer, "  assign {} = 1'b{};", node_name(id), u8::from(node.tv()[0]))?;
        } else {
            let fanins = (0..node.fanin_num())
                .map(|pos| format!(", {}", driver_name(node.fanin(pos))))
                .join("");
            writeln!(
                writer,
                "  {} U{} ( {}{} );",
                lut_names[id.index()],
                id,
                node_name(id),
                fanins
            )?;
        }
    }
    writeln!(writer)?;

    for &id in graph.dff_list() {
        let node = graph.node(id);
        let data = driver_name(node.fanin(DffPin::Data.pos()));
        let clock = driver_name(node.fanin(DffPin::Clock.pos()));
        let set = node.fanin(DffPin::Set.pos()).map(node_name);
        let reset = node.fanin(DffPin::Reset.pos()).map(node_name);

        write!(writer, "  always @ ( posedge {}", clock)?;
        for signal in set.iter().chain(&reset) {
            write!(writer, " or posedge {}", signal)?;
        }
        writeln!(writer, " )")?;

        if let Some(set) = &set {
            writeln!(writer, "    if ( {} )", set)?;
            writeln!(writer, "      {} <= 1;", node_name(id))?;
        }
        if let Some(reset) = &reset {
            let prefix = if set.is_some() { "else " } else { "" };
            writeln!(writer, "    {}if ( {} )", prefix, reset)?;
            writeln!(writer, "      {} <= 0;", node_name(id))?;
        }
        if set.is_some() || reset.is_some() {
            writeln!(writer, "    else")?;
            write!(writer, "  ")?;
        }
        writeln!(writer, "    {} <= {};", node_name(id), data)?;
        writeln!(writer)?;
    }

    writeln!(writer, "endmodule")
}
