use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use log::info;

use lutmap::cut::Cut;
use lutmap::lngraph::LnGraph;
use lutmap::lngraph_dump::{dump, dump_verilog};
use lutmap::map_record::MapRecord;
use lutmap::sbj::SbjGraph;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// Line-oriented listing.
    Text,
    Verilog,
}

/// Maps an ASCII AIGER file onto LUTs, one per AND gate.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// `.aag` file to read
    input: PathBuf,
    /// Where to write the LUT network; standard output if absent
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Module name; defaults to the input file's stem
    #[arg(long)]
    name: Option<String>,
}

/// Turns a file stem into a Verilog identifier.
fn module_name(stem: &str) -> String {
    let mut name = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let name = cli.name.clone().unwrap_or_else(|| {
        cli.input
            .file_stem()
            .map_or_else(|| "top".to_string(), |stem| module_name(&stem.to_string_lossy()))
    });
    let sbj = SbjGraph::from_aiger_file(&name, &cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let cuts = sbj
        .logic_list()
        .into_iter()
        .map(|node| Cut::trivial(&sbj, node))
        .collect::<Vec<_>>();

    let mut record = MapRecord::new();
    record.init(&sbj);
    for cut in &cuts {
        record.set_cut(cut.root(), cut);
    }

    let Some(estimate) = record.estimate(&sbj) else {
        bail!("{} has a logic node with no cut", cli.input.display());
    };
    info!("estimated {} LUTs", estimate);

    let mut graph = LnGraph::new();
    let (lut_num, depth) = record.gen_mapgraph(&sbj, &mut graph);
    info!("{} LUTs, depth {}", lut_num, depth);

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    match cli.format {
        Format::Text => dump(&mut writer, &graph),
        Format::Verilog => dump_verilog(&mut writer, &graph),
    }
    .context("failed to write the LUT network")?;
    writer.flush().context("failed to write the LUT network")?;

    Ok(())
}
