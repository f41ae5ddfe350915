//! Command-line driver for factor computation over token streams.
//!
//! `factr compute` runs training mode (plain factor-label lines) or, with
//! `--json`, inference mode (JSON records enriched with a per-subword-unit
//! factor matrix). `factr merge` undoes subword segmentation on a stream.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use factr::{merge_segment, FactorRegistry, Pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "factr",
    version,
    about = "Per-token linguistic factors with subword broadcast"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute factors over a token stream, broadcasting them across
    /// subwords in JSON mode
    Compute(ComputeArgs),

    /// Undo subword segmentation on a token stream
    Merge(MergeArgs),
}

#[derive(Args, Debug)]
struct ComputeArgs {
    /// Factors to compute (case, subword, mask, number), in output order
    #[arg(required = true)]
    factors: Vec<String>,

    /// File stream to read tokenized data from ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output file to write to ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Work with JSON input and output (inference mode)
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// File stream to read segmented data from ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output file to write to ("-" for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,
}

fn open_input(path: &str) -> Result<Box<dyn BufRead>> {
    Ok(match path {
        "-" => Box::new(BufReader::new(io::stdin())),
        path => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("cannot read input file {path}"))?,
        )),
    })
}

fn open_output(path: &str) -> Result<Box<dyn Write>> {
    Ok(match path {
        "-" => Box::new(BufWriter::new(io::stdout())),
        path => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot create output file {path}"))?,
        )),
    })
}

fn compute(args: &ComputeArgs) -> Result<()> {
    let registry = FactorRegistry::default();
    let pipeline = Pipeline::from_names(&registry, &args.factors)
        .with_context(|| format!("available factors: {}", registry.names().join(", ")))?;

    let input = open_input(&args.input)?;
    let output = open_output(&args.output)?;

    if args.json {
        pipeline.run_json(input, output)?;
    } else {
        pipeline.run_text(input, output)?;
    }
    Ok(())
}

fn merge(args: &MergeArgs) -> Result<()> {
    let input = open_input(&args.input)?;
    let mut output = open_output(&args.output)?;

    for line in input.lines() {
        writeln!(output, "{}", merge_segment(&line?))?;
    }
    output.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match &Cli::parse().command {
        Commands::Compute(args) => compute(args),
        Commands::Merge(args) => merge(args),
    }
}
