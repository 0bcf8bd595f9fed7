mod trace;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use textinput_core::Config;
use tracing_subscriber::EnvFilter;

/// Replay a recorded trace of native editing events against an in-memory
/// document and print the resulting state as JSON.
#[derive(Parser)]
struct Args {
    /// trace file (.json)
    input: PathBuf,

    /// input layer configuration (.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// write the report here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// pretty-print the report
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Diagnostics go to stderr so the report stays machine readable; RUST_LOG
    // selects targets such as textinput::input=debug.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let config = match &args.config {
        Some(path) => Config::load_toml(path)
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading trace {}", args.input.display()))?;
    let trace = trace::Trace::from_json_str(&content)
        .with_context(|| format!("parsing trace {}", args.input.display()))?;

    let report = trace::replay(&trace, &config)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    match &args.out {
        Some(path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("writing report {}", path.display()))?;
            eprintln!("Wrote report to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
