use std::io::{self, Read, Write};
use std::path::PathBuf;

use aidx::{Config, Converter, Value};
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "aidx",
    version,
    about = "Convert IATA AIDX XML messages to canonical JSON"
)]
struct Args {
    /// Input XML file (defaults to stdin)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// Drop elements with this tag name, may be repeated
    #[arg(short, long = "skip-tag", value_name = "TAG")]
    skip_tag: Vec<String>,
    /// Keep only child elements with this tag name, may be repeated
    #[arg(short = 'i', long = "include-only", value_name = "TAG")]
    include_only: Vec<String>,
    /// Keep `{uri}` namespace designators in keys
    #[arg(long)]
    preserve_namespaces: bool,
    /// Leave attributes out of the output
    #[arg(long)]
    no_attributes: bool,
    /// Spaces per indentation level
    #[arg(long, value_name = "N", default_value_t = 2, conflicts_with = "compact")]
    indent: usize,
    /// Emit single-line JSON
    #[arg(short, long)]
    compact: bool,
    /// Maximum element nesting depth
    #[arg(long, value_name = "N")]
    max_depth: Option<u16>,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config::new()
            .with_skip_tags(&self.skip_tag)
            .preserve_namespaces(self.preserve_namespaces)
            .include_attributes(!self.no_attributes);
        if !self.include_only.is_empty() {
            config = config.with_include_only_tags(&self.include_only);
        }
        if let Some(max_depth) = self.max_depth {
            config = config.with_max_depth(max_depth);
        }
        config
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(err) = run(Args::parse()) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let converter = Converter::with_config(args.config());

    let result = match &args.input {
        Some(path) => {
            info!("Converting {}", path.display());
            converter
                .parse_file(path)
                .with_context(|| format!("failed to convert {}", path.display()))?
        }
        None => converter
            .parse_str(&read_stdin()?)
            .context("failed to convert stdin")?,
    };

    let result = Value::Mapping(result);
    let mut json = if args.compact {
        aidx::to_json_compact(&result)?
    } else {
        aidx::to_json(&result, args.indent)?
    };
    json.push('\n');

    write_output(args.output.as_ref(), json.as_bytes())?;
    if let Some(path) = &args.output {
        info!("Wrote {} bytes to {}", json.len(), path.display());
    }
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read stdin")?;
    if buffer.trim().is_empty() {
        bail!("no input provided on stdin");
    }
    Ok(buffer)
}

fn write_output(path: Option<&PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
