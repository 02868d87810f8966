//! xmlgrid: Flatten an XML document into a table
//!
//! Usage:
//!   # Detect the record element and print rows as JSON lines
//!   xmlgrid catalog.xml
//!
//!   # Read from stdin, records are every <book> element
//!   cat catalog.xml | xmlgrid --tag book
//!
//!   # Explicit record path, one JSON document with columns and rows
//!   xmlgrid --record-path catalog/books/book --format json --pretty catalog.xml
//!
//!   # Only report which element would be used as the record
//!   xmlgrid --detect-only catalog.xml

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use tracing_subscriber::EnvFilter;
use xmlgrid::table::{write_json, write_jsonl};
use xmlgrid::{import_xml, resolve_record_path, ImportConfig, Table};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// One JSON object per row
    Jsonl,
    /// A single document with columns, column groups and rows
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "xmlgrid")]
#[command(about = "Flatten nested XML into a table", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Slash-separated element path from the document root to the record
    #[arg(long, conflicts_with = "tag")]
    record_path: Option<String>,

    /// Name of the record element, located anywhere in the document
    #[arg(long)]
    tag: Option<String>,

    #[arg(long, value_enum, default_value = "jsonl")]
    format: OutputFormat,

    /// Pretty-print --format json output
    #[arg(long)]
    pretty: bool,

    /// Keep every value as a string
    #[arg(long)]
    no_guess_types: bool,

    /// Keep whitespace around element text
    #[arg(long)]
    no_trim: bool,

    /// Print the record path and exit
    #[arg(long)]
    detect_only: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = ImportConfig::default();
    config.record_path = args.record_path.as_deref().map(split_path);
    config.record_tag = args.tag.clone();
    config.guess_cell_types = !args.no_guess_types;
    config.trim_text = !args.no_trim;

    match &args.input {
        Some(path) => {
            let open = || File::open(path).map(BufReader::new);
            if args.detect_only {
                print_record_path(resolve_record_path(open, &config)?)
            } else {
                let table = import_xml(open, &config)
                    .with_context(|| format!("Failed to import {}", path))?;
                write_table(&table, &args)
            }
        }
        None => {
            // stdin can only be read once, keep it around for the second pass
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read stdin")?;
            let open = || Ok(buffer.as_slice());
            if args.detect_only {
                print_record_path(resolve_record_path(open, &config)?)
            } else {
                let table = import_xml(open, &config)?;
                write_table(&table, &args)
            }
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|part| !part.is_empty())
        .map(|part| part.trim().to_string())
        .collect()
}

fn print_record_path(path: Option<Vec<String>>) -> Result<()> {
    match path {
        Some(path) => {
            println!("{}", path.join("/"));
            Ok(())
        }
        None => anyhow::bail!("No record element found in document"),
    }
}

fn write_table(table: &Table, args: &Args) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Jsonl => write_jsonl(table, &mut out)?,
        OutputFormat::Json => write_json(table, &mut out, args.pretty)?,
    }
    out.flush()?;
    Ok(())
}
