//! ingot-flatten: Flatten JSON documents into typed columns
//!
//! Infers one column per selected path across all input documents, then
//! writes every document as a JSON Lines row keyed by column name.
//!
//! Usage:
//!   # Read from file, write rows to stdout
//!   ingot-flatten data.json
//!
//!   # Read NDJSON from stdin, name columns by their last key
//!   cat events.jsonl | ingot-flatten --ndjson --naming leaf
//!
//!   # Show the inferred schema only, nesting at most two levels deep
//!   ingot-flatten --schema --max-depth 2 data.json

// Use MiMalloc allocator for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ingot::flatten::{Projection, RowWriter};
use ingot::input::read_records;
use ingot::schema::{ArrayHandling, ColumnNaming, ColumnSelection, InferenceConfig, SchemaBuilder};
use std::fs::File;
use std::io::{BufWriter, Read, Write};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Naming {
    /// Keys and indexes joined by the separator
    Path,
    /// Last object key
    Leaf,
    /// Canonical path string
    Canonical,
}

#[derive(Parser, Debug)]
#[command(name = "ingot-flatten")]
#[command(about = "Flatten JSON documents into typed columns", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one document per line)
    #[arg(long)]
    ndjson: bool,

    /// Output file for rows (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Keep every path shallower than this depth instead of leaves only
    #[arg(long)]
    max_depth: Option<usize>,

    /// One column per array position instead of one collection column
    #[arg(long)]
    expand_arrays: bool,

    /// How to name columns
    #[arg(long, value_enum, default_value = "path")]
    naming: Naming,

    /// Separator for path naming (default: ".")
    #[arg(long)]
    separator: Option<String>,

    /// Print the inferred schema instead of rows
    #[arg(long)]
    schema: bool,

    /// Print the schema as a nested tree of column types (implies --schema)
    #[arg(long)]
    tree: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Build config
    let mut config = InferenceConfig::default();
    let separator = args.separator.clone().unwrap_or_else(|| String::from("."));
    if let Some(depth) = args.max_depth {
        config.selection = ColumnSelection::MaxDepth(depth);
    }
    if args.expand_arrays {
        config.arrays = ArrayHandling::Expand;
    }
    config.naming = match args.naming {
        Naming::Path => ColumnNaming::Path { separator: separator.clone() },
        Naming::Leaf => ColumnNaming::LeafName,
        Naming::Canonical => ColumnNaming::Canonical,
    };

    let reader: Box<dyn Read> = if let Some(file_path) = &args.input {
        Box::new(File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?)
    } else {
        Box::new(std::io::stdin())
    };
    let documents = read_records(reader, args.ndjson)?;
    if documents.is_empty() {
        log::warn!("No JSON documents found in input");
    }

    let mut builder = SchemaBuilder::new();
    for document in &documents {
        builder.add_value(document);
    }
    let schema = builder.build(&config);

    let output: Box<dyn Write> = if let Some(path) = &args.output {
        Box::new(File::create(path).with_context(|| format!("Failed to create {}", path))?)
    } else {
        Box::new(std::io::stdout())
    };
    let mut output = BufWriter::new(output);

    if args.tree {
        let tree = schema.to_nested_json(&separator);
        writeln!(output, "{}", serde_json::to_string_pretty(&tree)?)?;
        output.flush()?;
        return Ok(());
    }
    if args.schema {
        writeln!(output, "{}", serde_json::to_string_pretty(&schema)?)?;
        output.flush()?;
        return Ok(());
    }

    let mut projection = Projection::new(&schema);
    let mut writer = RowWriter::new(output, &schema);
    for document in &documents {
        writer.write_row(&projection.project(document))?;
    }
    writer.flush()?;

    let stats = projection.finish();
    log::info!("Wrote {} rows with {} columns", stats.rows, schema.len());

    Ok(())
}
