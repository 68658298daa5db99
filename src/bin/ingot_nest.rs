//! ingot-nest: Rebuild nested JSON documents from flat rows
//!
//! Reads flat JSON objects (one row per line) whose keys encode a path with
//! a separator, and writes one nested document per row or per group.
//!
//! Usage:
//!   # One nested document per row
//!   echo '{"user.name": "Alice", "user.id": 1}' | ingot-nest
//!
//!   # One column-oriented document per customer
//!   ingot-nest --group-by customer rows.jsonl
//!
//!   # Everything in a single column-oriented document
//!   ingot-nest --aggregate rows.jsonl

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indexmap::IndexSet;
use ingot::input::read_records;
use ingot::nest::{group_rows, FlatRow, NestConfig, Nester};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Read, Write};

#[derive(Parser, Debug)]
#[command(name = "ingot-nest")]
#[command(about = "Rebuild nested JSON documents from flat rows", long_about = None)]
struct Args {
    /// Input file of flat JSON objects (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Separator between name segments (default: ".")
    #[arg(long)]
    separator: Option<String>,

    /// Leave out keys whose value is missing or null
    #[arg(long)]
    omit_missing: bool,

    /// Emit one column-oriented document per distinct value of this column
    #[arg(long, conflicts_with = "aggregate")]
    group_by: Option<String>,

    /// Emit a single column-oriented document for all rows
    #[arg(long)]
    aggregate: bool,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = NestConfig::default();
    if let Some(sep) = args.separator {
        config.separator = sep;
    }
    config.omit_missing = args.omit_missing;

    let reader: Box<dyn Read> = if let Some(file_path) = &args.input {
        Box::new(File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?)
    } else {
        Box::new(std::io::stdin())
    };
    let records = read_records(reader, false)?;

    // Column layout: every key in first-seen order
    let mut names: IndexSet<String> = IndexSet::new();
    for record in &records {
        let Value::Object(obj) = record else {
            bail!("Expected flat JSON objects as rows, found: {}", record);
        };
        names.extend(obj.keys().cloned());
    }
    let rows: Vec<FlatRow> = records
        .iter()
        .map(|record| {
            names
                .iter()
                .map(|name| record.get(name).filter(|v| !v.is_null()).cloned())
                .collect()
        })
        .collect();

    let mut stdout = BufWriter::new(std::io::stdout());
    let mut emit = |doc: &Value| -> Result<()> {
        let line = if args.compact {
            serde_json::to_string(doc)?
        } else {
            serde_json::to_string_pretty(doc)?
        };
        writeln!(stdout, "{}", line).context("Failed to write document")
    };

    if let Some(key_name) = &args.group_by {
        let Some(key_slot) = names.get_index_of(key_name) else {
            bail!("Group-by column '{}' not found in input", key_name);
        };
        // The key column is written once per group, not nested
        let value_names: Vec<&String> = names.iter().filter(|n| *n != key_name).collect();
        let nester = Nester::from_config(&value_names, &config);
        for (key, members) in group_rows(rows, key_slot) {
            let members: Vec<FlatRow> = members
                .into_iter()
                .map(|mut row| {
                    row.remove(key_slot);
                    row
                })
                .collect();
            let mut doc = Map::new();
            doc.insert(key_name.clone(), key);
            if let Value::Object(nested) = nester.nest_group(&members) {
                doc.extend(nested);
            }
            emit(&Value::Object(doc))?;
        }
    } else {
        let names: Vec<&String> = names.iter().collect();
        let nester = Nester::from_config(&names, &config);
        if args.aggregate {
            emit(&nester.nest_group(&rows))?;
        } else {
            for row in &rows {
                emit(&nester.nest_row(row))?;
            }
        }
    }

    stdout.flush()?;
    log::info!("Nested {} rows", records.len());
    Ok(())
}
