//! Record reading
//!
//! Input is either one JSON value (a top-level array is treated as a stream
//! of records) or newline-delimited JSON. Whole-buffer input goes through
//! simd-json first and falls back to line-by-line `serde_json`.

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::{BufReader, Read};

/// Read every record from `reader`.
///
/// With `ndjson` set the input is read line by line. Otherwise a top-level
/// array yields its elements, any other single value yields itself, and
/// input that is not a single JSON value is retried as NDJSON.
pub fn read_records<R: Read>(reader: R, ndjson: bool) -> Result<Vec<Value>> {
    let mut content = Vec::new();
    BufReader::new(reader)
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    if ndjson {
        return parse_lines(&content);
    }

    // simd-json parses in place, keep the original for the fallback
    let mut scratch = content.clone();
    match simd_json::serde::from_slice::<Value>(&mut scratch) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(record) => Ok(vec![record]),
        Err(_) => parse_lines(&content),
    }
}

/// Parse newline-delimited JSON, skipping blank lines.
pub fn parse_lines(content: &[u8]) -> Result<Vec<Value>> {
    let text = std::str::from_utf8(content).context("Input is not valid UTF-8")?;
    let mut records = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse JSON on line {}", number + 1))?;
        records.push(value);
    }
    Ok(records)
}
