use super::projection::Row;
use crate::schema::Schema;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::Write;

/// Writes projected rows as JSON Lines objects keyed by column name
pub struct RowWriter<W: Write> {
    writer: W,
    names: Vec<String>,
}

impl<W: Write> RowWriter<W> {
    pub fn new(writer: W, schema: &Schema) -> Self {
        RowWriter {
            writer,
            names: schema.names().into_iter().map(str::to_string).collect(),
        }
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        let mut data = Map::new();
        for (name, cell) in self.names.iter().zip(row) {
            data.insert(name.clone(), cell.to_json());
        }
        let json = serde_json::to_string(&Value::Object(data))
            .context("Failed to serialize row")?;
        writeln!(self.writer, "{}", json)
            .context("Failed to write row")?;
        Ok(())
    }

    pub fn write_rows(&mut self, rows: &[Row]) -> Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}
