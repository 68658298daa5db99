//! Schema-guided projection
//!
//! A [`Projection`] evaluates every column of an inferred [`Schema`] against
//! each document and coerces the result to the column's kind. All decisions
//! were made during inference; projection never changes the schema.

use super::coerce::{coerce_scalar, Coercion};
use crate::document::{DocumentModel, JsonModel};
use crate::error::{Error, Result};
use crate::schema::{Column, Schema};
use crate::types::Cell;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// One projected row, aligned with the schema's columns
pub type Row = Vec<Cell>;

/// Per-run coercion statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoercionStats {
    pub rows: usize,
    pub cells: usize,
    /// Cells with no value, absent paths included.
    pub missing: usize,
    /// Values stored in a wider type than their column's.
    pub widened: usize,
    /// Values dropped because they did not fit their column.
    pub failed: usize,
}

impl CoercionStats {
    /// Number of cells that needed a coercion fallback.
    pub fn fallbacks(&self) -> usize {
        self.widened + self.failed
    }

    /// Emit the single aggregated warning for a run, if anything fell back.
    pub fn report(&self) {
        if self.fallbacks() > 0 {
            log::warn!(
                "{} of {} cells needed a coercion fallback ({} widened, {} set to missing)",
                self.fallbacks(),
                self.cells,
                self.widened,
                self.failed
            );
        }
    }

    fn record(&mut self, coercion: Coercion, column: &Column) -> Cell {
        match coercion {
            Coercion::Exact(cell) => cell,
            Coercion::Widened(cell) => {
                log::debug!("Widened value in column '{}' to {:?}", column.name, cell);
                self.widened += 1;
                cell
            }
            Coercion::Failed => {
                log::debug!(
                    "Value in column '{}' does not fit {:?}",
                    column.name,
                    column.output_type
                );
                self.failed += 1;
                Cell::Missing
            }
        }
    }
}

/// Projects documents onto the columns of a schema
pub struct Projection<'s, M = JsonModel> {
    schema: &'s Schema,
    model: M,
    stats: CoercionStats,
}

impl<'s> Projection<'s, JsonModel> {
    pub fn new(schema: &'s Schema) -> Self {
        Self::with_model(schema, JsonModel::new())
    }
}

impl<'s, M: DocumentModel> Projection<'s, M> {
    pub fn with_model(schema: &'s Schema, model: M) -> Self {
        Projection {
            schema,
            model,
            stats: CoercionStats::default(),
        }
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn stats(&self) -> &CoercionStats {
        &self.stats
    }

    /// Project one document. Never fails: absent or unfit values become
    /// missing cells.
    pub fn project(&mut self, document: &M::Document) -> Row {
        self.stats.rows += 1;
        let schema = self.schema;
        let mut row = Vec::with_capacity(schema.len());
        for column in schema.columns() {
            let cell = match self.model.evaluate(document, &column.path) {
                None => Cell::Missing,
                Some(found) => self.coerce(&found, column),
            };
            self.stats.cells += 1;
            if cell.is_missing() {
                self.stats.missing += 1;
            }
            row.push(cell);
        }
        row
    }

    fn coerce(&mut self, found: &Value, column: &Column) -> Cell {
        if column.single {
            let coercion = coerce_scalar(found, column.output_type);
            return self.stats.record(coercion, column);
        }
        match found {
            Value::Array(items) => Cell::List(
                items
                    .iter()
                    .map(|item| {
                        let coercion = coerce_scalar(item, column.output_type);
                        self.stats.record(coercion, column)
                    })
                    .collect(),
            ),
            Value::Null => Cell::Missing,
            // A lone value in a collection column is a collection of one
            scalar => {
                let coercion = coerce_scalar(scalar, column.output_type);
                Cell::List(vec![self.stats.record(coercion, column)])
            }
        }
    }

    /// Project documents until exhausted or until `cancel` is raised. The flag
    /// is only checked between rows.
    pub fn project_all_cancellable<'a, I>(&mut self, documents: I, cancel: &AtomicBool) -> Result<Vec<Row>>
    where
        I: IntoIterator<Item = &'a M::Document>,
        M::Document: 'a,
    {
        let mut rows = Vec::new();
        for document in documents {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled { processed: rows.len() });
            }
            rows.push(self.project(document));
        }
        Ok(rows)
    }

    /// End the run, logging the aggregated coercion warning.
    pub fn finish(self) -> CoercionStats {
        self.stats.report();
        self.stats
    }
}
