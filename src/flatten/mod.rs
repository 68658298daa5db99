//! JSON flattening - project documents onto an inferred column schema
//!
//! Inference decides the columns once; [`Projection`] then turns every
//! document into one row of typed [`Cell`](crate::types::Cell)s.

pub mod coerce;
pub mod projection;
pub mod writer;

pub use coerce::{coerce_scalar, Coercion};
pub use projection::{CoercionStats, Projection, Row};
pub use writer::RowWriter;

use crate::schema::{infer_schema, InferenceConfig, Schema};
use serde_json::Value;

/// Infer a schema from `documents` and project every document onto it.
pub fn flatten(documents: &[Value], config: &InferenceConfig) -> (Schema, Vec<Row>, CoercionStats) {
    let schema = infer_schema(documents, config);
    let mut projection = Projection::new(&schema);
    let rows = documents.iter().map(|d| projection.project(d)).collect();
    let stats = projection.finish();
    (schema, rows, stats)
}
