//! Scalar coercion of found values into typed cells.

use crate::document::is_base64;
use crate::types::{Cell, OutputType};
use serde_json::Value;

/// Outcome of coercing one value
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    /// The value fits the target type.
    Exact(Cell),
    /// The value did not fit and was stored in a wider representation.
    Widened(Cell),
    /// The value has no representation in the target type.
    Failed,
}

/// Coerce one scalar value to `target`. Null is absence, never a failure.
pub fn coerce_scalar(value: &Value, target: OutputType) -> Coercion {
    if value.is_null() {
        return Coercion::Exact(Cell::Missing);
    }
    match target {
        OutputType::Json => Coercion::Exact(Cell::Json(value.clone())),
        OutputType::Boolean => match value {
            Value::Bool(b) => Coercion::Exact(Cell::Boolean(*b)),
            _ => Coercion::Failed,
        },
        OutputType::Integer => match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => match i32::try_from(i) {
                    Ok(i) => Coercion::Exact(Cell::Integer(i)),
                    Err(_) => Coercion::Widened(Cell::Long(i)),
                },
                None if n.is_u64() => widen_to_double(n),
                None => Coercion::Failed,
            },
            _ => Coercion::Failed,
        },
        OutputType::Long => match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Coercion::Exact(Cell::Long(i)),
                None if n.is_u64() => widen_to_double(n),
                None => Coercion::Failed,
            },
            _ => Coercion::Failed,
        },
        OutputType::Double => match value.as_f64() {
            Some(d) => Coercion::Exact(Cell::Double(d)),
            None => Coercion::Failed,
        },
        OutputType::String => match value {
            Value::String(s) => Coercion::Exact(Cell::String(s.clone())),
            _ => Coercion::Failed,
        },
        OutputType::Base64 => match value {
            Value::String(s) if is_base64(s) => Coercion::Exact(Cell::Base64(s.clone())),
            _ => Coercion::Failed,
        },
    }
}

fn widen_to_double(n: &serde_json::Number) -> Coercion {
    match n.as_f64() {
        Some(d) => Coercion::Widened(Cell::Double(d)),
        None => Coercion::Failed,
    }
}
