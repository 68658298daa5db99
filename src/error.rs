use thiserror::Error;

/// Errors raised by the inference engine.
///
/// Only structural problems and cancellation surface here. Coercion trouble
/// during projection is reported through `CoercionStats` instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed canonical path '{input}': {reason}")]
    MalformedPath { input: String, reason: String },

    #[error("Operation cancelled after {processed} records")]
    Cancelled { processed: usize },

    #[error("Failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
