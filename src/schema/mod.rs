//! Schema inference
//!
//! Discovery accumulates every concrete path and its kind across a document
//! collection ([`SchemaBuilder`]); filtering then reduces that raw path set to
//! the columns selected by the [`InferenceConfig`] policy.

pub mod builder;
pub mod filter;
pub mod naming;

pub use builder::{infer_schema, SchemaBuilder};
pub use naming::column_name;

use crate::nest::Nester;
use crate::path::Path;
use crate::types::{OutputKind, OutputType};
use serde::Serialize;
use serde_json::Value;

/// Which observed paths become columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSelection {
    /// Keep only paths that address terminal values.
    LeavesOnly,
    /// Keep every path whose depth is strictly below the bound.
    MaxDepth(usize),
}

/// How array elements are turned into columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayHandling {
    /// One column per concrete array position.
    Expand,
    /// One collection-valued column per array.
    Collection,
}

/// How column names are derived from paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnNaming {
    /// Keys and indexes joined with a separator (`a.b.0`).
    Path { separator: String },
    /// The last object key (`b`).
    LeafName,
    /// The canonical path string (`$['a']['b'][0]`).
    Canonical,
}

/// Configuration for schema inference
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub selection: ColumnSelection,
    pub arrays: ArrayHandling,
    pub naming: ColumnNaming,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            selection: ColumnSelection::LeavesOnly,
            arrays: ArrayHandling::Collection,
            naming: ColumnNaming::Path {
                separator: String::from("."),
            },
        }
    }
}

/// One output slot of the inferred schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub path: Path,
    /// False when the column holds a collection per row.
    pub single: bool,
    #[serde(rename = "type")]
    pub output_type: OutputType,
}

impl Column {
    pub fn new(name: String, path: Path, kind: OutputKind) -> Self {
        Column {
            name,
            path,
            single: kind.single,
            output_type: kind.resolved_type(),
        }
    }

    pub fn kind(&self) -> OutputKind {
        OutputKind {
            single: self.single,
            output_type: Some(self.output_type),
        }
    }

    /// Short type label, with `[]` marking collections.
    pub fn type_label(&self) -> String {
        let base = serde_json::to_value(self.output_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        if self.single {
            base
        } else {
            format!("{}[]", base)
        }
    }
}

/// The ordered column set produced by inference
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Schema { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Nest the column names by `separator` and describe each column by its
    /// type label, e.g. `{"a": {"b": "integer[]", "c": "string"}}`.
    pub fn to_nested_json(&self, separator: &str) -> Value {
        let nester = Nester::new(&self.names(), separator);
        let labels: Vec<Option<Value>> = self
            .columns
            .iter()
            .map(|c| Some(Value::String(c.type_label())))
            .collect();
        nester.nest_row(&labels)
    }
}
