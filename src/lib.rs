//! # Ingot - JSON ⇄ table conversion
//!
//! Ingot flattens collections of heterogeneous JSON documents into typed
//! columns, and re-nests flat rows into JSON documents.
//!
//! ## Modules
//!
//! - **path**: canonical paths into a document and their total order
//! - **types**: the output type lattice and typed cells
//! - **schema**: column discovery, filtering and naming
//! - **flatten**: projecting documents onto an inferred schema
//! - **structure** / **nest**: compiling separator-joined names into a tree
//!   and rebuilding nested documents from rows
//!
//! ## Quick Start
//!
//! ### Flattening
//!
//! ```rust
//! use ingot::flatten::Projection;
//! use ingot::schema::{infer_schema, InferenceConfig};
//! use serde_json::json;
//!
//! let docs = vec![
//!     json!({"user": {"name": "Alice", "tags": ["a", "b"]}}),
//!     json!({"user": {"name": "Bob", "age": 30}}),
//! ];
//!
//! let schema = infer_schema(&docs, &InferenceConfig::default());
//! assert_eq!(schema.names(), vec!["user.age", "user.name", "user.tags"]);
//!
//! let mut projection = Projection::new(&schema);
//! let rows: Vec<_> = docs.iter().map(|d| projection.project(d)).collect();
//! assert_eq!(rows.len(), 2);
//! ```
//!
//! ### Nesting
//!
//! ```rust
//! use ingot::nest::Nester;
//! use serde_json::json;
//!
//! let nester = Nester::new(&["user.name", "user.id"], ".");
//! let doc = nester.nest_row(&[Some(json!("Alice")), Some(json!(7))]);
//! assert_eq!(doc, json!({"user": {"id": 7, "name": "Alice"}}));
//! ```

use anyhow::Result;
use std::io::{Read, Write};

pub mod document;
pub mod error;
pub mod flatten;
pub mod input;
pub mod nest;
pub mod path;
pub mod schema;
pub mod structure;
pub mod types;

// Re-export commonly used types for convenience
pub use document::{DocumentModel, JsonModel};
pub use error::Error;
pub use flatten::{CoercionStats, Projection, RowWriter};
pub use nest::{NestConfig, Nester};
pub use path::{parse_canonical, Path, PathSegment};
pub use schema::{ArrayHandling, Column, ColumnNaming, ColumnSelection, InferenceConfig, Schema, SchemaBuilder};
pub use structure::StructureNode;
pub use types::{Cell, OutputKind, OutputType};

/// Main entry point: flatten a JSON stream into JSON Lines rows
pub fn flatten_json<R: Read, W: Write>(
    reader: R,
    writer: W,
    ndjson: bool,
    config: &InferenceConfig,
) -> Result<Schema> {
    let documents = input::read_records(reader, ndjson)?;

    let mut builder = SchemaBuilder::new();
    for document in &documents {
        builder.add_value(document);
    }
    let schema = builder.build(config);

    let mut projection = Projection::new(&schema);
    let mut rows = RowWriter::new(writer, &schema);
    for document in &documents {
        rows.write_row(&projection.project(document))?;
    }
    rows.flush()?;
    projection.finish();

    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf_config() -> InferenceConfig {
        InferenceConfig {
            naming: ColumnNaming::LeafName,
            ..InferenceConfig::default()
        }
    }

    #[test]
    fn test_leaf_naming_scenario() {
        let docs = vec![
            json!({"a": {"b": [1, 2], "c": "x"}}),
            json!({"a": {"b": [3], "d": null}}),
        ];
        let schema = schema::infer_schema(&docs, &leaf_config());
        assert_eq!(schema.names(), vec!["b", "c", "d"]);

        let b = schema.column("b").unwrap();
        assert!(!b.single);
        assert_eq!(b.output_type, OutputType::Integer);
        assert_eq!(schema.column("c").unwrap().output_type, OutputType::String);
        assert_eq!(schema.column("d").unwrap().output_type, OutputType::String);

        let mut projection = Projection::new(&schema);
        let first = projection.project(&docs[0]);
        let second = projection.project(&docs[1]);
        assert_eq!(first[1], Cell::String("x".into()));
        assert_eq!(first[2], Cell::Missing);
        assert_eq!(second[0], Cell::List(vec![Cell::Integer(3)]));
        assert_eq!(second[1], Cell::Missing);
        assert_eq!(second[2], Cell::Missing);
    }

    #[test]
    fn test_bounded_depth_scenario() {
        let docs = vec![json!({"a": {"b": 1}}), json!({"a": 5})];
        let config = InferenceConfig {
            selection: ColumnSelection::MaxDepth(2),
            ..InferenceConfig::default()
        };
        let schema = schema::infer_schema(&docs, &config);
        assert_eq!(schema.len(), 1);
        let a = &schema.columns()[0];
        assert_eq!(a.path.to_string(), "$['a']");
        assert_eq!(a.output_type, OutputType::Json);
        assert!(a.single);
    }

    #[test]
    fn test_array_collapse_scenario() {
        let docs = vec![json!(["x"]), json!(["x", "y"]), json!(["x", "y", "z"])];
        let schema = schema::infer_schema(&docs, &InferenceConfig::default());
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.columns()[0].path.to_string(), "$[*]");
        assert!(!schema.columns()[0].single);
    }

    #[test]
    fn test_expanded_arrays_get_one_column_per_position() {
        let docs = vec![json!({"v": [1, 2]}), json!({"v": [3]})];
        let config = InferenceConfig {
            arrays: ArrayHandling::Expand,
            ..InferenceConfig::default()
        };
        let schema = schema::infer_schema(&docs, &config);
        assert_eq!(schema.names(), vec!["v.0", "v.1"]);

        let mut projection = Projection::new(&schema);
        assert_eq!(projection.project(&docs[1]), vec![Cell::Integer(3), Cell::Missing]);
    }

    #[test]
    fn test_leaves_only_never_keeps_container_with_its_leaf() {
        let fixtures = vec![
            vec![
                json!({"a": {"b": {"c": 1}}, "x": [{"k": 1}, {"k": 2}]}),
                json!({"a": {"b": {"d": true}}, "x": [{"k": 3}]}),
            ],
            // arrays nested in arrays
            vec![
                json!({"a": [{"b": [{"k": 1}]}]}),
                json!({"a": [{"b": [{"k": 2}, {"k": 3}]}]}),
            ],
            vec![
                json!({"m": [[{"k": 1}], [{"k": 2}, {"k": 3}]]}),
                json!({"m": [[{"k": 4}]]}),
            ],
        ];
        for docs in &fixtures {
            for arrays in [ArrayHandling::Expand, ArrayHandling::Collection] {
                let config = InferenceConfig { arrays, ..InferenceConfig::default() };
                let schema = schema::infer_schema(docs, &config);
                for outer in schema.columns() {
                    for inner in schema.columns() {
                        assert!(
                            !inner.path.descends_from(&outer.path),
                            "{} kept next to {}",
                            outer.path,
                            inner.path
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_discovered_paths_round_trip() {
        let mut builder = SchemaBuilder::new();
        builder.add_value(&json!({"it's": [{"a\\b": 1}], "": [[true]]}));
        for path in builder.observed_paths() {
            assert_eq!(&parse_canonical(&path.to_canonical_string()).unwrap(), path);
        }
    }

    #[test]
    fn test_flatten_then_nest_restores_documents() {
        let docs = vec![
            json!({"id": 1, "user": {"name": "Alice", "email": "a@x.org"}}),
            json!({"id": 2, "user": {"name": "Bob", "email": "b@x.org"}}),
        ];
        let (schema, rows, stats) = flatten::flatten(&docs, &InferenceConfig::default());
        assert_eq!(stats.fallbacks(), 0);

        let nester = Nester::new(&schema.names(), ".");
        for (row, doc) in rows.iter().zip(&docs) {
            let flat: Vec<Option<serde_json::Value>> = row
                .iter()
                .map(|c| if c.is_missing() { None } else { Some(c.to_json()) })
                .collect();
            assert_eq!(&nester.nest_row(&flat), doc);
        }
    }

    /// A flat `key=value;...` record format with its own node type
    #[derive(Debug)]
    enum Field {
        Record(Vec<(String, Field)>),
        Text(String),
        Number(i64),
    }

    #[derive(Debug, Clone)]
    struct RecordModel;

    impl RecordModel {
        fn to_json(node: &Field) -> serde_json::Value {
            match node {
                Field::Record(fields) => serde_json::Value::Object(
                    fields.iter().map(|(k, v)| (k.clone(), Self::to_json(v))).collect(),
                ),
                Field::Text(s) => json!(s),
                Field::Number(n) => json!(n),
            }
        }
    }

    impl DocumentModel for RecordModel {
        type Document = Field;

        fn parse(&self, text: &str) -> error::Result<Field> {
            let fields = text
                .split(';')
                .filter(|pair| !pair.is_empty())
                .map(|pair| {
                    let (key, raw) = pair.split_once('=').unwrap_or((pair, ""));
                    let node = raw
                        .parse()
                        .map(Field::Number)
                        .unwrap_or_else(|_| Field::Text(raw.to_string()));
                    (key.to_string(), node)
                })
                .collect();
            Ok(Field::Record(fields))
        }

        fn enumerate<'a>(&self, document: &'a Field) -> Vec<(Path, &'a Field)> {
            match document {
                Field::Record(fields) => fields
                    .iter()
                    .map(|(key, node)| (Path::from_keys([key.as_str()]), node))
                    .collect(),
                _ => Vec::new(),
            }
        }

        fn evaluate(&self, document: &Field, path: &Path) -> Option<serde_json::Value> {
            let mut node = document;
            for segment in path.segments() {
                let (PathSegment::Key(key), Field::Record(fields)) = (segment, node) else {
                    return None;
                };
                node = fields.iter().find(|(k, _)| k == key).map(|(_, n)| n)?;
            }
            Some(Self::to_json(node))
        }

        fn scalar_type(&self, node: &Field) -> Option<OutputType> {
            match node {
                Field::Record(_) => Some(OutputType::Json),
                Field::Text(_) => Some(OutputType::String),
                Field::Number(n) if i32::try_from(*n).is_ok() => Some(OutputType::Integer),
                Field::Number(_) => Some(OutputType::Long),
            }
        }

        fn kind_of(&self, node: &Field) -> OutputKind {
            OutputKind::single(self.scalar_type(node))
        }

        fn is_container(&self, node: &Field) -> bool {
            matches!(node, Field::Record(_))
        }

        fn is_null(&self, _node: &Field) -> bool {
            false
        }
    }

    #[test]
    fn test_inference_runs_on_a_non_json_document_model() {
        let mut builder = SchemaBuilder::with_model(RecordModel);
        builder.add_text("id=1;name=Alice").unwrap();
        builder.add_text("id=5000000000;tag=x").unwrap();
        let schema = builder.build(&InferenceConfig::default());
        assert_eq!(schema.names(), vec!["id", "name", "tag"]);
        assert_eq!(schema.column("id").unwrap().output_type, OutputType::Long);

        let document = RecordModel.parse("id=7;tag=y").unwrap();
        let mut projection = Projection::with_model(&schema, RecordModel);
        assert_eq!(
            projection.project(&document),
            vec![Cell::Long(7), Cell::Missing, Cell::String("y".into())]
        );
    }

    #[test]
    fn test_flatten_json_writes_rows() {
        let input = b"{\"a\": 1}\n{\"a\": 2, \"b\": \"x\"}\n";
        let mut out = Vec::new();
        let schema = flatten_json(&input[..], &mut out, true, &InferenceConfig::default()).unwrap();
        assert_eq!(schema.names(), vec!["a", "b"]);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "{\"a\":1,\"b\":null}\n{\"a\":2,\"b\":\"x\"}\n");
    }
}
