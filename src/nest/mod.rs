//! Re-nesting flat rows into documents
//!
//! Column names such as `user.name` and `user.id` are compiled once into a
//! structure tree; every row is then assembled into one nested document
//! following that tree.

use crate::structure::{compile, Children, StructureNode};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A flat input row; `None` marks a missing cell.
pub type FlatRow = Vec<Option<Value>>;

/// Configuration for the nesting direction
#[derive(Debug, Clone)]
pub struct NestConfig {
    /// Separator between name segments
    pub separator: String,
    /// Drop keys whose cell is missing instead of writing `null`
    pub omit_missing: bool,
}

impl Default for NestConfig {
    fn default() -> Self {
        NestConfig {
            separator: String::from("."),
            omit_missing: false,
        }
    }
}

/// Assembles nested documents from rows of a fixed column layout
#[derive(Debug, Clone)]
pub struct Nester {
    structure: StructureNode,
    omit_missing: bool,
}

impl Nester {
    pub fn new<S: AsRef<str>>(names: &[S], separator: &str) -> Self {
        Nester {
            structure: compile(names, separator),
            omit_missing: false,
        }
    }

    pub fn from_config<S: AsRef<str>>(names: &[S], config: &NestConfig) -> Self {
        Nester {
            structure: compile(names, &config.separator),
            omit_missing: config.omit_missing,
        }
    }

    pub fn structure(&self) -> &StructureNode {
        &self.structure
    }

    /// Build one document from one row.
    pub fn nest_row(&self, row: &[Option<Value>]) -> Value {
        let cell = |slot: usize| row.get(slot).cloned().flatten();
        self.assemble_root(&cell)
    }

    /// Build one document per row.
    pub fn nest_rows(&self, rows: &[FlatRow]) -> Vec<Value> {
        rows.iter().map(|row| self.nest_row(row)).collect()
    }

    /// Build one column-oriented document for a group of rows: every leaf
    /// holds the array of that column's values across the group.
    ///
    /// Arrays stay aligned with the rows, so a missing cell is `null` in its
    /// array. With `omit_missing` only a column missing in every row is left out.
    pub fn nest_group(&self, rows: &[FlatRow]) -> Value {
        let omit_missing = self.omit_missing;
        let cell = |slot: usize| {
            let mut present = false;
            let values: Vec<Value> = rows
                .iter()
                .map(|row| match row.get(slot).cloned().flatten() {
                    Some(v) => {
                        present = true;
                        v
                    }
                    None => Value::Null,
                })
                .collect();
            if present || !omit_missing {
                Some(Value::Array(values))
            } else {
                None
            }
        };
        self.assemble_root(&cell)
    }

    fn assemble_root<F>(&self, cell: &F) -> Value
    where
        F: Fn(usize) -> Option<Value>,
    {
        self.assemble(&self.structure, cell)
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    fn assemble<F>(&self, node: &StructureNode, cell: &F) -> Option<Value>
    where
        F: Fn(usize) -> Option<Value>,
    {
        match node {
            StructureNode::Leaf { column } => match cell(*column) {
                Some(value) => Some(value),
                None if self.omit_missing => None,
                None => Some(Value::Null),
            },
            StructureNode::Branch { children } => {
                let map = self.assemble_children(children, cell);
                if map.is_empty() && self.omit_missing {
                    None
                } else {
                    Some(Value::Object(map))
                }
            }
            StructureNode::Hybrid { column, children } => {
                let mut map = match cell(*column) {
                    Some(Value::Object(own)) => own,
                    None | Some(Value::Null) => Map::new(),
                    // The node's own value sits under the empty key
                    Some(own) => {
                        let mut map = Map::new();
                        map.insert(String::new(), own);
                        map
                    }
                };
                map.extend(self.assemble_children(children, cell));
                if map.is_empty() && self.omit_missing {
                    None
                } else {
                    Some(Value::Object(map))
                }
            }
        }
    }

    fn assemble_children<F>(&self, children: &Children, cell: &F) -> Map<String, Value>
    where
        F: Fn(usize) -> Option<Value>,
    {
        let mut map = Map::new();
        for (name, child) in children {
            if let Some(value) = self.assemble(child, cell) {
                map.insert(name.clone(), value);
            }
        }
        map
    }
}

/// Group rows by the value in `key_slot`, keeping first-seen group order.
/// Missing keys group together under `null`.
pub fn group_rows(rows: Vec<FlatRow>, key_slot: usize) -> Vec<(Value, Vec<FlatRow>)> {
    // Keyed by the serialized value; `Value` itself is not hashable
    let mut groups: IndexMap<String, (Value, Vec<FlatRow>)> = IndexMap::new();
    for row in rows {
        let key = row.get(key_slot).cloned().flatten().unwrap_or(Value::Null);
        groups
            .entry(key.to_string())
            .or_insert_with(|| (key, Vec::new()))
            .1
            .push(row);
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(values: &[Value]) -> FlatRow {
        values.iter().cloned().map(Some).collect()
    }

    #[test]
    fn test_nest_row() {
        let nester = Nester::new(&["user.name", "user.id", "active"], ".");
        let doc = nester.nest_row(&row(&[json!("Alice"), json!(1), json!(true)]));
        assert_eq!(doc, json!({"active": true, "user": {"id": 1, "name": "Alice"}}));
        // field order follows the sorted names
        assert_eq!(
            serde_json::to_string(&doc).unwrap(),
            r#"{"active":true,"user":{"id":1,"name":"Alice"}}"#
        );
    }

    #[test]
    fn test_missing_cells() {
        let names = ["a.b", "a.c"];
        let values = vec![Some(json!(1)), None];

        let nester = Nester::new(&names, ".");
        assert_eq!(nester.nest_row(&values), json!({"a": {"b": 1, "c": null}}));

        let config = NestConfig { omit_missing: true, ..NestConfig::default() };
        let nester = Nester::from_config(&names, &config);
        assert_eq!(nester.nest_row(&values), json!({"a": {"b": 1}}));
        assert_eq!(nester.nest_row(&[None, None]), json!({}));
    }

    #[test]
    fn test_hybrid_scalar_goes_under_empty_key() {
        let nester = Nester::new(&["a.b", "a"], ".");
        assert_eq!(
            nester.nest_row(&row(&[json!(1), json!("self")])),
            json!({"a": {"": "self", "b": 1}})
        );
    }

    #[test]
    fn test_hybrid_object_merges_with_children() {
        let nester = Nester::new(&["a.b", "a"], ".");
        assert_eq!(
            nester.nest_row(&row(&[json!(1), json!({"x": 2, "b": 0})])),
            json!({"a": {"x": 2, "b": 1}})
        );
    }

    #[test]
    fn test_nest_group_is_column_oriented() {
        let nester = Nester::new(&["p.x", "p.y"], ".");
        let rows = vec![row(&[json!(1), json!(2)]), vec![Some(json!(3)), None]];
        assert_eq!(nester.nest_group(&rows), json!({"p": {"x": [1, 3], "y": [2, null]}}));
    }

    #[test]
    fn test_nest_group_omit_missing_keeps_rows_aligned() {
        let config = NestConfig { omit_missing: true, ..NestConfig::default() };
        let nester = Nester::from_config(&["p.x", "p.y", "p.z"], &config);
        let rows = vec![
            vec![Some(json!(1)), Some(json!(2)), None],
            vec![Some(json!(3)), None, None],
        ];
        assert_eq!(nester.nest_group(&rows), json!({"p": {"x": [1, 3], "y": [2, null]}}));
    }

    #[test]
    fn test_empty_hybrid_is_omitted() {
        let config = NestConfig { omit_missing: true, ..NestConfig::default() };
        let nester = Nester::from_config(&["a.b", "a", "c"], &config);
        assert_eq!(nester.nest_row(&[None, None, Some(json!(1))]), json!({"c": 1}));
        assert_eq!(
            nester.nest_row(&[Some(json!(2)), None, Some(json!(1))]),
            json!({"a": {"b": 2}, "c": 1})
        );
    }

    #[test]
    fn test_group_rows_first_seen_order() {
        let rows = vec![
            row(&[json!("b"), json!(1)]),
            row(&[json!("a"), json!(2)]),
            row(&[json!("b"), json!(3)]),
            vec![None, Some(json!(4))],
        ];
        let groups = group_rows(rows, 0);
        let keys: Vec<Value> = groups.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![json!("b"), json!("a"), Value::Null]);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1], row(&[json!("b"), json!(3)]));
    }

    #[test]
    fn test_short_row_is_missing() {
        let nester = Nester::new(&["a", "b"], ".");
        assert_eq!(nester.nest_row(&row(&[json!(1)])), json!({"a": 1, "b": null}));
    }
}
