//! Streaming discovery accumulator
//!
//! Documents are added one at a time. The builder keeps only the set of
//! observed paths and a running kind per path; the column set is produced
//! once at the end by [`SchemaBuilder::build`].

use super::filter::select_paths;
use super::naming::name_columns;
use super::{Column, InferenceConfig, Schema};
use crate::document::{DocumentModel, JsonModel};
use crate::error::{Error, Result};
use crate::path::Path;
use crate::types::{OutputKind, OutputType};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

/// Accumulates path and kind observations across documents
#[derive(Debug, Clone)]
pub struct SchemaBuilder<M = JsonModel> {
    model: M,
    observed: BTreeSet<Path>,
    kinds: BTreeMap<Path, OutputKind>,
    // Kind of scalar document roots, tracked apart from `kinds`
    root_scalar: Option<OutputKind>,
    saw_structured_root: bool,
    sample_count: usize,
}

impl SchemaBuilder<JsonModel> {
    /// Create a new builder over the `serde_json` model
    pub fn new() -> Self {
        Self::with_model(JsonModel::new())
    }
}

impl Default for SchemaBuilder<JsonModel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: DocumentModel> SchemaBuilder<M> {
    pub fn with_model(model: M) -> Self {
        SchemaBuilder {
            model,
            observed: BTreeSet::new(),
            kinds: BTreeMap::new(),
            root_scalar: None,
            saw_structured_root: false,
            sample_count: 0,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn observed_paths(&self) -> &BTreeSet<Path> {
        &self.observed
    }

    pub fn kind(&self, path: &Path) -> Option<OutputKind> {
        self.kinds.get(path).copied()
    }

    /// Record every concrete path of one document and its kind.
    pub fn add_value(&mut self, document: &M::Document) {
        self.sample_count += 1;

        if self.model.is_scalar_root(document) {
            let kind = self.model.kind_of(document);
            self.root_scalar = Some(match self.root_scalar {
                Some(existing) => existing.merge(kind),
                None => kind,
            });
            return;
        }
        if self.model.is_container(document) {
            self.saw_structured_root = true;
        }

        for (path, value) in self.model.enumerate(document) {
            let kind = self.model.kind_of(value);
            if path.ends_with_index() {
                // Elements also feed the kind of the collection column
                let element_type = if kind.single {
                    kind.output_type
                } else {
                    Some(OutputType::Json)
                };
                merge_kind(
                    &mut self.kinds,
                    path.replace_last_with_star(),
                    OutputKind::collection(element_type),
                );
            }
            merge_kind(&mut self.kinds, path.clone(), kind);
            self.observed.insert(path);
        }
    }

    /// Parse and add one document from text.
    pub fn add_text(&mut self, text: &str) -> Result<()> {
        let document = self.model.parse(text)?;
        self.add_value(&document);
        Ok(())
    }

    /// Add documents until exhausted or until `cancel` is raised. The flag
    /// is only checked between documents.
    pub fn add_all_cancellable<'a, I>(&mut self, documents: I, cancel: &AtomicBool) -> Result<()>
    where
        I: IntoIterator<Item = &'a M::Document>,
        M::Document: 'a,
    {
        for (processed, document) in documents.into_iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled { processed });
            }
            self.add_value(document);
        }
        Ok(())
    }

    /// Fold another builder's observations into this one. Union and kind
    /// merge are associative and commutative, so partial builders can be
    /// combined in any order.
    pub fn merge(&mut self, other: SchemaBuilder<M>) {
        self.observed.extend(other.observed);
        for (path, kind) in other.kinds {
            merge_kind(&mut self.kinds, path, kind);
        }
        self.root_scalar = match (self.root_scalar, other.root_scalar) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, None) => a,
            (None, b) => b,
        };
        self.saw_structured_root |= other.saw_structured_root;
        self.sample_count += other.sample_count;
    }

    /// Filter the observations into the final column set.
    pub fn build(&self, config: &InferenceConfig) -> Schema {
        let paths = select_paths(&self.observed, config.selection, config.arrays);

        if paths.is_empty() {
            let kind = match self.root_scalar {
                Some(kind) if !self.saw_structured_root => kind,
                _ => {
                    log::debug!("No columns selected; falling back to the document root");
                    OutputKind::single(Some(OutputType::Json))
                }
            };
            let name = super::column_name(&Path::root(), &config.naming);
            return Schema::new(vec![Column::new(name, Path::root(), kind)]);
        }

        let names = name_columns(&paths, &config.naming);
        let columns: Vec<Column> = paths
            .into_iter()
            .zip(names)
            .map(|(path, name)| {
                let kind = self
                    .kinds
                    .get(&path)
                    .copied()
                    .unwrap_or(OutputKind::single(None));
                Column::new(name, path, kind)
            })
            .collect();

        log::info!(
            "Inferred {} columns from {} documents ({} distinct paths)",
            columns.len(),
            self.sample_count,
            self.observed.len()
        );
        Schema::new(columns)
    }
}

fn merge_kind(kinds: &mut BTreeMap<Path, OutputKind>, path: Path, kind: OutputKind) {
    kinds
        .entry(path)
        .and_modify(|existing| *existing = existing.merge(kind))
        .or_insert(kind);
}

/// Infer a schema from example documents with the `serde_json` model
pub fn infer_schema(examples: &[Value], config: &InferenceConfig) -> Schema {
    let mut builder = SchemaBuilder::new();
    for example in examples {
        builder.add_value(example);
    }
    builder.build(config)
}
