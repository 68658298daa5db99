//! Document model adapters
//!
//! The engine never walks documents itself. Everything it needs from the
//! document representation goes through [`DocumentModel`]: enumerating every
//! concrete path, resolving one path, and classifying scalars.

use crate::error::Result;
use crate::path::{Path, PathSegment};
use crate::types::{kind_of, OutputKind, OutputType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static BASE64_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$").unwrap()
});

/// True when `s` is well-formed, padded base64 text.
pub fn is_base64(s: &str) -> bool {
    BASE64_REGEX.is_match(s)
}

/// Capability interface the inference engine needs from a document model
///
/// Documents stay in the model's own representation. Only resolved values
/// cross over into `serde_json::Value`, which is what projection coerces
/// into cells.
pub trait DocumentModel {
    /// The model's node type. A document is its root node.
    type Document;

    /// Parse one document from text.
    fn parse(&self, text: &str) -> Result<Self::Document>;

    /// Every concrete path below the root together with its node, in
    /// document order. The root itself is not listed.
    fn enumerate<'a>(&self, document: &'a Self::Document) -> Vec<(Path, &'a Self::Document)>;

    /// Resolve `path` against `document`. `None` means not found.
    ///
    /// A path containing a star resolves to the array of every match, as long
    /// as the node before the first star exists.
    fn evaluate(&self, document: &Self::Document, path: &Path) -> Option<Value>;

    /// Type of a scalar node, `None` for null.
    fn scalar_type(&self, node: &Self::Document) -> Option<OutputType>;

    /// Kind of a node: objects are single `Json`, arrays unify their elements.
    fn kind_of(&self, node: &Self::Document) -> OutputKind;

    /// True for object and array nodes.
    fn is_container(&self, node: &Self::Document) -> bool;

    fn is_null(&self, node: &Self::Document) -> bool;

    /// True when the document root is a scalar (not null, object or array).
    fn is_scalar_root(&self, document: &Self::Document) -> bool {
        !self.is_null(document) && !self.is_container(document)
    }
}

/// `serde_json` backed document model
#[derive(Debug, Clone, Default)]
pub struct JsonModel {
    /// Classify well-formed base64 strings as `Base64` instead of `String`.
    pub detect_base64: bool,
}

impl JsonModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base64_detection(mut self, enabled: bool) -> Self {
        self.detect_base64 = enabled;
        self
    }

    fn walk<'a>(value: &'a Value, path: &Path, out: &mut Vec<(Path, &'a Value)>) {
        match value {
            Value::Object(obj) => {
                for (key, child) in obj.iter() {
                    let child_path = path.child(PathSegment::Key(key.clone()));
                    out.push((child_path.clone(), child));
                    Self::walk(child, &child_path, out);
                }
            }
            Value::Array(arr) => {
                for (idx, child) in arr.iter().enumerate() {
                    let child_path = path.child(PathSegment::Index(idx));
                    out.push((child_path.clone(), child));
                    Self::walk(child, &child_path, out);
                }
            }
            _ => {}
        }
    }

    fn step<'a>(value: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
        match (segment, value) {
            (PathSegment::Key(k), Value::Object(obj)) => obj.get(k),
            (PathSegment::Index(i), Value::Array(arr)) => arr.get(*i),
            _ => None,
        }
    }

    fn collect<'a>(value: &'a Value, segments: &[PathSegment], out: &mut Vec<&'a Value>) {
        let Some((first, rest)) = segments.split_first() else {
            out.push(value);
            return;
        };
        match first {
            PathSegment::IndexStar => {
                if let Value::Array(arr) = value {
                    for item in arr {
                        Self::collect(item, rest, out);
                    }
                }
            }
            segment => {
                if let Some(next) = Self::step(value, segment) {
                    Self::collect(next, rest, out);
                }
            }
        }
    }
}

impl DocumentModel for JsonModel {
    type Document = Value;

    fn parse(&self, text: &str) -> Result<Value> {
        Ok(serde_json::from_str(text)?)
    }

    fn enumerate<'a>(&self, document: &'a Value) -> Vec<(Path, &'a Value)> {
        let mut out = Vec::new();
        Self::walk(document, &Path::root(), &mut out);
        out
    }

    fn evaluate(&self, document: &Value, path: &Path) -> Option<Value> {
        let segments = path.segments();
        let Some(star) = segments.iter().position(|s| *s == PathSegment::IndexStar) else {
            let mut node = document;
            for segment in segments {
                node = Self::step(node, segment)?;
            }
            return Some(node.clone());
        };

        let mut node = document;
        for segment in &segments[..star] {
            node = Self::step(node, segment)?;
        }
        if !node.is_array() {
            return None;
        }
        let mut matches = Vec::new();
        Self::collect(node, &segments[star..], &mut matches);
        Some(Value::Array(matches.into_iter().cloned().collect()))
    }

    fn scalar_type(&self, value: &Value) -> Option<OutputType> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(OutputType::Boolean),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    if i32::try_from(i).is_ok() {
                        Some(OutputType::Integer)
                    } else {
                        Some(OutputType::Long)
                    }
                } else {
                    // u64 beyond i64 or a float
                    Some(OutputType::Double)
                }
            }
            Value::String(s) => {
                if self.detect_base64 && !s.is_empty() && is_base64(s) {
                    Some(OutputType::Base64)
                } else {
                    Some(OutputType::String)
                }
            }
            Value::Array(_) | Value::Object(_) => Some(OutputType::Json),
        }
    }

    fn kind_of(&self, node: &Value) -> OutputKind {
        kind_of(node, &|v: &Value| self.scalar_type(v))
    }

    fn is_container(&self, node: &Value) -> bool {
        matches!(node, Value::Object(_) | Value::Array(_))
    }

    fn is_null(&self, node: &Value) -> bool {
        node.is_null()
    }
}
