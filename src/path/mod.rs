//! Path algebra
//!
//! A [`Path`] names one location inside a document tree. Paths carry a total
//! order so they can live in ordered sets: all descendants of a path sort
//! directly after it, which is what the leaf filter relies on.

mod parser;

use serde::{Serialize, Serializer};
use std::fmt;

pub use parser::parse_canonical;

/// One step from a node to one of its children.
///
/// The variant order is significant: the derived ordering sorts keys before
/// concrete indexes and concrete indexes before the star.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// An object member (`['name']`).
    Key(String),
    /// A concrete array position (`[0]`).
    Index(usize),
    /// Any array position (`[*]`).
    IndexStar,
}

impl PathSegment {
    pub fn is_index(&self) -> bool {
        matches!(self, PathSegment::Index(_))
    }

    /// True when `self`, read as a pattern, matches `other`.
    fn matches(&self, other: &PathSegment) -> bool {
        match (self, other) {
            (PathSegment::IndexStar, PathSegment::Index(_)) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(name) => {
                f.write_str("['")?;
                for c in name.chars() {
                    if c == '\'' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("']")
            }
            PathSegment::Index(n) => write!(f, "[{}]", n),
            PathSegment::IndexStar => f.write_str("[*]"),
        }
    }
}

/// An immutable location in a document, starting at the root.
///
/// Ordering is lexicographic over segments; a strict prefix sorts before
/// every path that extends it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The document root (`$`).
    pub fn root() -> Self {
        Path::default()
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Path { segments }
    }

    /// Build a path of object keys only.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path {
            segments: keys.into_iter().map(|k| PathSegment::Key(k.into())).collect(),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Structural nesting depth: the number of segments below the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Extend this path by one segment, returning the new path.
    pub fn child(&self, segment: PathSegment) -> Path {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Path { segments }
    }

    pub fn parent(&self) -> Option<Path> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Path {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// True iff `prefix`'s segments are a prefix of this path's segments.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// True iff this path is strictly deeper than `ancestor` and lies below
    /// it, where a star in `ancestor` stands for any concrete index.
    pub fn descends_from(&self, ancestor: &Path) -> bool {
        self.segments.len() > ancestor.segments.len()
            && ancestor
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(a, s)| a.matches(s))
    }

    pub fn ends_with_index(&self) -> bool {
        matches!(self.segments.last(), Some(PathSegment::Index(_)))
    }

    pub fn ends_with_star(&self) -> bool {
        matches!(self.segments.last(), Some(PathSegment::IndexStar))
    }

    pub fn has_star(&self) -> bool {
        self.segments.contains(&PathSegment::IndexStar)
    }

    /// The last segment, whatever it is, becomes a star. No-op on the root.
    pub fn replace_last_with_star(&self) -> Path {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            *last = PathSegment::IndexStar;
        }
        Path { segments }
    }

    /// The rightmost concrete index becomes a star. Paths without an index
    /// come back unchanged.
    pub fn last_index_to_star(&self) -> Path {
        let mut segments = self.segments.clone();
        if let Some(pos) = segments.iter().rposition(PathSegment::is_index) {
            segments[pos] = PathSegment::IndexStar;
        }
        Path { segments }
    }

    /// The last object key on this path, if any.
    pub fn last_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            PathSegment::Key(k) => Some(k.as_str()),
            _ => None,
        })
    }

    /// Render the canonical string (`$['a'][0][*]`).
    pub fn to_canonical_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Path {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_canonical(s)
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
