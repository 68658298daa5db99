//! Structure compiler
//!
//! Turns separator-delimited names (one per output slot) into a tree of
//! [`StructureNode`]s. The same tree drives both directions: grouping
//! discovered columns into a nested view, and re-nesting flat rows.

use crate::path::Path;
use indexmap::IndexMap;
use std::cmp::Ordering;

pub type Children = IndexMap<String, StructureNode>;

/// A node of the compiled structure
#[derive(Debug, Clone, PartialEq)]
pub enum StructureNode {
    /// An addressable value with nothing below it.
    Leaf { column: usize },
    /// A pure container.
    Branch { children: Children },
    /// Addressable itself and parent of deeper names (`a` next to `a.b`).
    Hybrid { column: usize, children: Children },
}

impl StructureNode {
    fn empty_branch() -> Self {
        StructureNode::Branch { children: Children::new() }
    }

    pub fn column(&self) -> Option<usize> {
        match self {
            StructureNode::Leaf { column } | StructureNode::Hybrid { column, .. } => Some(*column),
            StructureNode::Branch { .. } => None,
        }
    }

    pub fn children(&self) -> Option<&Children> {
        match self {
            StructureNode::Branch { children } | StructureNode::Hybrid { children, .. } => {
                Some(children)
            }
            StructureNode::Leaf { .. } => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&StructureNode> {
        self.children().and_then(|c| c.get(name))
    }

    /// Every column slot below and including this node, in tree order.
    pub fn columns(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut Vec<usize>) {
        if let Some(column) = self.column() {
            out.push(column);
        }
        if let Some(children) = self.children() {
            for child in children.values() {
                child.collect_columns(out);
            }
        }
    }

    /// Children map, upgrading a leaf to a hybrid on the way.
    fn children_mut(&mut self) -> &mut Children {
        if let StructureNode::Leaf { column } = *self {
            *self = StructureNode::Hybrid { column, children: Children::new() };
        }
        match self {
            StructureNode::Branch { children } | StructureNode::Hybrid { children, .. } => children,
            StructureNode::Leaf { .. } => unreachable!("leaf upgraded above"),
        }
    }

    /// Make this node addressable. A second column for the same name is
    /// ignored; the first one wins.
    fn attach_column(&mut self, slot: usize) {
        match self {
            StructureNode::Branch { children } => {
                let children = std::mem::take(children);
                *self = StructureNode::Hybrid { column: slot, children };
            }
            StructureNode::Leaf { column } | StructureNode::Hybrid { column, .. } => {
                log::warn!(
                    "Duplicate structure name for column {}; keeping column {}",
                    slot,
                    column
                );
            }
        }
    }
}

/// Split a name into path segments, keeping empty and trailing segments.
pub fn split_name(name: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return vec![name.to_string()];
    }
    name.split(separator).map(str::to_string).collect()
}

/// Path order over key-only segment lists, with empty lists last.
fn compare_segments(a: &[String], b: &[String]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => Path::from_keys(a.iter().cloned()).cmp(&Path::from_keys(b.iter().cloned())),
    }
}

/// Compile names into a structure tree. The slot of each name is its
/// position in `names`.
pub fn compile<S: AsRef<str>>(names: &[S], separator: &str) -> StructureNode {
    compile_slots(
        names.iter().enumerate().map(|(slot, name)| (name.as_ref(), slot)),
        separator,
    )
}

/// Compile `(name, slot)` pairs into a structure tree rooted at a branch.
///
/// Children keep the sorted order of the names, so the output field order
/// does not depend on input order.
pub fn compile_slots<'a, I>(entries: I, separator: &str) -> StructureNode
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let mut pairs: Vec<(Vec<String>, usize)> = entries
        .into_iter()
        .map(|(name, slot)| (split_name(name, separator), slot))
        .collect();
    pairs.sort_by(|a, b| compare_segments(&a.0, &b.0));

    let mut root = StructureNode::empty_branch();
    for (segments, slot) in pairs {
        insert(&mut root, &segments, slot);
    }
    root
}

fn insert(node: &mut StructureNode, segments: &[String], slot: usize) {
    let Some((head, rest)) = segments.split_first() else {
        node.attach_column(slot);
        return;
    };
    let children = node.children_mut();
    if rest.is_empty() && !children.contains_key(head) {
        children.insert(head.clone(), StructureNode::Leaf { column: slot });
        return;
    }
    let child = children
        .entry(head.clone())
        .or_insert_with(StructureNode::empty_branch);
    insert(child, rest, slot);
}
