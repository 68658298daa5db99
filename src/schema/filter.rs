//! Column filtering
//!
//! Reduces the set of observed concrete paths to the set of column paths,
//! following the array-handling and selection policy.

use super::{ArrayHandling, ColumnSelection};
use crate::path::Path;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Bound::{Excluded, Unbounded};

/// Select the column paths from `observed`.
///
/// The result depends only on the inputs, so filtering the same observations
/// twice yields the same columns.
pub fn select_paths(
    observed: &BTreeSet<Path>,
    selection: ColumnSelection,
    arrays: ArrayHandling,
) -> BTreeSet<Path> {
    let candidates = match arrays {
        ArrayHandling::Collection => collapse_arrays(observed.iter()),
        ArrayHandling::Expand => observed.iter().cloned().collect(),
    };

    let retained = match selection {
        ColumnSelection::LeavesOnly => LeafFilter::new(observed).retain(candidates),
        ColumnSelection::MaxDepth(max_depth) => candidates
            .into_iter()
            .filter(|p| p.depth() < max_depth)
            .collect(),
    };

    drop_redundant_stars(retained)
}

/// Replace a trailing concrete index by a star, dropping duplicates and
/// keeping first-seen order.
pub fn collapse_arrays<'a, I>(paths: I) -> Vec<Path>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for path in paths {
        let candidate = if path.ends_with_index() {
            path.replace_last_with_star()
        } else {
            path.clone()
        };
        if seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    }
    out
}

/// A star column is redundant when its array column is retained as well.
fn drop_redundant_stars(retained: BTreeSet<Path>) -> BTreeSet<Path> {
    let redundant: Vec<Path> = retained
        .iter()
        .filter(|p| p.ends_with_star())
        .filter(|p| p.parent().map_or(false, |parent| retained.contains(&parent)))
        .cloned()
        .collect();
    let mut retained = retained;
    for path in redundant {
        log::debug!("Dropping {}: its array is already a column", path);
        retained.remove(&path);
    }
    retained
}

/// Leaves-only selection over one set of observations.
struct LeafFilter<'a> {
    observed: &'a BTreeSet<Path>,
    /// Observed paths grouped by their array-sibling key.
    siblings: BTreeMap<Path, Vec<&'a Path>>,
}

impl<'a> LeafFilter<'a> {
    fn new(observed: &'a BTreeSet<Path>) -> Self {
        let mut siblings: BTreeMap<Path, Vec<&'a Path>> = BTreeMap::new();
        for path in observed {
            siblings.entry(path.last_index_to_star()).or_default().push(path);
        }
        LeafFilter { observed, siblings }
    }

    /// Whether `path` has an observed strict descendant. Descendants sort
    /// directly after their ancestor, so the next observed path decides.
    fn has_descendant(&self, path: &Path) -> bool {
        self.observed
            .range::<Path, _>((Excluded(path), Unbounded))
            .next()
            .map_or(false, |next| next.descends_from(path))
    }

    /// True when no member of `path`'s sibling group was ever terminal.
    fn never_terminal(&self, path: &Path) -> bool {
        // A collapsed path already is its group key; its earlier indexes stay concrete
        let key = if path.ends_with_star() {
            path.clone()
        } else {
            path.last_index_to_star()
        };
        match self.siblings.get(&key) {
            Some(group) => group.iter().all(|member| self.has_descendant(member)),
            None => false,
        }
    }

    fn retain(&self, candidates: Vec<Path>) -> BTreeSet<Path> {
        let ordered: BTreeSet<Path> = candidates.into_iter().collect();
        let mut retained: BTreeSet<Path> = BTreeSet::new();

        for path in ordered {
            let lower = retained.range::<Path, _>(..&path).next_back().cloned();
            if let Some(lower) = lower {
                if path.descends_from(&lower) && self.never_terminal(&lower) {
                    log::debug!("Evicting {}: never a leaf below {}", lower, path);
                    retained.remove(&lower);
                }
            }

            let covered_above = retained
                .range::<Path, _>((Excluded(&path), Unbounded))
                .next()
                .map_or(false, |higher| higher.descends_from(&path));
            if covered_above || self.covered_before_star(&retained, &path) {
                continue;
            }
            retained.insert(path);
        }

        retained
    }

    /// Stars sort after the concrete indexes they stand for, so a star path
    /// can arrive after its own descendants were retained.
    fn covered_before_star(&self, retained: &BTreeSet<Path>, path: &Path) -> bool {
        if !path.ends_with_star() || !self.never_terminal(path) {
            return false;
        }
        let Some(parent) = path.parent() else {
            return false;
        };
        retained
            .range::<Path, _>(&parent..)
            .take_while(|r| r.starts_with(&parent))
            .any(|r| r.descends_from(path))
    }
}
