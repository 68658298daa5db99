use super::ColumnNaming;
use crate::path::{Path, PathSegment};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static UNIQUE_SUFFIX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*) \(#(\d+)\)$").unwrap());

const ROOT_NAME: &str = "$";

/// Derive a column name from a path. Names are not yet unique.
pub fn column_name(path: &Path, naming: &ColumnNaming) -> String {
    if path.is_root() {
        return ROOT_NAME.to_string();
    }
    let name = match naming {
        ColumnNaming::Canonical => return path.to_canonical_string(),
        ColumnNaming::Path { separator } => path
            .segments()
            .iter()
            .filter_map(|s| match s {
                PathSegment::Key(k) => Some(k.clone()),
                PathSegment::Index(i) => Some(i.to_string()),
                PathSegment::IndexStar => None,
            })
            .collect::<Vec<_>>()
            .join(separator),
        ColumnNaming::LeafName => match path.last_key() {
            Some(key) => key.to_string(),
            None => path
                .segments()
                .iter()
                .rev()
                .find_map(|s| match s {
                    PathSegment::Index(i) => Some(i.to_string()),
                    _ => None,
                })
                .unwrap_or_default(),
        },
    };
    if name.is_empty() {
        ROOT_NAME.to_string()
    } else {
        name
    }
}

/// Hands out names, appending ` (#n)` to names already taken.
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, name: String) -> String {
        if self.taken.insert(name.clone()) {
            return name;
        }

        let (base, mut counter) = match UNIQUE_SUFFIX_REGEX.captures(&name) {
            Some(caps) => (
                caps[1].to_string(),
                caps[2].parse::<u64>().map(|n| n + 1).unwrap_or(1),
            ),
            None => (name.clone(), 1),
        };
        loop {
            let candidate = format!("{} (#{})", base, counter);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Name every path, in order, making duplicates unique.
pub fn name_columns<'a, I>(paths: I, naming: &ColumnNaming) -> Vec<String>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut names = UniqueNames::new();
    paths
        .into_iter()
        .map(|p| names.claim(column_name(p, naming)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_canonical;

    fn p(s: &str) -> Path {
        parse_canonical(s).unwrap()
    }

    fn dotted() -> ColumnNaming {
        ColumnNaming::Path { separator: ".".to_string() }
    }

    #[test]
    fn test_path_naming() {
        assert_eq!(column_name(&p("$['a']['b'][*]"), &dotted()), "a.b");
        assert_eq!(column_name(&p("$['a'][2]['c']"), &dotted()), "a.2.c");
        assert_eq!(column_name(&p("$[*]"), &dotted()), "$");
        assert_eq!(column_name(&Path::root(), &dotted()), "$");
    }

    #[test]
    fn test_leaf_naming() {
        assert_eq!(column_name(&p("$['a']['b'][*]"), &ColumnNaming::LeafName), "b");
        assert_eq!(column_name(&p("$[3]"), &ColumnNaming::LeafName), "3");
    }

    #[test]
    fn test_canonical_naming() {
        assert_eq!(column_name(&p("$['a'][0]"), &ColumnNaming::Canonical), "$['a'][0]");
    }

    #[test]
    fn test_duplicate_names_get_suffix() {
        let paths = vec![p("$['x']['id']"), p("$['y']['id']"), p("$['z']['id']")];
        let names = name_columns(&paths, &ColumnNaming::LeafName);
        assert_eq!(names, vec!["id", "id (#1)", "id (#2)"]);
    }

    #[test]
    fn test_suffix_continues_existing_counter() {
        let mut names = UniqueNames::new();
        assert_eq!(names.claim("a (#1)".into()), "a (#1)");
        assert_eq!(names.claim("a (#1)".into()), "a (#2)");
    }
}
