//! Circular dependency detection for computed columns.
//!
//! An accidental cycle between two computed columns would make change
//! propagation walk forever for any row that touches it, so cyclic column
//! sets are rejected when the dependency graph is rebuilt. Uses
//! depth-first search over column names.

use std::collections::{HashMap, HashSet};

use super::column::ColumnDef;

/// Detect a cycle among the computed columns of a column set.
/// Returns Some(cycle_path) of column names if a cycle is found.
pub fn detect_cycle(columns: &[ColumnDef]) -> Option<Vec<String>> {
    // Edges: referenced column name -> dependent computed column name.
    let mut reads: HashMap<&str, Vec<&str>> = HashMap::new();
    for column in columns {
        reads.insert(column.name.as_str(), column.referenced_names());
    }

    let mut done = HashSet::new();
    for column in columns.iter().filter(|c| c.is_computed()) {
        let mut visiting = HashSet::new();
        let mut path = Vec::new();
        if dfs(&column.name, &reads, &mut visiting, &mut done, &mut path) {
            return Some(path);
        }
    }
    None
}

fn dfs<'a>(
    current: &'a str,
    reads: &HashMap<&str, Vec<&'a str>>,
    visiting: &mut HashSet<&'a str>,
    done: &mut HashSet<&'a str>,
    path: &mut Vec<String>,
) -> bool {
    if visiting.contains(current) {
        path.push(current.to_string());
        return true;
    }
    if done.contains(current) {
        return false;
    }

    // References to columns absent from the set are ignored, same as at
    // argument-build time.
    let Some(deps) = reads.get(current) else {
        return false;
    };

    visiting.insert(current);
    path.push(current.to_string());

    for dep in deps.clone() {
        if dfs(dep, reads, visiting, done, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(current);
    done.insert(current);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ArgBinding, ColumnDef, DataType, FunctionRef};

    fn computed(id: &str, name: &str, refs: &[&str]) -> ColumnDef {
        ColumnDef::computed(
            id,
            name,
            DataType::Number,
            FunctionRef::new("f", 1),
            refs.iter()
                .map(|r| ArgBinding::Column(r.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_no_cycle_in_chain() {
        let columns = vec![
            ColumnDef::plain("a", "a", DataType::Number),
            computed("b", "b", &["a"]),
            computed("c", "c", &["b"]),
        ];
        assert!(detect_cycle(&columns).is_none());
    }

    #[test]
    fn test_detects_two_column_cycle() {
        let columns = vec![computed("x", "x", &["y"]), computed("y", "y", &["x"])];
        let path = detect_cycle(&columns).unwrap();
        assert!(path.len() >= 2);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let columns = vec![computed("x", "x", &["x"])];
        assert!(detect_cycle(&columns).is_some());
    }

    #[test]
    fn test_missing_reference_is_not_a_cycle() {
        let columns = vec![computed("x", "x", &["ghost"])];
        assert!(detect_cycle(&columns).is_none());
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let columns = vec![
            ColumnDef::plain("a", "a", DataType::Number),
            computed("l", "l", &["a"]),
            computed("r", "r", &["a"]),
            computed("z", "z", &["l", "r"]),
        ];
        assert!(detect_cycle(&columns).is_none());
    }
}
