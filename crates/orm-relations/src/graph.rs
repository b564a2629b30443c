//! Cycle detection over the table dependency graph. Circular
//! dependencies are rejected, including self-edges.
//!
//! Only `one`-cardinality ("belongs to") edges are treated as dependency
//! edges: a `many` edge's inverse `one` edge already expresses the same
//! dependency in the other direction, so counting both would make every
//! bidirectional relation pair look like a 2-cycle. This is the
//! interpretation recorded for the otherwise-unspecified "table dependency
//! graph" in `DESIGN.md`.

use std::collections::{BTreeMap, HashSet};

use crate::error::RelationsError;

pub fn detect_cycle(edges: &BTreeMap<String, Vec<String>>) -> Result<(), RelationsError> {
    let mut visited = HashSet::new();
    let mut stack = HashSet::new();

    for start in edges.keys() {
        if !visited.contains(start) {
            let mut path = Vec::new();
            visit(start, edges, &mut visited, &mut stack, &mut path)?;
        }
    }
    Ok(())
}

fn visit(
    node: &str,
    edges: &BTreeMap<String, Vec<String>>,
    visited: &mut HashSet<String>,
    stack: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Result<(), RelationsError> {
    visited.insert(node.to_string());
    stack.insert(node.to_string());
    path.push(node.to_string());

    if let Some(targets) = edges.get(node) {
        for target in targets {
            if target == node {
                return Err(RelationsError::CircularDependency(format!(
                    "{node} -> {node} (self-reference)"
                )));
            }
            if stack.contains(target) {
                path.push(target.clone());
                return Err(RelationsError::CircularDependency(path.join(" -> ")));
            }
            if !visited.contains(target) {
                visit(target, edges, visited, stack, path)?;
            }
        }
    }

    path.pop();
    stack.remove(node);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acyclic_graph_passes() {
        let mut edges = BTreeMap::new();
        edges.insert("posts".to_string(), vec!["users".to_string()]);
        edges.insert("comments".to_string(), vec!["posts".to_string()]);
        assert!(detect_cycle(&edges).is_ok());
    }

    #[test]
    fn self_edge_fails() {
        let mut edges = BTreeMap::new();
        edges.insert("users".to_string(), vec!["users".to_string()]);
        let err = detect_cycle(&edges).unwrap_err();
        assert!(matches!(err, RelationsError::CircularDependency(_)));
    }

    #[test]
    fn two_node_cycle_fails() {
        let mut edges = BTreeMap::new();
        edges.insert("a".to_string(), vec!["b".to_string()]);
        edges.insert("b".to_string(), vec!["a".to_string()]);
        let err = detect_cycle(&edges).unwrap_err();
        assert!(matches!(err, RelationsError::CircularDependency(_)));
    }
}
