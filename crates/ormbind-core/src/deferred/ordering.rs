//! Dependency ordering of identifying foreign-key units.
//!
//! A unit that creates a foreign key from table `D` to table `R` must run after every unit
//! that completes `R`'s primary key, that is every unit whose dependent table is `R`.

use std::collections::{BTreeMap, HashSet};

use tracing::trace;

use crate::error::BindError;

/// Table dependency of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    /// Table holding the foreign-key columns (and whose key the unit completes).
    pub dependent_table: String,
    /// Table the foreign key points at. Unknown when the referenced entity is missing.
    pub referenced_table: Option<String>,
}

impl DependencyNode {
    /// Create a node.
    pub fn new(dependent_table: impl Into<String>, referenced_table: impl Into<String>) -> Self {
        Self {
            dependent_table: dependent_table.into(),
            referenced_table: Some(referenced_table.into()),
        }
    }
}

/// Orders units so that each runs strictly after the units it depends on.
pub struct DependencyOrderer<'a> {
    nodes: &'a [DependencyNode],
    by_dependent: BTreeMap<&'a str, Vec<usize>>,
    placed: HashSet<usize>,
    on_path: Vec<usize>,
    order: Vec<usize>,
}

impl<'a> DependencyOrderer<'a> {
    /// Compute an execution order, as indices into `nodes`.
    ///
    /// Fails with a circularity error naming the table chain when primary-key dependencies
    /// form a cycle.
    pub fn order(nodes: &'a [DependencyNode]) -> Result<Vec<usize>, BindError> {
        let mut by_dependent: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (index, node) in nodes.iter().enumerate() {
            by_dependent
                .entry(node.dependent_table.as_str())
                .or_default()
                .push(index);
        }

        let mut orderer = DependencyOrderer {
            nodes,
            by_dependent,
            placed: HashSet::new(),
            on_path: Vec::new(),
            order: Vec::with_capacity(nodes.len()),
        };
        for index in 0..nodes.len() {
            orderer.visit(index)?;
        }
        Ok(orderer.order)
    }

    fn visit(&mut self, index: usize) -> Result<(), BindError> {
        if self.placed.contains(&index) {
            return Ok(());
        }
        if let Some(position) = self.on_path.iter().position(|&i| i == index) {
            return Err(self.circularity(position));
        }

        self.on_path.push(index);
        let prerequisites = self.nodes[index]
            .referenced_table
            .as_deref()
            .and_then(|table| self.by_dependent.get(table))
            .cloned()
            .unwrap_or_default();
        for prerequisite in prerequisites {
            self.visit(prerequisite)?;
        }
        self.on_path.pop();

        trace!(
            dependent = %self.nodes[index].dependent_table,
            position = self.order.len(),
            "ordered identifying foreign key"
        );
        self.placed.insert(index);
        self.order.push(index);
        Ok(())
    }

    fn circularity(&self, start: usize) -> BindError {
        let mut tables: Vec<String> = self.on_path[start..]
            .iter()
            .map(|&i| self.nodes[i].dependent_table.clone())
            .collect();
        if let Some(first) = tables.first().cloned() {
            tables.push(first);
        }
        BindError::ForeignKeyCircularity { tables }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[usize], index: usize) -> usize {
        order.iter().position(|&i| i == index).unwrap()
    }

    #[test]
    fn test_chain_runs_leaf_first() {
        // A -> B -> C -> D, declared in the worst order.
        let nodes = vec![
            DependencyNode::new("A", "B"),
            DependencyNode::new("B", "C"),
            DependencyNode::new("C", "D"),
        ];
        let order = DependencyOrderer::order(&nodes).unwrap();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn test_each_unit_exactly_once() {
        let nodes = vec![
            DependencyNode::new("A", "B"),
            DependencyNode::new("C", "B"),
            DependencyNode::new("B", "D"),
            DependencyNode::new("E", "A"),
        ];
        let order = DependencyOrderer::order(&nodes).unwrap();
        assert_eq!(order.len(), nodes.len());
        assert!(position(&order, 2) < position(&order, 0));
        assert!(position(&order, 2) < position(&order, 1));
        assert!(position(&order, 0) < position(&order, 3));
    }

    #[test]
    fn test_mutual_dependency_is_circular() {
        let nodes = vec![DependencyNode::new("A", "B"), DependencyNode::new("B", "A")];
        let err = DependencyOrderer::order(&nodes).unwrap_err();
        match err {
            BindError::ForeignKeyCircularity { tables } => {
                assert_eq!(tables, vec!["A", "B", "A"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_is_circular() {
        let nodes = vec![DependencyNode::new("A", "A")];
        assert!(matches!(
            DependencyOrderer::order(&nodes),
            Err(BindError::ForeignKeyCircularity { .. })
        ));
    }

    #[test]
    fn test_unknown_reference_has_no_prerequisites() {
        let nodes = vec![
            DependencyNode {
                dependent_table: "A".to_string(),
                referenced_table: None,
            },
            DependencyNode::new("B", "A"),
        ];
        let order = DependencyOrderer::order(&nodes).unwrap();
        assert_eq!(order, vec![0, 1]);
    }
}
