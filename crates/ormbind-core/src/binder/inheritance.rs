//! Per-class inheritance facts.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::{BindError, BindWarning};
use crate::registry::Registry;
use crate::source::{ClassDescriptor, InheritanceStrategy, MappingSource};

use super::hierarchy::HierarchyOrder;

/// Inheritance facts of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceState {
    /// Class name.
    pub class_name: String,
    /// Strategy of the class's hierarchy. Unset for a mapped superclass with no entity above it.
    pub strategy: Option<InheritanceStrategy>,
    /// The class has an entity ancestor.
    pub has_parents: bool,
    /// The class has more than one direct entity subclass.
    pub has_siblings: bool,
    /// The class has at least one direct entity subclass.
    pub has_subclasses: bool,
    /// The class is an entity.
    pub is_entity: bool,
    /// The class only contributes shared properties (a mapped superclass).
    pub is_abstract_intermediate: bool,
    /// Class name of the nearest entity ancestor.
    pub super_entity: Option<String>,
}

impl InheritanceState {
    /// Check if the class owns a table.
    pub fn has_table(&self) -> bool {
        !self.has_parents || self.strategy != Some(InheritanceStrategy::SingleTable)
    }

    /// Check if the class owns a table denormalized from its parent's.
    pub fn has_denormalized_table(&self) -> bool {
        self.has_parents && self.strategy == Some(InheritanceStrategy::TablePerClass)
    }
}

/// Computes [`InheritanceState`] for every ordered class.
pub struct InheritanceStateCalculator;

impl InheritanceStateCalculator {
    /// Compute the states in hierarchy order.
    ///
    /// A class declaring a strategy that differs from its hierarchy's keeps the hierarchy's
    /// strategy and a [`BindWarning::StrategyConflict`] is recorded.
    pub fn compute(
        order: &HierarchyOrder,
        source: &MappingSource,
        registry: &mut Registry,
    ) -> Result<BTreeMap<String, InheritanceState>, BindError> {
        let mut states: BTreeMap<String, InheritanceState> = BTreeMap::new();

        for class_name in &order.classes {
            let Some(class) = source.class(class_name) else {
                continue;
            };
            let parent = nearest_state(source, class, &states);
            let super_entity = parent.and_then(|p| {
                if p.is_entity {
                    Some(p.class_name.clone())
                } else {
                    p.super_entity.clone()
                }
            });
            let inherited = super_entity
                .as_ref()
                .and_then(|name| states.get(name))
                .and_then(|s| s.strategy)
                .or_else(|| parent.and_then(|p| p.strategy));

            let strategy = match (inherited, class.inheritance) {
                (Some(inherited), Some(declared))
                    if declared != InheritanceStrategy::SingleTable && declared != inherited =>
                {
                    registry.warn(BindWarning::StrategyConflict {
                        class_name: class.class_name.clone(),
                        declared: declared.to_string(),
                        inherited: inherited.to_string(),
                    })?;
                    Some(inherited)
                }
                (Some(inherited), _) => Some(inherited),
                (None, Some(declared)) => Some(declared),
                (None, None) if class.is_entity() => Some(InheritanceStrategy::SingleTable),
                (None, None) => None,
            };

            let state = InheritanceState {
                class_name: class.class_name.clone(),
                strategy,
                has_parents: super_entity.is_some(),
                has_siblings: false,
                has_subclasses: false,
                is_entity: class.is_entity(),
                is_abstract_intermediate: !class.is_entity(),
                super_entity: super_entity.clone(),
            };
            trace!(class = %class.class_name, strategy = ?state.strategy, "inheritance state");

            if state.is_entity {
                if let Some(parent) = super_entity.and_then(|name| states.get_mut(&name)) {
                    if parent.has_subclasses {
                        parent.has_siblings = true;
                    }
                    parent.has_subclasses = true;
                }
            }
            states.insert(class.class_name.clone(), state);
        }

        Ok(states)
    }
}

/// State of the nearest ancestor that already has one.
fn nearest_state<'a>(
    source: &MappingSource,
    class: &ClassDescriptor,
    states: &'a BTreeMap<String, InheritanceState>,
) -> Option<&'a InheritanceState> {
    let mut next = class.superclass.as_deref();
    let mut steps = 0;
    while let Some(name) = next {
        if let Some(state) = states.get(name) {
            return Some(state);
        }
        steps += 1;
        if steps > states.len() + source.classes.len() {
            return None;
        }
        next = source.class(name).and_then(|c| c.superclass.as_deref());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::HierarchyOrderer;
    use crate::config::CompileConfig;

    fn compute(source: &MappingSource) -> (BTreeMap<String, InheritanceState>, Registry) {
        let mut registry = Registry::new(CompileConfig::new());
        let order = HierarchyOrderer::order(source).unwrap();
        let states = InheritanceStateCalculator::compute(&order, source, &mut registry).unwrap();
        (states, registry)
    }

    #[test]
    fn test_entity_defaults_to_single_table() {
        let source = MappingSource::new().with_class(ClassDescriptor::entity("Order"));
        let (states, _) = compute(&source);
        let state = &states["Order"];
        assert_eq!(state.strategy, Some(InheritanceStrategy::SingleTable));
        assert!(!state.has_parents);
        assert!(state.has_table());
        assert!(!state.has_denormalized_table());
    }

    #[test]
    fn test_mapped_superclass_strategy_unset() {
        let source = MappingSource::new().with_class(ClassDescriptor::mapped_superclass("Base"));
        let (states, _) = compute(&source);
        assert_eq!(states["Base"].strategy, None);
        assert!(states["Base"].is_abstract_intermediate);
    }

    #[test]
    fn test_conflicting_child_keeps_parent_strategy() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("A"))
            .with_class(
                ClassDescriptor::entity("B")
                    .extends("A")
                    .with_inheritance(InheritanceStrategy::Joined),
            )
            .with_class(
                ClassDescriptor::entity("C")
                    .extends("B")
                    .with_inheritance(InheritanceStrategy::TablePerClass),
            );
        let (states, registry) = compute(&source);
        for class in ["A", "B", "C"] {
            assert_eq!(states[class].strategy, Some(InheritanceStrategy::SingleTable));
        }
        assert_eq!(registry.warnings().len(), 2);
        assert!(!states["B"].has_table());
    }

    #[test]
    fn test_joined_child_has_table() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("A").with_inheritance(InheritanceStrategy::Joined))
            .with_class(ClassDescriptor::entity("B").extends("A"));
        let (states, registry) = compute(&source);
        assert_eq!(states["B"].strategy, Some(InheritanceStrategy::Joined));
        assert!(states["B"].has_parents);
        assert!(states["B"].has_table());
        assert!(registry.warnings().is_empty());
    }

    #[test]
    fn test_union_child_has_denormalized_table() {
        let source = MappingSource::new()
            .with_class(
                ClassDescriptor::entity("A").with_inheritance(InheritanceStrategy::TablePerClass),
            )
            .with_class(ClassDescriptor::entity("B").extends("A"));
        let (states, _) = compute(&source);
        assert!(states["B"].has_denormalized_table());
        assert!(!states["A"].has_denormalized_table());
    }

    #[test]
    fn test_siblings_recorded_on_entity_ancestor() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("Root"))
            .with_class(ClassDescriptor::mapped_superclass("Mid").extends("Root"))
            .with_class(ClassDescriptor::entity("A").extends("Mid"))
            .with_class(ClassDescriptor::entity("B").extends("Root"));
        let (states, _) = compute(&source);
        let root = &states["Root"];
        assert!(root.has_subclasses);
        assert!(root.has_siblings);
        assert_eq!(states["A"].super_entity.as_deref(), Some("Root"));
        assert_eq!(states["Mid"].strategy, Some(InheritanceStrategy::SingleTable));
    }

    #[test]
    fn test_conflict_is_fatal_in_strict_mode() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("A"))
            .with_class(
                ClassDescriptor::entity("B")
                    .extends("A")
                    .with_inheritance(InheritanceStrategy::Joined),
            );
        let mut registry = Registry::new(CompileConfig::new().strict());
        let order = HierarchyOrderer::order(&source).unwrap();
        let err = InheritanceStateCalculator::compute(&order, &source, &mut registry).unwrap_err();
        assert!(matches!(err, BindError::Strict(BindWarning::StrategyConflict { .. })));
    }
}
