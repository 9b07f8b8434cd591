//! Ancestor-first ordering of the classes to bind.
//!
//! The annotated classes are extended with every entity or mapped superclass found on their
//! superclass chains (plain classes are walked past), then placed so that every modeled
//! ancestor precedes its descendants. Mapped superclasses get their [`SharedAncestor`]
//! description built once, keyed by class name.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::error::BindError;
use crate::model::SharedAncestor;
use crate::source::{ClassDescriptor, ClassKind, MappingSource};

/// Classes in binding order and the shared ancestors among them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyOrder {
    /// Class names, every modeled ancestor before its descendants.
    pub classes: Vec<String>,
    /// Shared ancestors by class name.
    pub shared_ancestors: BTreeMap<String, SharedAncestor>,
}

impl HierarchyOrder {
    /// Position of a class in the order.
    pub fn position(&self, class_name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == class_name)
    }
}

/// Orders classes for binding.
pub struct HierarchyOrderer;

impl HierarchyOrderer {
    /// Order the annotated classes of `source` and their modeled ancestors.
    pub fn order(source: &MappingSource) -> Result<HierarchyOrder, BindError> {
        let mut working: Vec<String> = Vec::new();
        let mut in_working: HashSet<String> = HashSet::new();

        for class_name in source.annotated_classes() {
            let class = source
                .class(class_name)
                .ok_or_else(|| BindError::UnknownEntity {
                    path: class_name.to_string(),
                    target: class_name.to_string(),
                })?;
            if !class.is_modeled() {
                continue;
            }
            if in_working.insert(class.class_name.clone()) {
                working.push(class.class_name.clone());
            }
            for ancestor in modeled_ancestors(source, class)? {
                if in_working.insert(ancestor.class_name.clone()) {
                    working.push(ancestor.class_name.clone());
                }
            }
        }

        let mut order = HierarchyOrder::default();
        let mut placed: HashSet<String> = HashSet::new();
        for class_name in &working {
            if placed.contains(class_name) {
                continue;
            }
            let Some(class) = source.class(class_name) else {
                continue;
            };
            // Ancestors come back nearest first; place them from the top down.
            let mut chain = modeled_ancestors(source, class)?;
            chain.reverse();
            chain.push(class);
            for member in chain {
                if placed.insert(member.class_name.clone()) {
                    order.classes.push(member.class_name.clone());
                }
            }
        }

        for class_name in &order.classes {
            let Some(class) = source.class(class_name) else {
                continue;
            };
            if class.kind == ClassKind::MappedSuperclass {
                shared_ancestor(source, class, &mut order.shared_ancestors)?;
            }
        }

        debug!(
            classes = order.classes.len(),
            shared_ancestors = order.shared_ancestors.len(),
            "ordered class hierarchy"
        );
        Ok(order)
    }
}

/// Modeled ancestors of a class, nearest first. Plain and unknown classes are walked past.
pub(crate) fn modeled_ancestors<'a>(
    source: &'a MappingSource,
    class: &'a ClassDescriptor,
) -> Result<Vec<&'a ClassDescriptor>, BindError> {
    let mut ancestors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(class.class_name.as_str());
    let mut next = class.superclass.as_deref();
    while let Some(name) = next {
        if !seen.insert(name) {
            return Err(BindError::CyclicHierarchy {
                class_name: name.to_string(),
            });
        }
        let Some(ancestor) = source.class(name) else {
            break;
        };
        if ancestor.is_modeled() {
            ancestors.push(ancestor);
        }
        next = ancestor.superclass.as_deref();
    }
    Ok(ancestors)
}

/// Build (or reuse) the shared ancestor of a mapped superclass, its own super-ancestor first.
fn shared_ancestor(
    source: &MappingSource,
    class: &ClassDescriptor,
    cache: &mut BTreeMap<String, SharedAncestor>,
) -> Result<(), BindError> {
    if cache.contains_key(&class.class_name) {
        return Ok(());
    }
    let ancestors = modeled_ancestors(source, class)?;
    let super_ancestor = ancestors
        .first()
        .copied()
        .filter(|a| a.kind == ClassKind::MappedSuperclass);
    if let Some(parent) = super_ancestor {
        shared_ancestor(source, parent, cache)?;
    }
    let super_entity = ancestors
        .iter()
        .find(|a| a.is_entity())
        .map(|a| a.entity_name());

    cache.insert(
        class.class_name.clone(),
        SharedAncestor {
            class_name: class.class_name.clone(),
            super_ancestor: super_ancestor.map(|a| a.class_name.clone()),
            super_entity,
            properties: class.properties.iter().map(|p| p.name.clone()).collect(),
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &HierarchyOrder, class: &str) -> usize {
        order.position(class).unwrap()
    }

    #[test]
    fn test_ancestors_precede_descendants() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("Cat").extends("Animal"))
            .with_class(ClassDescriptor::entity("Lion").extends("Cat"))
            .with_class(ClassDescriptor::entity("Animal"))
            .with_annotated("Lion")
            .with_annotated("Cat")
            .with_annotated("Animal");

        let order = HierarchyOrderer::order(&source).unwrap();
        assert_eq!(order.classes, vec!["Animal", "Cat", "Lion"]);
    }

    #[test]
    fn test_implicit_ancestors_are_inserted() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::mapped_superclass("Base"))
            .with_class(ClassDescriptor::plain("Helper").extends("Base"))
            .with_class(ClassDescriptor::entity("Order").extends("Helper"))
            .with_annotated("Order");

        let order = HierarchyOrderer::order(&source).unwrap();
        assert_eq!(order.classes, vec!["Base", "Order"]);
        assert!(order.shared_ancestors.contains_key("Base"));
    }

    #[test]
    fn test_each_class_placed_once() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("Root"))
            .with_class(ClassDescriptor::entity("A").extends("Root"))
            .with_class(ClassDescriptor::entity("B").extends("Root"))
            .with_class(ClassDescriptor::entity("C").extends("A"));

        let order = HierarchyOrderer::order(&source).unwrap();
        assert_eq!(order.classes.len(), 4);
        assert!(position(&order, "Root") < position(&order, "A"));
        assert!(position(&order, "Root") < position(&order, "B"));
        assert!(position(&order, "A") < position(&order, "C"));
    }

    #[test]
    fn test_shared_ancestor_chain() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("Party"))
            .with_class(ClassDescriptor::mapped_superclass("Audited").extends("Party"))
            .with_class(ClassDescriptor::mapped_superclass("Named").extends("Audited"))
            .with_class(ClassDescriptor::entity("Person").extends("Named"));

        let order = HierarchyOrderer::order(&source).unwrap();
        let named = &order.shared_ancestors["Named"];
        assert_eq!(named.super_ancestor.as_deref(), Some("Audited"));
        assert_eq!(named.super_entity.as_deref(), Some("Party"));
        let audited = &order.shared_ancestors["Audited"];
        assert_eq!(audited.super_ancestor, None);
        assert_eq!(order.shared_ancestors.len(), 2);
    }

    #[test]
    fn test_unknown_annotated_class() {
        let source = MappingSource::new().with_annotated("Ghost");
        let err = HierarchyOrderer::order(&source).unwrap_err();
        assert!(matches!(err, BindError::UnknownEntity { .. }));
    }

    #[test]
    fn test_cyclic_superclass_chain() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("A").extends("B"))
            .with_class(ClassDescriptor::entity("B").extends("A"));
        let err = HierarchyOrderer::order(&source).unwrap_err();
        assert!(matches!(err, BindError::CyclicHierarchy { .. }));
    }
}
