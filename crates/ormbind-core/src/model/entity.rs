//! Entities, identifiers and shared ancestors.

use std::collections::BTreeMap;

use serde::Serialize;

use super::table::TableId;
use super::value::{Property, Selectable, Value};

/// Position of an entity in its inheritance hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Top of a hierarchy; owns the identifier.
    Root,
    /// Shares the root's table.
    SingleTableChild,
    /// Owns a table joined to its parent's by primary key.
    JoinedChild,
    /// Owns a denormalized table repeating its parent's columns.
    UnionChild,
}

/// Resolved id-generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratorSettings {
    /// Strategy name.
    pub strategy: String,
    /// Generator parameters.
    pub params: BTreeMap<String, String>,
}

/// An entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    /// Identifier property name. Absent for an id-class identifier.
    pub property: Option<String>,
    /// Identifier value.
    pub value: Value,
    /// The value is an embedded component.
    pub embedded: bool,
    /// Id class of a composite identifier.
    pub id_class: Option<String>,
    /// Generator settings.
    pub generator: GeneratorSettings,
    /// Value marking an unsaved instance.
    pub unsaved_value: Option<String>,
}

impl Identifier {
    /// Identifier column names.
    pub fn columns(&self) -> Vec<String> {
        self.value.columns()
    }
}

/// A discriminator column or formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discriminator {
    /// Column or formula.
    pub selectable: Selectable,
    /// Discriminator type.
    pub type_name: String,
    /// Restrict loaded rows to known values.
    pub force: bool,
}

/// A secondary table joined to the entity's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Join {
    /// Secondary table.
    pub table: TableId,
    /// Key columns in the secondary table, set once finalized.
    pub key_columns: Vec<String>,
}

/// A non-entity ancestor contributing shared properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedAncestor {
    /// Class name.
    pub class_name: String,
    /// Nearest shared ancestor above this one.
    pub super_ancestor: Option<String>,
    /// Nearest entity above this one.
    pub super_entity: Option<String>,
    /// Declared property names.
    pub properties: Vec<String>,
}

/// A bound entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    /// Entity name.
    pub name: String,
    /// Class name.
    pub class_name: String,
    /// Position in the hierarchy.
    pub kind: EntityKind,
    /// Parent entity.
    pub super_entity: Option<String>,
    /// Nearest shared ancestor below the parent entity.
    pub shared_ancestor: Option<String>,
    /// Table holding the entity's own columns.
    pub table: TableId,
    /// Secondary tables.
    pub joins: Vec<Join>,
    /// Properties in declaration order (inherited shared-ancestor properties first).
    pub properties: Vec<Property>,
    /// Identifier; set on roots only.
    pub identifier: Option<Identifier>,
    /// Key columns of the entity's own table.
    pub key_columns: Vec<String>,
    /// Discriminator; set on single-table roots only.
    pub discriminator: Option<Discriminator>,
    /// Discriminator value.
    pub discriminator_value: Option<String>,
    /// Direct subclasses, in bind order.
    pub subclasses: Vec<String>,
    /// Whether the class is abstract.
    pub is_abstract: bool,
}

impl Entity {
    /// Look up a declared property.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Look up a declared property for modification.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Check if the entity is the root of its hierarchy.
    pub fn is_root(&self) -> bool {
        self.kind == EntityKind::Root
    }

    /// Tables of the entity: its own table, then its secondary tables.
    pub fn tables(&self) -> impl Iterator<Item = TableId> + '_ {
        std::iter::once(self.table).chain(self.joins.iter().map(|j| j.table))
    }

    /// Locate a value by property path, in the identifier or among the properties.
    pub fn value(&self, in_identifier: bool, path: &[String]) -> Option<&Value> {
        if in_identifier {
            let identifier = self.identifier.as_ref()?;
            return match (&identifier.property, path.split_first()) {
                (Some(name), Some((head, rest))) if name == head => identifier.value.navigate(rest),
                _ => identifier.value.navigate(path),
            };
        }
        let (head, rest) = path.split_first()?;
        self.property(head)?.value.navigate(rest)
    }

    /// Locate a value by property path for modification.
    pub fn value_mut(&mut self, in_identifier: bool, path: &[String]) -> Option<&mut Value> {
        if in_identifier {
            let identifier = self.identifier.as_mut()?;
            return match (&identifier.property, path.split_first()) {
                (Some(name), Some((head, rest))) if name == head => {
                    identifier.value.navigate_mut(rest)
                }
                _ => identifier.value.navigate_mut(path),
            };
        }
        let (head, rest) = path.split_first()?;
        self.property_mut(head)?.value.navigate_mut(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::{SimpleValue, ToOne, ToOneKind};
    use crate::source::AccessKind;

    fn entity_with_identifier(identifier: Identifier) -> Entity {
        Entity {
            name: "Order".to_string(),
            class_name: "Order".to_string(),
            kind: EntityKind::Root,
            super_entity: None,
            shared_ancestor: None,
            table: TableId(0),
            joins: Vec::new(),
            properties: vec![Property::new(
                "code",
                AccessKind::Field,
                Value::Simple(SimpleValue {
                    table: TableId(0),
                    selectables: vec![Selectable::Column("code".to_string())],
                    type_name: None,
                    type_params: BTreeMap::new(),
                }),
            )],
            identifier: Some(identifier),
            key_columns: Vec::new(),
            discriminator: None,
            discriminator_value: None,
            subclasses: Vec::new(),
            is_abstract: false,
        }
    }

    #[test]
    fn test_value_lookup_in_identifier() {
        let identifier = Identifier {
            property: Some("customer".to_string()),
            value: Value::ToOne(ToOne {
                table: TableId(0),
                columns: Vec::new(),
                referenced_entity: "Customer".to_string(),
                referenced_property: None,
                kind: ToOneKind::ManyToOne,
                foreign_key: None,
                unique: false,
                mapped_by: None,
                resolved: false,
            }),
            embedded: false,
            id_class: None,
            generator: GeneratorSettings {
                strategy: "assigned".to_string(),
                params: BTreeMap::new(),
            },
            unsaved_value: Some("undefined".to_string()),
        };
        let mut entity = entity_with_identifier(identifier);

        assert!(entity.value(true, &["customer".to_string()]).is_some());
        assert!(entity.value(true, &[]).is_some());
        assert!(entity.identifier.as_ref().unwrap().value.has_pending_associations());

        match entity.value_mut(true, &["customer".to_string()]) {
            Some(Value::ToOne(to_one)) => to_one.resolved = true,
            other => panic!("unexpected value: {:?}", other),
        }
        assert!(!entity.identifier.as_ref().unwrap().value.has_pending_associations());

        assert!(entity.value(false, &["code".to_string()]).is_some());
        assert!(entity.value(false, &["missing".to_string()]).is_none());
    }
}
