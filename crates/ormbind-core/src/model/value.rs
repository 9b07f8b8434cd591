//! Property values and the properties that own them.

use std::collections::BTreeMap;

use serde::Serialize;

use super::table::TableId;
use crate::source::{AccessKind, CollectionKind};

/// A mapped column or formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Selectable {
    /// Column name.
    Column(String),
    /// SQL formula.
    Formula(String),
}

impl Selectable {
    /// Column name, if this is a column.
    pub fn column(&self) -> Option<&str> {
        match self {
            Selectable::Column(name) => Some(name),
            Selectable::Formula(_) => None,
        }
    }
}

/// A basic value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimpleValue {
    /// Table holding the columns.
    pub table: TableId,
    /// Mapped columns or formulas.
    pub selectables: Vec<Selectable>,
    /// Type name; a type-definition name until finalized.
    pub type_name: Option<String>,
    /// Type parameters.
    pub type_params: BTreeMap<String, String>,
}

/// A component grouping nested properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    /// Table holding the columns.
    pub table: TableId,
    /// Component class name.
    pub class_name: Option<String>,
    /// Nested properties.
    pub properties: Vec<Property>,
    /// Embedded in the owner rather than a separate object.
    pub embedded: bool,
}

/// Flavor of a to-one association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToOneKind {
    /// Many-to-one.
    ManyToOne,
    /// One-to-one.
    OneToOne,
}

/// A to-one association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToOne {
    /// Table holding the foreign-key columns.
    pub table: TableId,
    /// Foreign-key columns. Empty until resolved, and for inverse one-to-one.
    pub columns: Vec<String>,
    /// Referenced entity.
    pub referenced_entity: String,
    /// Referenced property. The identifier when absent.
    pub referenced_property: Option<String>,
    /// Association flavor.
    pub kind: ToOneKind,
    /// Foreign key constraint name, set once created.
    pub foreign_key: Option<String>,
    /// Whether the foreign-key columns are unique.
    pub unique: bool,
    /// Owning property on the target for an inverse one-to-one.
    pub mapped_by: Option<String>,
    /// Set once the association is fully resolved.
    pub resolved: bool,
}

/// What a collection holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionElement {
    /// Not resolved yet.
    Unresolved,
    /// Basic values in a column.
    Basic {
        /// Element column.
        column: String,
        /// Element type.
        type_name: Option<String>,
    },
    /// Entities referenced through columns of the collection table.
    Entity {
        /// Element entity.
        entity: String,
        /// Element columns.
        columns: Vec<String>,
        /// Elements live in their own table (one-to-many).
        one_to_many: bool,
    },
}

/// A resolved map key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapKey {
    /// Basic value key.
    Basic {
        /// Key column.
        column: String,
    },
    /// Entity key.
    Entity {
        /// Key entity.
        entity: String,
        /// Key columns.
        columns: Vec<String>,
    },
}

/// A collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    /// Role (`Entity.property`).
    pub role: String,
    /// Collection semantics.
    pub kind: CollectionKind,
    /// Collection table, set once resolved.
    pub table: Option<TableId>,
    /// Columns referencing the owner.
    pub key_columns: Vec<String>,
    /// Elements.
    pub element: CollectionElement,
    /// Managed by the other side.
    pub inverse: bool,
    /// Owning property on the element entity.
    pub mapped_by: Option<String>,
    /// List index columns.
    pub index_columns: Vec<String>,
    /// Map key.
    pub map_key: Option<MapKey>,
    /// Owner property referenced by the key. The identifier when absent.
    pub referenced_property: Option<String>,
}

impl Collection {
    /// Check if the collection has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.table.is_some()
    }
}

/// A polymorphic any-association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnyValue {
    /// Table holding the columns.
    pub table: TableId,
    /// Column holding the entity type.
    pub meta_column: String,
    /// Columns holding the identifier.
    pub id_columns: Vec<String>,
    /// Identifier type.
    pub id_type: Option<String>,
}

/// What a property maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Value {
    /// Basic value.
    Simple(SimpleValue),
    /// Component.
    Component(Component),
    /// To-one association.
    ToOne(ToOne),
    /// Collection.
    Collection(Collection),
    /// Any-association.
    Any(AnyValue),
}

impl Value {
    /// Table holding the value's columns, when it has one.
    pub fn table(&self) -> Option<TableId> {
        match self {
            Value::Simple(v) => Some(v.table),
            Value::Component(v) => Some(v.table),
            Value::ToOne(v) => Some(v.table),
            Value::Collection(v) => v.table,
            Value::Any(v) => Some(v.table),
        }
    }

    /// Column names held in the owner's table, in order.
    pub fn columns(&self) -> Vec<String> {
        match self {
            Value::Simple(v) => v
                .selectables
                .iter()
                .filter_map(|s| s.column().map(str::to_string))
                .collect(),
            Value::Component(v) => v.properties.iter().flat_map(|p| p.value.columns()).collect(),
            Value::ToOne(v) => v.columns.clone(),
            Value::Collection(_) => Vec::new(),
            Value::Any(v) => {
                let mut columns = vec![v.meta_column.clone()];
                columns.extend(v.id_columns.iter().cloned());
                columns
            }
        }
    }

    /// Count of columns and formulas the value maps.
    pub fn span(&self) -> usize {
        match self {
            Value::Simple(v) => v.selectables.len(),
            other => other.columns().len(),
        }
    }

    /// Check if the value maps exactly one column (no formula, no component).
    pub fn is_single_column(&self) -> bool {
        match self {
            Value::Simple(v) => v.selectables.len() == 1 && v.selectables[0].column().is_some(),
            Value::ToOne(v) => v.columns.len() == 1,
            _ => false,
        }
    }

    /// Identifying to-one associations not resolved yet.
    pub fn has_pending_associations(&self) -> bool {
        match self {
            Value::ToOne(v) => !v.resolved,
            Value::Component(v) => v.properties.iter().any(|p| p.value.has_pending_associations()),
            _ => false,
        }
    }

    /// Navigate nested components by property names.
    pub fn navigate_mut(&mut self, path: &[String]) -> Option<&mut Value> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => match self {
                Value::Component(component) => component
                    .properties
                    .iter_mut()
                    .find(|p| &p.name == head)?
                    .value
                    .navigate_mut(rest),
                _ => None,
            },
        }
    }

    /// Read-only counterpart of [`Value::navigate_mut`].
    pub fn navigate(&self, path: &[String]) -> Option<&Value> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => match self {
                Value::Component(component) => component
                    .properties
                    .iter()
                    .find(|p| &p.name == head)?
                    .value
                    .navigate(rest),
                _ => None,
            },
        }
    }

    /// Visit every basic value, depth first.
    pub fn for_each_simple_mut(&mut self, f: &mut dyn FnMut(&mut SimpleValue)) {
        match self {
            Value::Simple(v) => f(v),
            Value::Component(v) => {
                for property in &mut v.properties {
                    property.value.for_each_simple_mut(f);
                }
            }
            _ => {}
        }
    }
}

/// A named property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Access kind.
    pub access: AccessKind,
    /// Included in inserts.
    pub insertable: bool,
    /// Included in updates.
    pub updatable: bool,
    /// Accepts null.
    pub optional: bool,
    /// Mapped value.
    pub value: Value,
    /// Cascaded operations.
    pub cascade: Vec<String>,
    /// Derived by the engine rather than declared.
    pub synthetic: bool,
    /// Referenced by a unique property reference.
    pub alternate_unique_key: bool,
}

impl Property {
    /// Create a declared, updatable property.
    pub fn new(name: impl Into<String>, access: AccessKind, value: Value) -> Self {
        Self {
            name: name.into(),
            access,
            insertable: true,
            updatable: true,
            optional: true,
            value,
            cascade: Vec::new(),
            synthetic: false,
            alternate_unique_key: false,
        }
    }

    /// Shallow copy that the runtime never writes.
    pub fn read_only_copy(&self) -> Self {
        Self {
            insertable: false,
            updatable: false,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(table: usize, column: &str) -> Value {
        Value::Simple(SimpleValue {
            table: TableId(table),
            selectables: vec![Selectable::Column(column.to_string())],
            type_name: Some("string".to_string()),
            type_params: BTreeMap::new(),
        })
    }

    #[test]
    fn test_component_columns_and_navigation() {
        let mut value = Value::Component(Component {
            table: TableId(0),
            class_name: None,
            properties: vec![
                Property::new("street", AccessKind::Field, simple(0, "street")),
                Property::new("zip", AccessKind::Field, simple(0, "zip")),
            ],
            embedded: true,
        });
        assert_eq!(value.columns(), vec!["street".to_string(), "zip".to_string()]);
        assert!(!value.is_single_column());

        let zip = value.navigate_mut(&["zip".to_string()]).unwrap();
        assert!(zip.is_single_column());
        assert!(value.navigate(&["missing".to_string()]).is_none());
    }

    #[test]
    fn test_formula_is_not_single_column() {
        let value = Value::Simple(SimpleValue {
            table: TableId(0),
            selectables: vec![Selectable::Formula("upper(name)".to_string())],
            type_name: None,
            type_params: BTreeMap::new(),
        });
        assert!(!value.is_single_column());
        assert_eq!(value.span(), 1);
        assert!(value.columns().is_empty());
    }

    #[test]
    fn test_read_only_copy() {
        let prop = Property::new("code", AccessKind::Field, simple(0, "code"));
        let copy = prop.read_only_copy();
        assert!(!copy.insertable);
        assert!(!copy.updatable);
        assert_eq!(copy.value, prop.value);
    }
}
