//! Property declarations.

use serde::{Deserialize, Serialize};

/// How the runtime reaches a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    /// Direct field access.
    #[default]
    Field,
    /// Accessor methods.
    Property,
}

/// A declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    /// Column name. Derived from the property name when absent.
    pub name: Option<String>,
    /// Name of the (secondary) table holding the column. Primary table when absent.
    pub table: Option<String>,
    /// SQL type override.
    pub sql_type: Option<String>,
    /// Length for character types.
    pub length: Option<u32>,
    /// Whether the column accepts nulls.
    pub nullable: bool,
    /// Whether the column carries a single-column unique constraint.
    pub unique: bool,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            name: None,
            table: None,
            sql_type: None,
            length: None,
            nullable: true,
            unique: false,
        }
    }
}

impl ColumnSpec {
    /// Create a named column.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Place the column on a secondary table.
    pub fn in_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Mark the column not null.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark the column unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set the SQL type.
    pub fn with_sql_type(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = Some(sql_type.into());
        self
    }

    /// Set the length.
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }
}

/// A join column of an association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinColumnSpec {
    /// Foreign-key column name. Derived when absent.
    pub name: Option<String>,
    /// Referenced column on the target. The target primary key when absent.
    pub referenced_column: Option<String>,
    /// Whether the column accepts nulls.
    pub nullable: bool,
}

impl Default for JoinColumnSpec {
    fn default() -> Self {
        Self {
            name: None,
            referenced_column: None,
            nullable: true,
        }
    }
}

impl JoinColumnSpec {
    /// Create a named join column referencing the target's primary key.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Create a named join column referencing a specific target column.
    pub fn referencing(name: impl Into<String>, referenced_column: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            referenced_column: Some(referenced_column.into()),
            nullable: true,
        }
    }
}

/// Owning or inverse side of a to-one association.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationSpec {
    /// Target entity name.
    pub target: String,
    /// Cascaded operations.
    pub cascade: Vec<String>,
    /// Owning property on the target for an inverse side.
    pub mapped_by: Option<String>,
    /// Join columns. Derived from the target primary key when empty.
    pub join_columns: Vec<JoinColumnSpec>,
    /// Foreign key constraint name.
    pub foreign_key: Option<String>,
    /// Target property referenced instead of the identifier.
    pub referenced_property: Option<String>,
}

impl AssociationSpec {
    /// Create an association to the target entity.
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    /// Set the inverse-side owning property.
    pub fn mapped_by(mut self, property: impl Into<String>) -> Self {
        self.mapped_by = Some(property.into());
        self
    }

    /// Add a join column.
    pub fn with_join_column(mut self, column: JoinColumnSpec) -> Self {
        self.join_columns.push(column);
        self
    }

    /// Add a cascaded operation.
    pub fn with_cascade(mut self, operation: impl Into<String>) -> Self {
        self.cascade.push(operation.into());
        self
    }

    /// Reference a target property instead of the identifier.
    pub fn with_referenced_property(mut self, property: impl Into<String>) -> Self {
        self.referenced_property = Some(property.into());
        self
    }
}

/// Collection semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Unordered, duplicates allowed.
    #[default]
    Bag,
    /// Unordered, unique elements.
    Set,
    /// Ordered by an index column.
    List,
    /// Keyed by a map key.
    Map,
}

/// An explicit join table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinTableSpec {
    /// Table name. Derived from both sides when absent.
    pub name: Option<String>,
    /// Schema qualifier.
    pub schema: Option<String>,
    /// Columns referencing the owner.
    pub join_columns: Vec<JoinColumnSpec>,
    /// Columns referencing the element entity.
    pub inverse_join_columns: Vec<JoinColumnSpec>,
}

impl JoinTableSpec {
    /// Create a named join table.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Map key declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapKeySpec {
    /// Basic value key held in a column.
    Basic {
        /// Key column name.
        column: Option<String>,
        /// Key type name.
        type_name: Option<String>,
    },
    /// Entity key referenced through join columns.
    Entity {
        /// Key entity name.
        target: String,
        /// Key join columns.
        #[serde(default)]
        join_columns: Vec<JoinColumnSpec>,
    },
}

/// A collection-valued property.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSpec {
    /// Element entity for entity collections.
    pub target: Option<String>,
    /// Element type for element collections.
    pub element_type: Option<String>,
    /// Collection semantics.
    pub kind: CollectionKind,
    /// Owning property on the element entity for an inverse side.
    pub mapped_by: Option<String>,
    /// Explicit join (or element) table.
    pub join_table: Option<JoinTableSpec>,
    /// Key join columns held in the element table.
    pub join_columns: Vec<JoinColumnSpec>,
    /// Element column for element collections.
    pub element_column: Option<String>,
    /// Index column for lists.
    pub order_column: Option<String>,
    /// Map key for maps.
    pub map_key: Option<MapKeySpec>,
    /// Cascaded operations.
    pub cascade: Vec<String>,
}

impl CollectionSpec {
    /// Create a collection of entities.
    pub fn of(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Default::default()
        }
    }

    /// Create a collection of basic values.
    pub fn of_elements(element_type: impl Into<String>) -> Self {
        Self {
            element_type: Some(element_type.into()),
            ..Default::default()
        }
    }

    /// Set the collection semantics.
    pub fn with_kind(mut self, kind: CollectionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the inverse-side owning property.
    pub fn mapped_by(mut self, property: impl Into<String>) -> Self {
        self.mapped_by = Some(property.into());
        self
    }

    /// Set the join table.
    pub fn with_join_table(mut self, join_table: JoinTableSpec) -> Self {
        self.join_table = Some(join_table);
        self
    }

    /// Add a key join column held in the element table.
    pub fn with_join_column(mut self, column: JoinColumnSpec) -> Self {
        self.join_columns.push(column);
        self
    }

    /// Set the list index column.
    pub fn with_order_column(mut self, column: impl Into<String>) -> Self {
        self.kind = CollectionKind::List;
        self.order_column = Some(column.into());
        self
    }

    /// Set the map key.
    pub fn with_map_key(mut self, map_key: MapKeySpec) -> Self {
        self.kind = CollectionKind::Map;
        self.map_key = Some(map_key);
        self
    }
}

/// A polymorphic reference held as a type discriminator plus identifier columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnySpec {
    /// Column holding the referenced entity type.
    pub meta_column: Option<String>,
    /// Type of the discriminator column.
    pub meta_type: Option<String>,
    /// Columns holding the referenced identifier.
    pub id_columns: Vec<String>,
    /// Identifier type.
    pub id_type: Option<String>,
}

/// What a property maps to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyKind {
    /// A basic value mapped to columns or a formula.
    #[default]
    Basic,
    /// An embedded component.
    Embedded {
        /// Component class name.
        #[serde(default)]
        class_name: Option<String>,
        /// Component properties.
        #[serde(default)]
        properties: Vec<PropertySpec>,
    },
    /// Many-to-one association.
    ManyToOne(AssociationSpec),
    /// One-to-one association.
    OneToOne(AssociationSpec),
    /// One-to-many collection.
    OneToMany(CollectionSpec),
    /// Many-to-many collection.
    ManyToMany(CollectionSpec),
    /// Collection of basic values.
    ElementCollection(CollectionSpec),
    /// Polymorphic any-association.
    Any(AnySpec),
}

/// A declared property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertySpec {
    /// Property name.
    pub name: String,
    /// Access override. The class default access when absent.
    pub access: Option<AccessKind>,
    /// Basic type name.
    pub type_name: Option<String>,
    /// Mapped columns.
    pub columns: Vec<ColumnSpec>,
    /// SQL formula instead of columns.
    pub formula: Option<String>,
    /// Included in inserts.
    pub insertable: bool,
    /// Included in updates.
    pub updatable: bool,
    /// Accepts null.
    pub optional: bool,
    /// What the property maps to.
    pub kind: PropertyKind,
}

impl Default for PropertySpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            access: None,
            type_name: None,
            columns: Vec::new(),
            formula: None,
            insertable: true,
            updatable: true,
            optional: true,
            kind: PropertyKind::Basic,
        }
    }
}

impl PropertySpec {
    /// Create a basic property.
    pub fn basic(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Some(type_name.into()),
            ..Default::default()
        }
    }

    /// Create an embedded component property.
    pub fn embedded(name: impl Into<String>, properties: Vec<PropertySpec>) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Embedded {
                class_name: None,
                properties,
            },
            ..Default::default()
        }
    }

    /// Create a many-to-one property.
    pub fn many_to_one(name: impl Into<String>, association: AssociationSpec) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::ManyToOne(association),
            ..Default::default()
        }
    }

    /// Create a one-to-one property.
    pub fn one_to_one(name: impl Into<String>, association: AssociationSpec) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::OneToOne(association),
            ..Default::default()
        }
    }

    /// Create a one-to-many property.
    pub fn one_to_many(name: impl Into<String>, collection: CollectionSpec) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::OneToMany(collection),
            ..Default::default()
        }
    }

    /// Create a many-to-many property.
    pub fn many_to_many(name: impl Into<String>, collection: CollectionSpec) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::ManyToMany(collection),
            ..Default::default()
        }
    }

    /// Create an element collection property.
    pub fn element_collection(name: impl Into<String>, collection: CollectionSpec) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::ElementCollection(collection),
            ..Default::default()
        }
    }

    /// Create an any-association property.
    pub fn any(name: impl Into<String>, any: AnySpec) -> Self {
        Self {
            name: name.into(),
            kind: PropertyKind::Any(any),
            ..Default::default()
        }
    }

    /// Add a column.
    pub fn with_column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Map to a formula.
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    /// Set the access kind.
    pub fn with_access(mut self, access: AccessKind) -> Self {
        self.access = Some(access);
        self
    }

    /// Mark the property read-only.
    pub fn read_only(mut self) -> Self {
        self.insertable = false;
        self.updatable = false;
        self
    }

    /// Check if the property is an association or collection.
    pub fn is_association(&self) -> bool {
        !matches!(self.kind, PropertyKind::Basic | PropertyKind::Embedded { .. })
    }

    /// Cascaded operations of an association.
    pub fn cascade(&self) -> &[String] {
        match &self.kind {
            PropertyKind::ManyToOne(spec) | PropertyKind::OneToOne(spec) => &spec.cascade,
            PropertyKind::OneToMany(spec)
            | PropertyKind::ManyToMany(spec)
            | PropertyKind::ElementCollection(spec) => &spec.cascade,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_defaults_from_json() {
        let prop: PropertySpec = serde_json::from_str(r#"{"name": "title"}"#).unwrap();
        assert_eq!(prop.name, "title");
        assert!(prop.insertable);
        assert!(prop.updatable);
        assert_eq!(prop.kind, PropertyKind::Basic);
    }

    #[test]
    fn test_association_from_json() {
        let prop: PropertySpec = serde_json::from_str(
            r#"{
                "name": "customer",
                "kind": {
                    "type": "many_to_one",
                    "target": "Customer",
                    "join_columns": [{"name": "customer_code", "referenced_column": "code"}]
                }
            }"#,
        )
        .unwrap();
        match prop.kind {
            PropertyKind::ManyToOne(spec) => {
                assert_eq!(spec.target, "Customer");
                assert_eq!(spec.join_columns[0].referenced_column.as_deref(), Some("code"));
                assert!(spec.join_columns[0].nullable);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_collection_builder() {
        let spec = CollectionSpec::of("Line").with_order_column("position");
        assert_eq!(spec.kind, CollectionKind::List);
        assert_eq!(spec.order_column.as_deref(), Some("position"));

        let prop = PropertySpec::one_to_many("lines", spec);
        assert!(prop.is_association());
    }
}
