//! Table declarations.

use serde::{Deserialize, Serialize};

/// Declared table identity and table-level constraints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSpec {
    /// Table name. Derived from the entity name when absent.
    pub name: Option<String>,
    /// Schema qualifier.
    pub schema: Option<String>,
    /// Catalog qualifier.
    pub catalog: Option<String>,
    /// Unique constraints over column names.
    pub unique_constraints: Vec<UniqueConstraintSpec>,
    /// Indexes over column names.
    pub indexes: Vec<IndexSpec>,
}

impl TableSpec {
    /// Create a table declaration with an explicit name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Set the schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the catalog.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Add a unique constraint.
    pub fn with_unique(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.unique_constraints.push(UniqueConstraintSpec {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add an index.
    pub fn with_index(
        mut self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.indexes.push(IndexSpec {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Check if the declaration carries table-level constraints.
    pub fn has_constraints(&self) -> bool {
        !self.unique_constraints.is_empty() || !self.indexes.is_empty()
    }
}

/// A declared unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UniqueConstraintSpec {
    /// Constraint name. Generated when absent.
    pub name: Option<String>,
    /// Constrained column names.
    pub columns: Vec<String>,
}

/// A declared index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSpec {
    /// Index name.
    pub name: String,
    /// Indexed column names.
    pub columns: Vec<String>,
}

/// A secondary table joined to the entity's primary table by primary key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryTableSpec {
    /// Table name.
    pub name: String,
    /// Schema qualifier.
    pub schema: Option<String>,
    /// Catalog qualifier.
    pub catalog: Option<String>,
    /// Key column names, in primary-key order. Defaults to the primary key column names.
    pub pk_join_columns: Vec<String>,
    /// Unique constraints over column names.
    pub unique_constraints: Vec<UniqueConstraintSpec>,
}

impl SecondaryTableSpec {
    /// Create a secondary table declaration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set explicit key column names.
    pub fn with_pk_join_columns(
        mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.pk_join_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}
