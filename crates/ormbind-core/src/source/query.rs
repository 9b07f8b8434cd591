//! Named queries, result-set mappings and type definitions.
//!
//! These are carried through to the resolved model by name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedQuery {
    /// Query name.
    pub name: String,
    /// Query text.
    pub query: String,
    /// Whether the text is native SQL.
    pub native: bool,
    /// Result-set mapping used by a native query.
    pub result_set_mapping: Option<String>,
    /// Query hints.
    pub hints: BTreeMap<String, String>,
}

impl NamedQuery {
    /// Create an object query.
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            ..Default::default()
        }
    }

    /// Create a native query using a result-set mapping.
    pub fn native(
        name: impl Into<String>,
        query: impl Into<String>,
        result_set_mapping: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            native: true,
            result_set_mapping: Some(result_set_mapping.into()),
            hints: BTreeMap::new(),
        }
    }
}

/// An entity result within a result-set mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityResult {
    /// Entity name.
    pub entity: String,
    /// Property name to result column.
    pub fields: BTreeMap<String, String>,
    /// Discriminator result column.
    pub discriminator_column: Option<String>,
}

/// A named mapping from native result columns to entities and scalars.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultSetMapping {
    /// Mapping name.
    pub name: String,
    /// Entity results.
    pub entities: Vec<EntityResult>,
    /// Scalar result columns.
    pub columns: Vec<String>,
}

impl ResultSetMapping {
    /// Create an empty mapping.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an entity result.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entities.push(EntityResult {
            entity: entity.into(),
            ..Default::default()
        });
        self
    }

    /// Add a scalar column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }
}

/// A named type definition basic values can refer to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDef {
    /// Definition name.
    pub name: String,
    /// Underlying type name.
    pub type_name: String,
    /// Type parameters.
    pub params: BTreeMap<String, String>,
}

impl TypeDef {
    /// Create a type definition.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}
