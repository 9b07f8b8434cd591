//! Synthetic properties for foreign keys that reference non-primary-key columns.
//!
//! The referenced columns are located on the referenced entity's tables (its own table, its
//! secondary tables, then its ancestors'), each column is matched to a property mapping exactly
//! that one column, and read-only copies of those properties are grouped into an embedded
//! component added to the referenced entity. Multi-column properties are never matched.
//!
//! The synthetic property belongs to the entity owning the referenced columns, not to the
//! entity holding the foreign key.

use tracing::debug;

use crate::error::BindError;
use crate::model::{Component, Property, TableId, Value};
use crate::registry::Registry;
use crate::source::AccessKind;

/// Result of building a synthetic property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticReference {
    /// Entity the synthetic property was added to.
    pub entity: String,
    /// Synthetic property name.
    pub property: String,
    /// Table holding the referenced columns.
    pub table: TableId,
    /// Referenced columns, in reference order.
    pub columns: Vec<String>,
    /// Unique key registered over the columns.
    pub unique_key: String,
}

/// Builds the synthetic property a non-primary-key reference resolves to.
pub struct SyntheticReferenceBuilder<'a> {
    registry: &'a mut Registry,
}

impl<'a> SyntheticReferenceBuilder<'a> {
    /// Create a builder over the run's registry.
    pub fn new(registry: &'a mut Registry) -> Self {
        Self { registry }
    }

    /// Build the synthetic property for `referencing_entity.property_name` referencing
    /// `columns` of `referenced_entity`.
    ///
    /// `unique` registers the synthetic property as a unique property reference (to-one);
    /// collections register a plain reference.
    pub fn build(
        self,
        referencing_entity: &str,
        property_name: &str,
        referenced_entity: &str,
        columns: &[String],
        unique: bool,
    ) -> Result<SyntheticReference, BindError> {
        let path = format!("{}.{}", referencing_entity, property_name);
        let first = columns.first().ok_or_else(|| BindError::Internal {
            path: path.clone(),
            message: "synthetic reference without columns".to_string(),
        })?;

        let (owner, table) = self
            .find_column_owner(referenced_entity, first)
            .ok_or_else(|| BindError::ColumnOwnerNotFound {
                path: path.clone(),
                target: referenced_entity.to_string(),
                column: first.clone(),
            })?;

        let matched = self.match_properties(&owner, table, columns);
        let unmatched: Vec<String> = columns
            .iter()
            .zip(&matched)
            .filter(|(_, found)| found.is_none())
            .map(|(column, _)| column.clone())
            .collect();
        if !unmatched.is_empty() {
            return Err(BindError::UnmatchedReferencedColumns {
                path,
                target: referenced_entity.to_string(),
                columns: unmatched,
            });
        }
        let copies: Vec<Property> = matched
            .into_iter()
            .flatten()
            .map(|property| property.read_only_copy())
            .collect();

        let name = format!(
            "_{}_{}",
            referencing_entity.replace('.', "_"),
            property_name.replace('.', "_")
        );
        let class_name = self
            .registry
            .entity(&owner)
            .map(|e| e.class_name.clone());

        let unique_key = self
            .registry
            .table_mut(table)
            .add_unique_key(None, columns.to_vec());

        let entity = self
            .registry
            .entity_mut(referenced_entity)
            .ok_or_else(|| BindError::UnknownEntity {
                path: path.clone(),
                target: referenced_entity.to_string(),
            })?;
        if entity.property(&name).is_none() {
            let mut synthetic = Property::new(
                name.clone(),
                AccessKind::Field,
                Value::Component(Component {
                    table,
                    class_name,
                    properties: copies,
                    embedded: true,
                }),
            );
            synthetic.insertable = false;
            synthetic.updatable = false;
            synthetic.synthetic = true;
            entity.properties.push(synthetic);
        }

        self.registry
            .add_property_reference(referenced_entity, name.clone(), unique);
        debug!(
            entity = %referenced_entity,
            property = %name,
            columns = ?columns,
            "created synthetic property reference"
        );

        Ok(SyntheticReference {
            entity: referenced_entity.to_string(),
            property: name,
            table,
            columns: columns.to_vec(),
            unique_key,
        })
    }

    /// First entity (walking up from `entity`) whose table or secondary table holds the column.
    fn find_column_owner(&self, entity: &str, column: &str) -> Option<(String, TableId)> {
        for candidate in self.registry.lineage(entity) {
            for table in candidate.tables() {
                if self.registry.find_column(table, column).is_some() {
                    return Some((candidate.name.clone(), table));
                }
            }
        }
        None
    }

    /// For each column, a property of the owner on `table` mapping exactly that column.
    fn match_properties(
        &self,
        owner: &str,
        table: TableId,
        columns: &[String],
    ) -> Vec<Option<Property>> {
        let Some(entity) = self.registry.entity(owner) else {
            return vec![None; columns.len()];
        };
        let identifier_property = self
            .registry
            .identifier(owner)
            .filter(|_| table == entity.table)
            .and_then(|id| {
                id.property
                    .as_ref()
                    .map(|name| Property::new(name.clone(), AccessKind::Field, id.value.clone()))
            });
        let candidates: Vec<&Property> = entity
            .properties
            .iter()
            .filter(|p| !p.synthetic && p.value.table() == Some(table))
            .chain(identifier_property.iter())
            .collect();

        columns
            .iter()
            .map(|column| {
                candidates
                    .iter()
                    .find(|p| p.value.is_single_column() && p.value.columns()[0] == *column)
                    .map(|p| (*p).clone())
            })
            .collect()
    }
}
