//! Primary key creation for root entities.

use crate::error::{BindError, Failure};
use crate::registry::Registry;

/// Creates a root entity's primary key from its identifier columns.
///
/// Columns of identifying associations are appended later by their foreign-key units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPass {
    /// Root entity.
    pub entity: String,
}

impl KeyPass {
    /// Create a pass for a root entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    /// Create the primary key.
    pub fn resolve(&self, registry: &mut Registry) -> Result<(), Failure> {
        let entity = registry
            .entity(&self.entity)
            .ok_or_else(|| BindError::Internal {
                path: self.entity.clone(),
                message: "entity not registered".to_string(),
            })?;
        let identifier = entity
            .identifier
            .as_ref()
            .ok_or_else(|| BindError::MissingIdentifier {
                entity: self.entity.clone(),
            })?;

        let columns = identifier.columns();
        if columns.is_empty() && !identifier.value.has_pending_associations() {
            return Err(BindError::EmptyIdentifier {
                entity: self.entity.clone(),
            }
            .into());
        }

        let table = entity.table;
        registry.table_mut(table).set_primary_key(columns.clone());
        if let Some(entity) = registry.entity_mut(&self.entity) {
            entity.key_columns = columns;
        }
        Ok(())
    }
}
