//! Native query result-set mapping checks.

use crate::error::{BindError, Failure};
use crate::registry::Registry;

/// Checks that a native query's result-set mapping exists and names known entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMappingPass {
    /// Query name.
    pub query: String,
    /// Result-set mapping name.
    pub mapping: String,
}

impl QueryMappingPass {
    /// Create a check for a query.
    pub fn new(query: impl Into<String>, mapping: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mapping: mapping.into(),
        }
    }

    /// Verify the mapping.
    pub fn resolve(&self, registry: &mut Registry) -> Result<(), Failure> {
        let mapping = registry
            .result_set_mapping(&self.mapping)
            .ok_or_else(|| BindError::UnknownResultSetMapping {
                query: self.query.clone(),
                mapping: self.mapping.clone(),
            })?;
        for result in &mapping.entities {
            registry.require_entity(&result.entity, &self.query)?;
        }
        Ok(())
    }
}
