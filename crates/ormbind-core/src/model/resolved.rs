//! The output of a compilation run.

use std::collections::BTreeMap;

use serde::Serialize;

use super::entity::{Entity, EntityKind, SharedAncestor};
use super::table::{Table, TableId};
use crate::error::BindWarning;
use crate::source::{GeneratorDefinition, NamedQuery, ResultSetMapping};

/// Fully resolved entity and table graph, ready for persister construction and DDL generation.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedModel {
    /// Entities in bind order (ancestors first).
    pub entities: Vec<Entity>,
    /// Tables, indexed by [`TableId`].
    pub tables: Vec<Table>,
    /// Shared ancestors by class name.
    pub shared_ancestors: Vec<SharedAncestor>,
    /// Global named generators.
    pub generators: BTreeMap<String, GeneratorDefinition>,
    /// Named queries.
    pub named_queries: BTreeMap<String, NamedQuery>,
    /// Result-set mappings.
    pub result_set_mappings: BTreeMap<String, ResultSetMapping>,
    /// Warnings raised during the run.
    pub warnings: Vec<BindWarning>,
}

/// Entity and table counts of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ModelStats {
    /// Number of entities.
    pub entities: usize,
    /// Number of root entities.
    pub roots: usize,
    /// Number of tables.
    pub tables: usize,
    /// Number of columns across all tables.
    pub columns: usize,
    /// Number of foreign keys across all tables.
    pub foreign_keys: usize,
}

impl ResolvedModel {
    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Get a table by id.
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.0)
    }

    /// Look up a table by qualified name.
    pub fn table_named(&self, qualified_name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.qualified_name() == qualified_name)
    }

    /// Table owned by an entity.
    pub fn entity_table(&self, entity: &str) -> Option<&Table> {
        self.entity(entity).and_then(|e| self.table(e.table))
    }

    /// Entities of a given kind.
    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    /// Compute entity and table counts.
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            entities: self.entities.len(),
            roots: self.entities_of_kind(EntityKind::Root).count(),
            tables: self.tables.len(),
            columns: self.tables.iter().map(|t| t.columns.len()).sum(),
            foreign_keys: self.tables.iter().map(|t| t.foreign_keys.len()).sum(),
        }
    }

    /// Serialize the model as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
