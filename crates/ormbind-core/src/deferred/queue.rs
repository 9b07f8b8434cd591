//! The deferred work queue and its staged processing.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::BindError;
use crate::registry::Registry;

use super::ordering::{DependencyNode, DependencyOrderer};
use super::retry::RetryResolver;
use super::unit::{DeferredUnit, UnitKind};

/// Counts of a processed queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueReport {
    /// Units processed per kind.
    pub processed: BTreeMap<UnitKind, usize>,
    /// Foreign-key units that completed a primary key.
    pub primary_key_foreign_keys: usize,
    /// Rounds run by the retry loop.
    pub retry_rounds: usize,
}

impl QueueReport {
    /// Units processed of a kind.
    pub fn count(&self, kind: UnitKind) -> usize {
        self.processed.get(&kind).copied().unwrap_or(0)
    }

    /// Total units processed.
    pub fn total(&self) -> usize {
        self.processed.values().sum()
    }
}

/// Binding work postponed until every entity of the run is registered.
///
/// Processing runs in stages: type definitions, root keys, secondary tables, foreign keys
/// that complete a primary key (in dependency order), then the remaining foreign keys and
/// generic units to a fixed point.
#[derive(Debug, Default)]
pub struct DeferredWorkQueue {
    units: Vec<DeferredUnit>,
}

impl DeferredWorkQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a unit.
    pub fn push(&mut self, unit: DeferredUnit) {
        self.units.push(unit);
    }

    /// Number of queued units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of queued units of a kind.
    pub fn count(&self, kind: UnitKind) -> usize {
        self.units.iter().filter(|u| u.kind() == kind).count()
    }

    /// Queued units.
    pub fn units(&self) -> &[DeferredUnit] {
        &self.units
    }

    /// Process every unit against the registry.
    pub fn process(self, registry: &mut Registry) -> Result<QueueReport, BindError> {
        let mut report = QueueReport::default();
        let mut stages: BTreeMap<UnitKind, Vec<DeferredUnit>> = BTreeMap::new();
        for unit in self.units {
            stages.entry(unit.kind()).or_default().push(unit);
        }
        let mut take = |kind| stages.remove(&kind).unwrap_or_default();

        for kind in [
            UnitKind::SimpleTypeFinalize,
            UnitKind::KeyCreate,
            UnitKind::SecondaryTableFinalize,
        ] {
            let units = take(kind);
            debug!(stage = ?kind, units = units.len(), "processing deferred stage");
            for unit in &units {
                unit.resolve(registry).map_err(|f| f.into_cause())?;
            }
            report.processed.insert(kind, units.len());
        }

        let (in_primary_key, end_of_queue): (Vec<_>, Vec<_>) =
            take(UnitKind::ForeignKeyCreate)
                .into_iter()
                .partition(|unit| match unit {
                    DeferredUnit::ForeignKeyCreate(pass) => pass.in_primary_key,
                    _ => false,
                });

        let nodes: Vec<DependencyNode> = in_primary_key
            .iter()
            .map(|unit| dependency_node(unit, registry))
            .collect();
        let order = DependencyOrderer::order(&nodes)?;
        debug!(units = order.len(), "processing primary key foreign keys");
        for index in order {
            in_primary_key[index]
                .resolve(registry)
                .map_err(|f| f.into_cause())?;
        }
        report.primary_key_foreign_keys = in_primary_key.len();

        let generic = take(UnitKind::Generic);
        report
            .processed
            .insert(UnitKind::ForeignKeyCreate, in_primary_key.len() + end_of_queue.len());
        report.processed.insert(UnitKind::Generic, generic.len());

        let remaining: Vec<DeferredUnit> = end_of_queue.into_iter().chain(generic).collect();
        debug!(units = remaining.len(), "resolving remaining units");
        let retry = RetryResolver::resolve(remaining, |unit| unit.resolve(registry))?;
        report.retry_rounds = retry.rounds;

        Ok(report)
    }
}

fn dependency_node(unit: &DeferredUnit, registry: &Registry) -> DependencyNode {
    match unit {
        DeferredUnit::ForeignKeyCreate(pass) => DependencyNode {
            dependent_table: registry.table_name(pass.dependent_table),
            referenced_table: pass.referenced_table(registry).map(|t| registry.table_name(t)),
        },
        other => DependencyNode {
            dependent_table: other.describe(),
            referenced_table: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileConfig;
    use crate::deferred::passes::{KeyPass, QueryMappingPass};
    use crate::deferred::unit::GenericPass;
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_queue_processes() {
        let mut registry = Registry::new(CompileConfig::new());
        let report = DeferredWorkQueue::new().process(&mut registry).unwrap();
        assert_eq!(report.total(), 0);
        assert_eq!(report.retry_rounds, 0);
    }

    #[test]
    fn test_counts_by_kind() {
        let mut queue = DeferredWorkQueue::new();
        queue.push(DeferredUnit::KeyCreate(KeyPass::new("A")));
        queue.push(DeferredUnit::Generic(GenericPass::QueryMapping(
            QueryMappingPass::new("q", "m"),
        )));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.count(UnitKind::KeyCreate), 1);
        assert_eq!(queue.count(UnitKind::Generic), 1);
        assert_eq!(queue.count(UnitKind::ForeignKeyCreate), 0);
    }

    #[test]
    fn test_stage_failure_is_fatal() {
        let mut registry = Registry::new(CompileConfig::new());
        let mut queue = DeferredWorkQueue::new();
        queue.push(DeferredUnit::KeyCreate(KeyPass::new("Missing")));
        let err = queue.process(&mut registry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_unknown_result_set_mapping_aborts() {
        let mut registry = Registry::new(CompileConfig::new());
        let mut queue = DeferredWorkQueue::new();
        queue.push(DeferredUnit::Generic(GenericPass::QueryMapping(
            QueryMappingPass::new("byName", "missing"),
        )));
        let err = queue.process(&mut registry).unwrap_err();
        assert!(matches!(err, BindError::UnknownResultSetMapping { .. }));
    }
}
