//! End-to-end compilation of mapping facts into a resolved model.

use tracing::{debug, info};

use crate::binder::{EntityBinder, HierarchyOrderer, InheritanceStateCalculator};
use crate::config::CompileConfig;
use crate::deferred::passes::QueryMappingPass;
use crate::deferred::{DeferredUnit, DeferredWorkQueue, GenericPass};
use crate::error::BindError;
use crate::model::{EntityKind, ResolvedModel, TableId};
use crate::registry::Registry;
use crate::source::MappingSource;

/// Compiles a [`MappingSource`] into a [`ResolvedModel`].
///
/// Every call runs against a fresh [`Registry`]; nothing is shared between runs.
#[derive(Debug, Clone, Default)]
pub struct MetadataCompiler {
    config: CompileConfig,
}

impl MetadataCompiler {
    /// Create a compiler.
    pub fn new(config: CompileConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Run one compilation.
    pub fn compile(&self, source: &MappingSource) -> Result<ResolvedModel, BindError> {
        let mut registry = Registry::new(self.config.clone());
        let mut queue = DeferredWorkQueue::new();

        register_definitions(source, &mut registry, &mut queue)?;

        let order = HierarchyOrderer::order(source)?;
        let states = InheritanceStateCalculator::compute(&order, source, &mut registry)?;
        EntityBinder::new(source, &order, &states, &mut registry, &mut queue).bind_all()?;
        debug!(
            entities = registry.entity_names().len(),
            units = queue.len(),
            "phase one complete"
        );

        let report = queue.process(&mut registry)?;
        debug!(
            units = report.total(),
            retry_rounds = report.retry_rounds,
            "deferred units resolved"
        );

        denormalize_union_tables(&mut registry);
        resolve_property_references(&mut registry)?;
        create_held_constraints(&mut registry)?;
        align_foreign_keys(&mut registry)?;
        fill_key_columns(&mut registry);

        let model = registry.into_model();
        let stats = model.stats();
        info!(
            entities = stats.entities,
            roots = stats.roots,
            tables = stats.tables,
            columns = stats.columns,
            foreign_keys = stats.foreign_keys,
            warnings = model.warnings.len(),
            "mapping compiled"
        );
        Ok(model)
    }
}

/// Register global generators, type definitions, result-set mappings and named queries.
fn register_definitions(
    source: &MappingSource,
    registry: &mut Registry,
    queue: &mut DeferredWorkQueue,
) -> Result<(), BindError> {
    for generator in &source.generators {
        registry.add_generator(generator.clone())?;
    }
    for type_def in &source.type_defs {
        registry.add_type_def(type_def.clone());
    }
    for mapping in &source.result_set_mappings {
        registry.add_result_set_mapping(mapping.clone())?;
    }
    for query in &source.named_queries {
        if let (true, Some(mapping)) = (query.native, &query.result_set_mapping) {
            queue.push(DeferredUnit::Generic(GenericPass::QueryMapping(
                QueryMappingPass::new(query.name.clone(), mapping.clone()),
            )));
        }
        registry.add_named_query(query.clone())?;
    }
    Ok(())
}

/// Copy each parent's columns, primary key and foreign keys into the tables of its union
/// subclasses. Entities are visited in bind order, so a parent is complete before its children.
fn denormalize_union_tables(registry: &mut Registry) {
    let children: Vec<(TableId, TableId)> = registry
        .entities()
        .filter(|e| e.kind == EntityKind::UnionChild)
        .filter_map(|e| {
            registry
                .table(e.table)
                .denormalized_from
                .map(|parent| (e.table, parent))
        })
        .collect();

    for (child, parent) in children {
        let source = registry.table(parent).clone();
        let table = registry.table_mut(child);
        for column in source.columns {
            table.add_column(column);
        }
        if table.primary_key.is_none() {
            if let Some(key) = source.primary_key {
                table.set_primary_key(key.columns);
            }
        }
        for foreign_key in source.foreign_keys {
            table.add_foreign_key(foreign_key);
        }
        debug!(table = %table.name, "denormalized union subclass table");
    }
}

/// Check every property reference and mark unique ones as alternate unique keys.
fn resolve_property_references(registry: &mut Registry) -> Result<(), BindError> {
    let references = registry.property_references().to_vec();
    for reference in references {
        let owner = registry
            .find_property(&reference.entity, &reference.property)
            .map(|(entity, _)| entity.name.clone())
            .ok_or_else(|| BindError::UnknownProperty {
                entity: reference.entity.clone(),
                property: reference.property.clone(),
            })?;
        if reference.unique {
            if let Some(property) = registry
                .entity_mut(&owner)
                .and_then(|e| e.property_mut(&reference.property))
            {
                property.alternate_unique_key = true;
            }
        }
    }
    Ok(())
}

/// Create the unique keys and indexes held until every column existed.
fn create_held_constraints(registry: &mut Registry) -> Result<(), BindError> {
    let (unique_constraints, indexes) = registry.take_held_constraints();
    for (id, spec) in unique_constraints {
        check_columns(registry, id, "unique key constraint", &spec.columns)?;
        registry.table_mut(id).add_unique_key(spec.name, spec.columns);
    }
    for (id, spec) in indexes {
        check_columns(registry, id, "index", &spec.columns)?;
        registry.table_mut(id).add_index(spec.name, spec.columns);
    }
    Ok(())
}

fn check_columns(
    registry: &Registry,
    id: TableId,
    constraint: &'static str,
    columns: &[String],
) -> Result<(), BindError> {
    let table = registry.table(id);
    let missing: Vec<String> = table.missing_columns(columns).into_iter().cloned().collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(BindError::ConstraintColumns {
        constraint,
        table: registry.table_name(id),
        columns: columns.to_vec(),
        missing,
    })
}

/// Point every foreign key at its referenced entity's table and primary key.
fn align_foreign_keys(registry: &mut Registry) -> Result<(), BindError> {
    for index in 0..registry.tables().len() {
        let id = TableId(index);
        let mut updates = Vec::new();
        for (position, foreign_key) in registry.table(id).foreign_keys.iter().enumerate() {
            let path = format!("{}.{}", registry.table_name(id), foreign_key.name);
            let target = registry.require_entity(&foreign_key.referenced_entity, &path)?;
            let referenced_columns = if foreign_key.referenced_columns.is_empty() {
                registry
                    .primary_key_columns(target.table)
                    .unwrap_or_default()
            } else {
                foreign_key.referenced_columns.clone()
            };
            if referenced_columns.len() != foreign_key.columns.len() {
                return Err(BindError::ForeignKeyColumnCount {
                    path,
                    expected: referenced_columns.len(),
                    found: foreign_key.columns.len(),
                });
            }
            let referenced_table = foreign_key.referenced_table.unwrap_or(target.table);
            updates.push((position, referenced_table, referenced_columns));
        }
        let table = registry.table_mut(id);
        for (position, referenced_table, referenced_columns) in updates {
            let foreign_key = &mut table.foreign_keys[position];
            foreign_key.referenced_table = Some(referenced_table);
            foreign_key.referenced_columns = referenced_columns;
        }
    }
    Ok(())
}

/// Record each entity's key columns from its table's primary key.
fn fill_key_columns(registry: &mut Registry) {
    let names = registry.entity_names().to_vec();
    for name in names {
        let Some(entity) = registry.entity(&name) else {
            continue;
        };
        if !entity.key_columns.is_empty() {
            continue;
        }
        let columns = registry.primary_key_columns(entity.table).unwrap_or_default();
        if let Some(entity) = registry.entity_mut(&name) {
            entity.key_columns = columns;
        }
    }
}
