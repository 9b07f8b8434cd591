//! Per-run context shared by every stage of a compilation.
//!
//! A [`Registry`] is created for one run, mutated by the binder and the deferred units, and
//! turned into a [`ResolvedModel`] at the end. It must be discarded after a fatal error.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::config::CompileConfig;
use crate::error::{BindError, BindWarning};
use crate::model::{
    qualify, Column, Entity, Identifier, Property, ResolvedModel, SharedAncestor, Table, TableId,
};
use crate::source::{
    GeneratorDefinition, IndexSpec, NamedQuery, ResultSetMapping, TypeDef, UniqueConstraintSpec,
};

/// Reference from an association to a non-identifier property of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyReference {
    /// Referenced entity.
    pub entity: String,
    /// Referenced property.
    pub property: String,
    /// The referenced property must be unique.
    pub unique: bool,
}

/// Mapping metadata of one compilation run.
#[derive(Debug)]
pub struct Registry {
    config: CompileConfig,
    entities: HashMap<String, Entity>,
    entity_order: Vec<String>,
    class_entities: HashMap<String, String>,
    tables: Vec<Table>,
    table_names: HashMap<String, TableId>,
    shared_ancestors: BTreeMap<String, SharedAncestor>,
    generators: BTreeMap<String, GeneratorDefinition>,
    type_defs: BTreeMap<String, TypeDef>,
    named_queries: BTreeMap<String, NamedQuery>,
    result_set_mappings: BTreeMap<String, ResultSetMapping>,
    property_references: Vec<PropertyReference>,
    held_unique_constraints: Vec<(TableId, UniqueConstraintSpec)>,
    held_indexes: Vec<(TableId, IndexSpec)>,
    pending_keys: HashMap<TableId, usize>,
    discriminator_values: HashMap<String, BTreeMap<String, String>>,
    warnings: Vec<BindWarning>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new(config: CompileConfig) -> Self {
        Self {
            config,
            entities: HashMap::new(),
            entity_order: Vec::new(),
            class_entities: HashMap::new(),
            tables: Vec::new(),
            table_names: HashMap::new(),
            shared_ancestors: BTreeMap::new(),
            generators: BTreeMap::new(),
            type_defs: BTreeMap::new(),
            named_queries: BTreeMap::new(),
            result_set_mappings: BTreeMap::new(),
            property_references: Vec::new(),
            held_unique_constraints: Vec::new(),
            held_indexes: Vec::new(),
            pending_keys: HashMap::new(),
            discriminator_values: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Get the run configuration.
    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    // ---- entities ----

    /// Register a bound entity and link it to its parent.
    pub fn add_entity(&mut self, entity: Entity) -> Result<(), BindError> {
        if self.entities.contains_key(&entity.name) {
            return Err(BindError::DuplicateEntity {
                entity: entity.name.clone(),
            });
        }
        if let Some(parent) = entity
            .super_entity
            .as_ref()
            .and_then(|name| self.entities.get_mut(name))
        {
            parent.subclasses.push(entity.name.clone());
        }
        self.class_entities
            .insert(entity.class_name.clone(), entity.name.clone());
        self.entity_order.push(entity.name.clone());
        self.entities.insert(entity.name.clone(), entity);
        Ok(())
    }

    /// Look up an entity.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Look up an entity for modification.
    pub fn entity_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.get_mut(name)
    }

    /// Look up an entity, failing with an unresolved-reference error.
    pub fn require_entity(&self, name: &str, path: &str) -> Result<&Entity, BindError> {
        self.entities.get(name).ok_or_else(|| BindError::UnknownEntity {
            path: path.to_string(),
            target: name.to_string(),
        })
    }

    /// Look up an entity by its class name.
    pub fn entity_for_class(&self, class_name: &str) -> Option<&Entity> {
        self.class_entities
            .get(class_name)
            .and_then(|name| self.entities.get(name))
    }

    /// Check if an entity is registered.
    pub fn contains_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Entities in bind order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entity_order
            .iter()
            .filter_map(|name| self.entities.get(name))
    }

    /// Entity names in bind order.
    pub fn entity_names(&self) -> &[String] {
        &self.entity_order
    }

    /// The entity followed by its ancestors, nearest first.
    pub fn lineage(&self, name: &str) -> Vec<&Entity> {
        let mut lineage = Vec::new();
        let mut current = self.entities.get(name);
        while let Some(entity) = current {
            if lineage.len() > self.entities.len() {
                break;
            }
            lineage.push(entity);
            current = entity
                .super_entity
                .as_ref()
                .and_then(|parent| self.entities.get(parent));
        }
        lineage
    }

    /// Root entity of the hierarchy an entity belongs to.
    pub fn root_of(&self, name: &str) -> Option<&Entity> {
        self.lineage(name).pop()
    }

    /// Identifier of an entity, held by its root.
    pub fn identifier(&self, name: &str) -> Option<&Identifier> {
        self.root_of(name).and_then(|root| root.identifier.as_ref())
    }

    /// Find a property on an entity or its ancestors. Returns the declaring entity and the
    /// property.
    pub fn find_property(&self, entity: &str, property: &str) -> Option<(&Entity, &Property)> {
        for owner in self.lineage(entity) {
            if let Some(found) = owner.property(property) {
                return Some((owner, found));
            }
        }
        None
    }

    /// Check if a name is the identifier property of an entity's hierarchy.
    pub fn is_identifier_property(&self, entity: &str, property: &str) -> bool {
        self.identifier(entity)
            .and_then(|id| id.property.as_deref())
            .is_some_and(|name| name == property)
    }

    // ---- tables ----

    /// Register a table, or reuse an existing regular table of the same qualified name.
    ///
    /// The default schema and catalog apply when none is given. A denormalized table never
    /// shares its name with another table.
    pub fn add_table(
        &mut self,
        name: &str,
        schema: Option<&str>,
        catalog: Option<&str>,
        is_abstract: bool,
        denormalized_from: Option<TableId>,
    ) -> Result<TableId, BindError> {
        let schema = schema
            .map(str::to_string)
            .or_else(|| self.config.default_schema.clone());
        let catalog = catalog
            .map(str::to_string)
            .or_else(|| self.config.default_catalog.clone());
        let qualified = qualify(catalog.as_deref(), schema.as_deref(), name);

        if let Some(&existing) = self.table_names.get(&qualified) {
            let table = &mut self.tables[existing.0];
            if denormalized_from.is_some() || table.denormalized_from.is_some() {
                return Err(BindError::DuplicateTable { table: qualified });
            }
            table.is_abstract &= is_abstract;
            return Ok(existing);
        }

        let id = TableId(self.tables.len());
        let mut table = Table::new(name);
        table.schema = schema;
        table.catalog = catalog;
        table.is_abstract = is_abstract;
        table.denormalized_from = denormalized_from;
        self.tables.push(table);
        self.table_names.insert(qualified, id);
        Ok(id)
    }

    /// Get a table.
    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.0]
    }

    /// Get a table for modification.
    pub fn table_mut(&mut self, id: TableId) -> &mut Table {
        &mut self.tables[id.0]
    }

    /// Look up a table by qualified name.
    pub fn table_id(&self, qualified_name: &str) -> Option<TableId> {
        self.table_names.get(qualified_name).copied()
    }

    /// All tables.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Qualified name of a table.
    pub fn table_name(&self, id: TableId) -> String {
        self.table(id).qualified_name()
    }

    /// Primary key columns of a table; a denormalized table without its own key reports the
    /// key of the table it repeats.
    pub fn primary_key_columns(&self, id: TableId) -> Option<Vec<String>> {
        let table = self.table(id);
        match (&table.primary_key, table.denormalized_from) {
            (Some(pk), _) => Some(pk.columns.clone()),
            (None, Some(source)) if source != id => self.primary_key_columns(source),
            _ => None,
        }
    }

    /// Look up a column, following denormalized tables to their source.
    pub fn find_column(&self, id: TableId, name: &str) -> Option<&Column> {
        let table = self.table(id);
        match (table.column(name), table.denormalized_from) {
            (Some(column), _) => Some(column),
            (None, Some(source)) if source != id => self.find_column(source, name),
            _ => None,
        }
    }

    /// Record an identifying association that must complete before the table's key settles.
    pub fn mark_key_pending(&mut self, id: TableId) {
        *self.pending_keys.entry(id).or_insert(0) += 1;
    }

    /// Record that one identifying association of the table completed.
    pub fn settle_key(&mut self, id: TableId) {
        if let Some(count) = self.pending_keys.get_mut(&id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.pending_keys.remove(&id);
            }
        }
    }

    /// Check if a table's primary key exists and no identifying association is pending.
    pub fn is_key_settled(&self, id: TableId) -> bool {
        let table = self.table(id);
        if self.pending_keys.contains_key(&id) {
            return false;
        }
        match (&table.primary_key, table.denormalized_from) {
            (Some(_), _) => true,
            (None, Some(source)) if source != id => self.is_key_settled(source),
            _ => false,
        }
    }

    /// Settled primary key columns, or a retryable failure naming the table.
    pub fn settled_key(&self, id: TableId) -> Result<Vec<String>, BindError> {
        match self.primary_key_columns(id) {
            Some(columns) if self.is_key_settled(id) => Ok(columns),
            _ => Err(BindError::PrimaryKeyPending {
                table: self.table_name(id),
            }),
        }
    }

    /// Hold a unique constraint until every column exists.
    pub fn hold_unique_constraint(&mut self, table: TableId, spec: UniqueConstraintSpec) {
        self.held_unique_constraints.push((table, spec));
    }

    /// Hold an index until every column exists.
    pub fn hold_index(&mut self, table: TableId, spec: IndexSpec) {
        self.held_indexes.push((table, spec));
    }

    /// Take the held unique constraints and indexes.
    pub fn take_held_constraints(
        &mut self,
    ) -> (Vec<(TableId, UniqueConstraintSpec)>, Vec<(TableId, IndexSpec)>) {
        (
            std::mem::take(&mut self.held_unique_constraints),
            std::mem::take(&mut self.held_indexes),
        )
    }

    // ---- named definitions ----

    /// Register a shared ancestor.
    pub fn add_shared_ancestor(&mut self, ancestor: SharedAncestor) {
        self.shared_ancestors
            .entry(ancestor.class_name.clone())
            .or_insert(ancestor);
    }

    /// Look up a shared ancestor.
    pub fn shared_ancestor(&self, class_name: &str) -> Option<&SharedAncestor> {
        self.shared_ancestors.get(class_name)
    }

    /// Register a global named generator.
    pub fn add_generator(&mut self, generator: GeneratorDefinition) -> Result<(), BindError> {
        if self.generators.contains_key(&generator.name) {
            return Err(BindError::DuplicateGenerator {
                name: generator.name,
            });
        }
        self.generators.insert(generator.name.clone(), generator);
        Ok(())
    }

    /// Look up a global named generator.
    pub fn generator(&self, name: &str) -> Option<&GeneratorDefinition> {
        self.generators.get(name)
    }

    /// Register a type definition; a later definition replaces an earlier one.
    pub fn add_type_def(&mut self, type_def: TypeDef) {
        if self.type_defs.contains_key(&type_def.name) {
            warn!(name = %type_def.name, "duplicate type definition, replacing");
        }
        self.type_defs.insert(type_def.name.clone(), type_def);
    }

    /// Look up a type definition.
    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.type_defs.get(name)
    }

    /// Register a named query.
    pub fn add_named_query(&mut self, query: NamedQuery) -> Result<(), BindError> {
        if self.named_queries.contains_key(&query.name) {
            return Err(BindError::DuplicateQuery { name: query.name });
        }
        self.named_queries.insert(query.name.clone(), query);
        Ok(())
    }

    /// Look up a named query.
    pub fn named_query(&self, name: &str) -> Option<&NamedQuery> {
        self.named_queries.get(name)
    }

    /// Register a result-set mapping.
    pub fn add_result_set_mapping(&mut self, mapping: ResultSetMapping) -> Result<(), BindError> {
        if self.result_set_mappings.contains_key(&mapping.name) {
            return Err(BindError::DuplicateResultSetMapping { name: mapping.name });
        }
        self.result_set_mappings.insert(mapping.name.clone(), mapping);
        Ok(())
    }

    /// Look up a result-set mapping.
    pub fn result_set_mapping(&self, name: &str) -> Option<&ResultSetMapping> {
        self.result_set_mappings.get(name)
    }

    /// Register a property reference.
    pub fn add_property_reference(
        &mut self,
        entity: impl Into<String>,
        property: impl Into<String>,
        unique: bool,
    ) {
        let reference = PropertyReference {
            entity: entity.into(),
            property: property.into(),
            unique,
        };
        if !self.property_references.contains(&reference) {
            self.property_references.push(reference);
        }
    }

    /// Registered property references.
    pub fn property_references(&self) -> &[PropertyReference] {
        &self.property_references
    }

    /// Record the discriminator value of an entity within its hierarchy.
    pub fn add_discriminator_value(
        &mut self,
        root: &str,
        value: &str,
        entity: &str,
    ) -> Result<(), BindError> {
        let values = self.discriminator_values.entry(root.to_string()).or_default();
        if let Some(other) = values.get(value) {
            return Err(BindError::DuplicateDiscriminatorValue {
                entity: entity.to_string(),
                value: value.to_string(),
                other: other.clone(),
            });
        }
        values.insert(value.to_string(), entity.to_string());
        Ok(())
    }

    // ---- diagnostics ----

    /// Log and collect a warning. In strict mode the warning becomes a fatal error.
    pub fn warn(&mut self, warning: BindWarning) -> Result<(), BindError> {
        warn!(subject = %warning.subject(), "{}", warning);
        if self.config.strict_warnings {
            return Err(BindError::Strict(warning));
        }
        self.warnings.push(warning);
        Ok(())
    }

    /// Warnings collected so far.
    pub fn warnings(&self) -> &[BindWarning] {
        &self.warnings
    }

    /// Consume the registry into the resolved model.
    pub fn into_model(mut self) -> ResolvedModel {
        let entities = self
            .entity_order
            .iter()
            .filter_map(|name| self.entities.remove(name))
            .collect();
        ResolvedModel {
            entities,
            tables: self.tables,
            shared_ancestors: self.shared_ancestors.into_values().collect(),
            generators: self.generators,
            named_queries: self.named_queries,
            result_set_mappings: self.result_set_mappings,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_table_reuses_regular_tables() {
        let mut registry = Registry::new(CompileConfig::default());
        let a = registry.add_table("orders", None, None, false, None).unwrap();
        let b = registry.add_table("orders", None, None, false, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.tables().len(), 1);
    }

    #[test]
    fn test_add_table_rejects_denormalized_duplicate() {
        let mut registry = Registry::new(CompileConfig::default());
        let parent = registry.add_table("animal", None, None, false, None).unwrap();
        registry.add_table("cat", None, None, false, None).unwrap();
        let err = registry
            .add_table("cat", None, None, false, Some(parent))
            .unwrap_err();
        assert!(matches!(err, BindError::DuplicateTable { .. }));
    }

    #[test]
    fn test_default_schema_applies() {
        let config = CompileConfig::default().with_default_schema("app");
        let mut registry = Registry::new(config);
        let id = registry.add_table("orders", None, None, false, None).unwrap();
        assert_eq!(registry.table_name(id), "app.orders");
        assert_eq!(registry.table_id("app.orders"), Some(id));

        let other = registry
            .add_table("orders", Some("audit"), None, false, None)
            .unwrap();
        assert_ne!(id, other);
    }

    #[test]
    fn test_denormalized_key_follows_source() {
        let mut registry = Registry::new(CompileConfig::default());
        let parent = registry.add_table("animal", None, None, false, None).unwrap();
        registry.table_mut(parent).add_column(Column::new("id"));
        registry.table_mut(parent).set_primary_key(vec!["id".to_string()]);
        let child = registry.add_table("cat", None, None, false, Some(parent)).unwrap();

        assert_eq!(registry.primary_key_columns(child), Some(vec!["id".to_string()]));
        assert!(registry.find_column(child, "id").is_some());
        assert!(registry.is_key_settled(child));

        registry.mark_key_pending(parent);
        assert!(!registry.is_key_settled(child));
        assert!(registry.settled_key(child).is_err());
        registry.settle_key(parent);
        assert_eq!(registry.settled_key(child).unwrap(), vec!["id".to_string()]);
    }

    #[test]
    fn test_duplicate_definitions_are_fatal() {
        let mut registry = Registry::new(CompileConfig::default());
        registry
            .add_named_query(NamedQuery::new("byName", "from Customer"))
            .unwrap();
        let err = registry
            .add_named_query(NamedQuery::new("byName", "from Order"))
            .unwrap_err();
        assert!(matches!(err, BindError::DuplicateQuery { .. }));

        registry
            .add_generator(GeneratorDefinition::new("seq", "sequence"))
            .unwrap();
        assert!(registry
            .add_generator(GeneratorDefinition::new("seq", "identity"))
            .is_err());
    }

    #[test]
    fn test_discriminator_values_unique_per_root() {
        let mut registry = Registry::new(CompileConfig::default());
        registry.add_discriminator_value("Animal", "C", "Cat").unwrap();
        registry.add_discriminator_value("Vehicle", "C", "Car").unwrap();
        let err = registry
            .add_discriminator_value("Animal", "C", "Cow")
            .unwrap_err();
        assert!(matches!(
            err,
            BindError::DuplicateDiscriminatorValue { ref other, .. } if other == "Cat"
        ));
    }

    #[test]
    fn test_strict_warning_is_fatal() {
        let warning = BindWarning::OnDeleteIgnored {
            entity: "Cat".to_string(),
        };
        let mut lenient = Registry::new(CompileConfig::default());
        lenient.warn(warning.clone()).unwrap();
        assert_eq!(lenient.warnings().len(), 1);

        let mut strict = Registry::new(CompileConfig::default().strict());
        assert!(matches!(strict.warn(warning), Err(BindError::Strict(_))));
    }
}
