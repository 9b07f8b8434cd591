//! Phase-one entity binding.
//!
//! Each class is turned into an [`Entity`] with its table, identifier and properties. Work
//! that needs another entity (keys, foreign keys, collections, secondary-table keys) is pushed
//! onto the [`DeferredWorkQueue`].

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::deferred::passes::{
    ForeignKeyPass, ForeignKeyTarget, KeyPass, QueryMappingPass, SecondaryTablePass,
    SimpleTypePass,
};
use crate::deferred::{DeferredUnit, DeferredWorkQueue, GenericPass, ValuePath};
use crate::error::{BindError, BindWarning};
use crate::model::{
    Column, Discriminator, Entity, EntityKind, Identifier, Join, Property, Selectable, TableId,
    Value,
};
use crate::registry::Registry;
use crate::source::{ClassDescriptor, InheritanceStrategy, MappingSource, PropertySpec, TableSpec};

use super::hierarchy::{modeled_ancestors, HierarchyOrder};
use super::identifier::bind_identifier;
use super::inheritance::InheritanceState;
use super::property::PropertyBinder;

/// Parent entity of a subclass.
struct Parent {
    name: String,
    table: TableId,
    root: String,
}

/// Binds ordered classes into the registry.
pub struct EntityBinder<'a> {
    source: &'a MappingSource,
    order: &'a HierarchyOrder,
    states: &'a BTreeMap<String, InheritanceState>,
    registry: &'a mut Registry,
    queue: &'a mut DeferredWorkQueue,
}

impl<'a> EntityBinder<'a> {
    /// Create a binder for one run.
    pub fn new(
        source: &'a MappingSource,
        order: &'a HierarchyOrder,
        states: &'a BTreeMap<String, InheritanceState>,
        registry: &'a mut Registry,
        queue: &'a mut DeferredWorkQueue,
    ) -> Self {
        Self {
            source,
            order,
            states,
            registry,
            queue,
        }
    }

    /// Bind every ordered class.
    pub fn bind_all(&mut self) -> Result<(), BindError> {
        let order = self.order;
        for class_name in &order.classes {
            self.bind(class_name)?;
        }
        Ok(())
    }

    /// Bind one class. Its modeled ancestors must already be bound.
    pub fn bind(&mut self, class_name: &str) -> Result<(), BindError> {
        let source = self.source;
        let states = self.states;
        let class = source
            .class(class_name)
            .ok_or_else(|| BindError::UnknownEntity {
                path: class_name.to_string(),
                target: class_name.to_string(),
            })?;
        let state = states
            .get(class_name)
            .ok_or_else(|| BindError::Internal {
                path: class_name.to_string(),
                message: "no inheritance state".to_string(),
            })?;

        if !class.is_entity() {
            if let Some(ancestor) = self.order.shared_ancestors.get(class_name) {
                self.registry.add_shared_ancestor(ancestor.clone());
            }
            return Ok(());
        }
        self.bind_entity(class, state)
    }

    fn bind_entity(
        &mut self,
        class: &'a ClassDescriptor,
        state: &InheritanceState,
    ) -> Result<(), BindError> {
        let name = class.entity_name();
        if self.registry.contains_entity(&name) {
            return Err(BindError::DuplicateEntity { entity: name });
        }
        let parent = self.parent(&name, state)?;
        let kind = match (&parent, state.strategy) {
            (None, _) => EntityKind::Root,
            (Some(_), Some(InheritanceStrategy::Joined)) => EntityKind::JoinedChild,
            (Some(_), Some(InheritanceStrategy::TablePerClass)) => EntityKind::UnionChild,
            (Some(_), _) => EntityKind::SingleTableChild,
        };

        // Shared ancestors between this class and its entity parent, nearest first.
        let intermediates: Vec<&ClassDescriptor> = modeled_ancestors(self.source, class)?
            .into_iter()
            .take_while(|a| !a.is_entity())
            .collect();

        let table = self.bind_table(&name, class, state, kind, parent.as_ref())?;
        self.check_ignored_declarations(&name, class, state, kind)?;

        let discriminator = if kind == EntityKind::Root
            && state.strategy == Some(InheritanceStrategy::SingleTable)
            && (state.has_subclasses || class.discriminator.is_some())
        {
            Some(self.bind_discriminator(&name, class, table)?)
        } else {
            None
        };
        let discriminator_value = self.bind_discriminator_value(
            &name,
            class,
            state,
            parent.as_ref(),
            discriminator.is_some(),
        )?;

        let identifier_spec = match kind {
            EntityKind::Root => Some(
                class
                    .identifier
                    .as_ref()
                    .or_else(|| intermediates.iter().find_map(|a| a.identifier.as_ref()))
                    .ok_or_else(|| BindError::MissingIdentifier {
                        entity: name.clone(),
                    })?,
            ),
            _ if class.identifier.is_some() => {
                return Err(BindError::IdentifierOnSubclass { entity: name });
            }
            _ => None,
        };

        let (joins, secondary_tables) = self.bind_secondary_tables(&name, class)?;

        let mut binder = PropertyBinder {
            registry: &mut *self.registry,
            queue: &mut *self.queue,
            entity: name.clone(),
            table,
            secondary_tables,
            force_nullable: kind == EntityKind::SingleTableChild,
            default_access: class.default_access.unwrap_or_default(),
        };

        let available: Vec<&PropertySpec> = class
            .properties
            .iter()
            .chain(intermediates.iter().flat_map(|a| a.properties.iter()))
            .collect();
        let mut consumed: HashSet<String> = HashSet::new();
        let identifier = match identifier_spec {
            Some(spec) => {
                let (identifier, names) =
                    bind_identifier(&mut binder, spec, &available, &class.generators)?;
                consumed.extend(names);
                Some(identifier)
            }
            None => None,
        };

        let mut properties: Vec<Property> = Vec::new();
        let declared = intermediates
            .iter()
            .rev()
            .flat_map(|a| a.properties.iter())
            .chain(class.properties.iter());
        for spec in declared {
            if consumed.contains(&spec.name) || properties.iter().any(|p| p.name == spec.name) {
                continue;
            }
            let path = ValuePath::property(name.clone(), spec.name.clone());
            properties.push(binder.bind(spec, path, table)?);
        }

        self.queue_type_finalizers(&name, identifier.as_ref(), &properties);

        let key_columns = if kind == EntityKind::JoinedChild {
            class.primary_key_join_columns.clone()
        } else {
            Vec::new()
        };
        let super_entity = parent.as_ref().map(|p| p.name.clone());
        self.registry.add_entity(Entity {
            name: name.clone(),
            class_name: class.class_name.clone(),
            kind,
            super_entity,
            shared_ancestor: intermediates.first().map(|a| a.class_name.clone()),
            table,
            joins,
            properties,
            identifier,
            key_columns,
            discriminator,
            discriminator_value,
            subclasses: Vec::new(),
            is_abstract: class.is_abstract,
        })?;

        match (kind, &parent) {
            (EntityKind::Root, _) => {
                self.queue
                    .push(DeferredUnit::KeyCreate(KeyPass::new(name.clone())));
            }
            (EntityKind::JoinedChild, Some(parent)) => {
                self.registry.mark_key_pending(table);
                self.queue.push(DeferredUnit::ForeignKeyCreate(ForeignKeyPass {
                    owner: name.clone(),
                    path: name.clone(),
                    in_primary_key: true,
                    referenced_entity: parent.name.clone(),
                    dependent_table: table,
                    target: ForeignKeyTarget::JoinedSubclass {
                        pk_join_columns: class.primary_key_join_columns.clone(),
                        cascade_delete: class.on_delete_cascade,
                    },
                }));
            }
            _ => {}
        }

        for query in &class.named_queries {
            if let (true, Some(mapping)) = (query.native, &query.result_set_mapping) {
                self.queue
                    .push(DeferredUnit::Generic(GenericPass::QueryMapping(
                        QueryMappingPass::new(query.name.clone(), mapping.clone()),
                    )));
            }
            self.registry.add_named_query(query.clone())?;
        }
        for mapping in &class.result_set_mappings {
            self.registry.add_result_set_mapping(mapping.clone())?;
        }

        debug!(
            entity = %name,
            kind = ?kind,
            table = %self.registry.table_name(table),
            "bound entity"
        );
        Ok(())
    }

    fn parent(&self, name: &str, state: &InheritanceState) -> Result<Option<Parent>, BindError> {
        let Some(super_class) = &state.super_entity else {
            return Ok(None);
        };
        let parent = self
            .registry
            .entity_for_class(super_class)
            .ok_or_else(|| BindError::Internal {
                path: name.to_string(),
                message: format!("superclass {} is not bound yet", super_class),
            })?;
        let root = self
            .registry
            .root_of(&parent.name)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| parent.name.clone());
        Ok(Some(Parent {
            name: parent.name.clone(),
            table: parent.table,
            root,
        }))
    }

    fn bind_table(
        &mut self,
        name: &str,
        class: &ClassDescriptor,
        state: &InheritanceState,
        kind: EntityKind,
        parent: Option<&Parent>,
    ) -> Result<TableId, BindError> {
        let naming = self.registry.config().naming;
        let declared = class.table.clone().unwrap_or_default();
        let table_name = declared
            .name
            .clone()
            .unwrap_or_else(|| naming.table_name(name));

        let (is_abstract, denormalized_from) = match (kind, parent) {
            (EntityKind::SingleTableChild, Some(parent)) => {
                if let Some(spec) = &class.table {
                    if spec.has_constraints() {
                        return Err(BindError::IllegalTable {
                            entity: name.to_string(),
                            table: table_name,
                        });
                    }
                    self.registry.warn(BindWarning::TableIgnored {
                        entity: name.to_string(),
                        table: table_name,
                    })?;
                }
                return Ok(parent.table);
            }
            (EntityKind::UnionChild, Some(parent)) => (class.is_abstract, Some(parent.table)),
            (EntityKind::Root, _) => (
                class.is_abstract && state.strategy == Some(InheritanceStrategy::TablePerClass),
                None,
            ),
            _ => (false, None),
        };

        let table = self.registry.add_table(
            &table_name,
            declared.schema.as_deref(),
            declared.catalog.as_deref(),
            is_abstract,
            denormalized_from,
        )?;
        self.hold_constraints(table, &declared);
        Ok(table)
    }

    fn hold_constraints(&mut self, table: TableId, spec: &TableSpec) {
        for unique in &spec.unique_constraints {
            self.registry.hold_unique_constraint(table, unique.clone());
        }
        for index in &spec.indexes {
            self.registry.hold_index(table, index.clone());
        }
    }

    fn check_ignored_declarations(
        &mut self,
        name: &str,
        class: &ClassDescriptor,
        state: &InheritanceState,
        kind: EntityKind,
    ) -> Result<(), BindError> {
        if class.discriminator.is_some() {
            let reason = if kind != EntityKind::Root {
                Some("only the root of a hierarchy declares a discriminator")
            } else if state.strategy != Some(InheritanceStrategy::SingleTable) {
                Some("only single-table hierarchies use a discriminator")
            } else {
                None
            };
            if let Some(reason) = reason {
                self.registry.warn(BindWarning::DiscriminatorIgnored {
                    entity: name.to_string(),
                    reason: reason.to_string(),
                })?;
            }
        }
        if kind != EntityKind::JoinedChild {
            if !class.primary_key_join_columns.is_empty() {
                self.registry
                    .warn(BindWarning::PrimaryKeyJoinColumnsIgnored {
                        entity: name.to_string(),
                    })?;
            }
            if class.on_delete_cascade {
                self.registry.warn(BindWarning::OnDeleteIgnored {
                    entity: name.to_string(),
                })?;
            }
        }
        Ok(())
    }

    fn bind_discriminator(
        &mut self,
        name: &str,
        class: &ClassDescriptor,
        table: TableId,
    ) -> Result<Discriminator, BindError> {
        let spec = class.discriminator.clone().unwrap_or_default();
        if spec.column.is_some() && spec.formula.is_some() {
            return Err(BindError::DiscriminatorMisuse {
                entity: name.to_string(),
                reason: "both a column and a formula are declared".to_string(),
            });
        }
        let type_name = spec.type_name.unwrap_or_else(|| "string".to_string());
        let selectable = match spec.formula {
            Some(formula) => Selectable::Formula(formula),
            None => {
                let config = self.registry.config();
                let column = spec
                    .column
                    .unwrap_or_else(|| config.discriminator_column.clone());
                let length = spec.length.unwrap_or(config.discriminator_length);
                self.registry.table_mut(table).add_column(
                    Column::new(column.clone())
                        .nullable(false)
                        .with_length(Some(length)),
                );
                Selectable::Column(column)
            }
        };
        Ok(Discriminator {
            selectable,
            type_name,
            force: spec.force,
        })
    }

    /// Discriminator value of an entity in a single-table hierarchy with a discriminator.
    fn bind_discriminator_value(
        &mut self,
        name: &str,
        class: &ClassDescriptor,
        state: &InheritanceState,
        parent: Option<&Parent>,
        is_discriminated_root: bool,
    ) -> Result<Option<String>, BindError> {
        if state.strategy != Some(InheritanceStrategy::SingleTable) {
            return Ok(None);
        }
        let (root, discriminated) = match parent {
            None => (name.to_string(), is_discriminated_root),
            Some(parent) => (
                parent.root.clone(),
                self.registry
                    .entity(&parent.root)
                    .is_some_and(|r| r.discriminator.is_some()),
            ),
        };
        if !discriminated {
            return Ok(None);
        }
        let value = class
            .discriminator_value
            .clone()
            .unwrap_or_else(|| name.to_string());
        self.registry.add_discriminator_value(&root, &value, name)?;
        Ok(Some(value))
    }

    fn bind_secondary_tables(
        &mut self,
        name: &str,
        class: &ClassDescriptor,
    ) -> Result<(Vec<Join>, BTreeMap<String, TableId>), BindError> {
        let mut joins = Vec::new();
        let mut tables = BTreeMap::new();
        for spec in &class.secondary_tables {
            let table = self.registry.add_table(
                &spec.name,
                spec.schema.as_deref(),
                spec.catalog.as_deref(),
                false,
                None,
            )?;
            for unique in &spec.unique_constraints {
                self.registry.hold_unique_constraint(table, unique.clone());
            }
            tables.insert(spec.name.clone(), table);
            joins.push(Join {
                table,
                key_columns: Vec::new(),
            });
            self.queue
                .push(DeferredUnit::SecondaryTableFinalize(SecondaryTablePass {
                    entity: name.to_string(),
                    table,
                    pk_join_columns: spec.pk_join_columns.clone(),
                }));
        }
        Ok((joins, tables))
    }

    /// Queue type-definition resolution for the identifier and every basic or embedded property.
    fn queue_type_finalizers(
        &mut self,
        name: &str,
        identifier: Option<&Identifier>,
        properties: &[Property],
    ) {
        let has_basic = |value: &Value| matches!(value, Value::Simple(_) | Value::Component(_));
        if let Some(identifier) = identifier.filter(|i| has_basic(&i.value)) {
            let path = identifier.property.iter().cloned().collect();
            self.queue
                .push(DeferredUnit::SimpleTypeFinalize(SimpleTypePass::new(
                    ValuePath {
                        entity: name.to_string(),
                        in_identifier: true,
                        path,
                    },
                )));
        }
        for property in properties.iter().filter(|p| has_basic(&p.value)) {
            self.queue
                .push(DeferredUnit::SimpleTypeFinalize(SimpleTypePass::new(
                    ValuePath::property(name, property.name.clone()),
                )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{HierarchyOrderer, InheritanceStateCalculator};
    use crate::config::CompileConfig;
    use crate::deferred::UnitKind;
    use crate::source::{ColumnSpec, DiscriminatorSpec, IdentifierSpec, SecondaryTableSpec};

    fn id() -> IdentifierSpec {
        IdentifierSpec::simple(PropertySpec::basic("id", "long"))
    }

    fn bind(source: &MappingSource) -> Result<(Registry, DeferredWorkQueue), BindError> {
        let mut registry = Registry::new(CompileConfig::new());
        let mut queue = DeferredWorkQueue::new();
        let order = HierarchyOrderer::order(source)?;
        let states = InheritanceStateCalculator::compute(&order, source, &mut registry)?;
        EntityBinder::new(source, &order, &states, &mut registry, &mut queue).bind_all()?;
        Ok((registry, queue))
    }

    #[test]
    fn test_single_table_child_shares_root_table() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("Animal").with_identifier(id()))
            .with_class(
                ClassDescriptor::entity("Cat")
                    .extends("Animal")
                    .with_property(
                        PropertySpec::basic("lives", "int")
                            .with_column(ColumnSpec::named("lives").not_null()),
                    ),
            );
        let (registry, queue) = bind(&source).unwrap();

        let animal = registry.entity("Animal").unwrap();
        let cat = registry.entity("Cat").unwrap();
        assert_eq!(cat.kind, EntityKind::SingleTableChild);
        assert_eq!(cat.table, animal.table);
        assert_eq!(registry.tables().len(), 1);
        assert_eq!(animal.subclasses, vec!["Cat".to_string()]);

        // Subclass columns are nullable whatever the declaration says.
        assert!(registry.table(animal.table).column("lives").unwrap().nullable);
        assert!(registry.table(animal.table).has_column("DTYPE"));
        assert_eq!(cat.discriminator_value.as_deref(), Some("Cat"));
        assert_eq!(queue.count(UnitKind::KeyCreate), 1);
    }

    #[test]
    fn test_joined_child_queues_key_unit() {
        let source = MappingSource::new()
            .with_class(
                ClassDescriptor::entity("Animal")
                    .with_identifier(id())
                    .with_inheritance(InheritanceStrategy::Joined),
            )
            .with_class(ClassDescriptor::entity("Dog").extends("Animal"));
        let (registry, queue) = bind(&source).unwrap();

        let dog = registry.entity("Dog").unwrap();
        assert_eq!(dog.kind, EntityKind::JoinedChild);
        assert_ne!(dog.table, registry.entity("Animal").unwrap().table);
        assert!(!registry.is_key_settled(dog.table));
        assert_eq!(queue.count(UnitKind::ForeignKeyCreate), 1);
        assert!(registry.entity("Animal").unwrap().discriminator.is_none());
    }

    #[test]
    fn test_union_child_has_denormalized_table() {
        let source = MappingSource::new()
            .with_class(
                ClassDescriptor::entity("Payment")
                    .abstract_class()
                    .with_identifier(id())
                    .with_inheritance(InheritanceStrategy::TablePerClass),
            )
            .with_class(ClassDescriptor::entity("CardPayment").extends("Payment"));
        let (registry, _) = bind(&source).unwrap();

        let root = registry.entity("Payment").unwrap();
        let child = registry.entity("CardPayment").unwrap();
        assert_eq!(child.kind, EntityKind::UnionChild);
        assert!(registry.table(root.table).is_abstract);
        assert_eq!(registry.table(child.table).denormalized_from, Some(root.table));
    }

    #[test]
    fn test_table_constraints_on_single_table_child() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("Animal").with_identifier(id()))
            .with_class(
                ClassDescriptor::entity("Cat")
                    .extends("Animal")
                    .with_table(TableSpec::named("cat").with_unique(["name"])),
            );
        let err = bind(&source).unwrap_err();
        assert!(matches!(err, BindError::IllegalTable { .. }));
    }

    #[test]
    fn test_table_on_single_table_child_is_ignored() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("Animal").with_identifier(id()))
            .with_class(
                ClassDescriptor::entity("Cat")
                    .extends("Animal")
                    .with_table(TableSpec::named("cat"))
                    .with_discriminator(DiscriminatorSpec::default()),
            );
        let (registry, _) = bind(&source).unwrap();
        assert_eq!(registry.tables().len(), 1);
        assert!(matches!(
            registry.warnings(),
            [
                BindWarning::TableIgnored { .. },
                BindWarning::DiscriminatorIgnored { .. }
            ]
        ));
    }

    #[test]
    fn test_missing_identifier() {
        let source = MappingSource::new().with_class(ClassDescriptor::entity("Order"));
        let err = bind(&source).unwrap_err();
        assert_eq!(
            err,
            BindError::MissingIdentifier {
                entity: "Order".to_string()
            }
        );
    }

    #[test]
    fn test_identifier_on_subclass() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("Animal").with_identifier(id()))
            .with_class(ClassDescriptor::entity("Cat").extends("Animal").with_identifier(id()));
        let err = bind(&source).unwrap_err();
        assert!(matches!(err, BindError::IdentifierOnSubclass { .. }));
    }

    #[test]
    fn test_identifier_from_mapped_superclass() {
        let source = MappingSource::new()
            .with_class(
                ClassDescriptor::mapped_superclass("Base")
                    .with_identifier(id())
                    .with_property(PropertySpec::basic("version", "int")),
            )
            .with_class(ClassDescriptor::entity("Order").extends("Base"));
        let (registry, _) = bind(&source).unwrap();

        let order = registry.entity("Order").unwrap();
        assert_eq!(order.identifier.as_ref().unwrap().columns(), vec!["id".to_string()]);
        assert!(order.property("version").is_some());
        assert_eq!(order.shared_ancestor.as_deref(), Some("Base"));
        assert!(registry.shared_ancestor("Base").is_some());
    }

    #[test]
    fn test_unknown_id_class_property() {
        let source = MappingSource::new().with_class(
            ClassDescriptor::entity("Line")
                .with_identifier(IdentifierSpec::id_class("LineId", ["order", "number"]))
                .with_property(PropertySpec::basic("number", "int")),
        );
        let err = bind(&source).unwrap_err();
        assert_eq!(
            err,
            BindError::UnknownIdClassProperty {
                entity: "Line".to_string(),
                id_class: "LineId".to_string(),
                property: "order".to_string(),
            }
        );
    }

    #[test]
    fn test_id_class_properties_leave_regular_properties() {
        let source = MappingSource::new().with_class(
            ClassDescriptor::entity("Line")
                .with_identifier(IdentifierSpec::id_class("LineId", ["order_no", "number"]))
                .with_property(PropertySpec::basic("order_no", "long"))
                .with_property(PropertySpec::basic("number", "int"))
                .with_property(PropertySpec::basic("quantity", "int")),
        );
        let (registry, _) = bind(&source).unwrap();
        let line = registry.entity("Line").unwrap();
        assert_eq!(line.properties.len(), 1);
        assert_eq!(
            line.identifier.as_ref().unwrap().columns(),
            vec!["order_no".to_string(), "number".to_string()]
        );
    }

    #[test]
    fn test_discriminator_column_and_formula() {
        let source = MappingSource::new().with_class(
            ClassDescriptor::entity("Animal")
                .with_identifier(id())
                .with_discriminator(DiscriminatorSpec {
                    column: Some("kind".to_string()),
                    formula: Some("upper(kind)".to_string()),
                    ..Default::default()
                }),
        );
        let err = bind(&source).unwrap_err();
        assert!(matches!(err, BindError::DiscriminatorMisuse { .. }));
    }

    #[test]
    fn test_duplicate_discriminator_value() {
        let source = MappingSource::new()
            .with_class(ClassDescriptor::entity("Animal").with_identifier(id()))
            .with_class(
                ClassDescriptor::entity("Cat")
                    .extends("Animal")
                    .with_discriminator_value("X"),
            )
            .with_class(
                ClassDescriptor::entity("Dog")
                    .extends("Animal")
                    .with_discriminator_value("X"),
            );
        let err = bind(&source).unwrap_err();
        assert!(matches!(err, BindError::DuplicateDiscriminatorValue { .. }));
    }

    #[test]
    fn test_secondary_table_placement() {
        let source = MappingSource::new().with_class(
            ClassDescriptor::entity("Customer")
                .with_identifier(id())
                .with_secondary_table(SecondaryTableSpec::new("customer_details"))
                .with_property(
                    PropertySpec::basic("notes", "string")
                        .with_column(ColumnSpec::named("notes").in_table("customer_details")),
                ),
        );
        let (registry, queue) = bind(&source).unwrap();
        let customer = registry.entity("Customer").unwrap();
        assert_eq!(customer.joins.len(), 1);
        let details = customer.joins[0].table;
        assert!(registry.table(details).has_column("notes"));
        assert!(!registry.table(customer.table).has_column("notes"));
        assert_eq!(queue.count(UnitKind::SecondaryTableFinalize), 1);
    }

    #[test]
    fn test_pk_join_columns_ignored_outside_joined() {
        let source = MappingSource::new().with_class(
            ClassDescriptor::entity("Order")
                .with_identifier(id())
                .with_primary_key_join_columns(["order_id"])
                .with_on_delete_cascade(),
        );
        let (registry, _) = bind(&source).unwrap();
        assert_eq!(registry.warnings().len(), 2);
    }
}
