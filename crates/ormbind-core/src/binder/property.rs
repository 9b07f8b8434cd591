//! Phase-one property binding.
//!
//! Basic, embedded and any-valued properties are bound in place. Associations and collections
//! get a placeholder value and a deferred unit that completes them once their target exists.

use std::collections::BTreeMap;

use crate::deferred::passes::{
    CollectionFlavor, CollectionPass, ForeignKeyPass, ForeignKeyTarget, InverseOneToOnePass,
};
use crate::deferred::{DeferredUnit, DeferredWorkQueue, GenericPass, ValuePath};
use crate::error::BindError;
use crate::model::{
    AnyValue, Collection, CollectionElement, Column, Component, Property, Selectable,
    SimpleValue, TableId, ToOne, ToOneKind, Value,
};
use crate::registry::Registry;
use crate::source::{
    AccessKind, AssociationSpec, CollectionSpec, ColumnSpec, PropertyKind, PropertySpec,
};

/// Binds the properties of one entity.
pub(crate) struct PropertyBinder<'a> {
    pub registry: &'a mut Registry,
    pub queue: &'a mut DeferredWorkQueue,
    /// Entity the properties belong to.
    pub entity: String,
    /// Entity table; collections are keyed on it.
    pub table: TableId,
    /// Secondary tables by declared name.
    pub secondary_tables: BTreeMap<String, TableId>,
    /// Columns are nullable whatever the declaration says (single-table subclasses).
    pub force_nullable: bool,
    pub default_access: AccessKind,
}

impl PropertyBinder<'_> {
    /// Bind a property at `path` whose columns default to `table`.
    pub fn bind(
        &mut self,
        spec: &PropertySpec,
        path: ValuePath,
        table: TableId,
    ) -> Result<Property, BindError> {
        let value = match &spec.kind {
            PropertyKind::Basic => self.bind_basic(spec, &path, table)?,
            PropertyKind::Embedded {
                class_name,
                properties,
            } => {
                let mut bound = Vec::with_capacity(properties.len());
                for nested in properties {
                    bound.push(self.bind(nested, path.child(nested.name.clone()), table)?);
                }
                Value::Component(Component {
                    table,
                    class_name: class_name.clone(),
                    properties: bound,
                    embedded: true,
                })
            }
            PropertyKind::ManyToOne(association) => {
                self.bind_to_one(association, ToOneKind::ManyToOne, &path, table)?
            }
            PropertyKind::OneToOne(association) => {
                self.bind_to_one(association, ToOneKind::OneToOne, &path, table)?
            }
            PropertyKind::OneToMany(collection) => {
                self.bind_collection(collection, CollectionFlavor::OneToMany, &path)?
            }
            PropertyKind::ManyToMany(collection) => {
                self.bind_collection(collection, CollectionFlavor::ManyToMany, &path)?
            }
            PropertyKind::ElementCollection(collection) => {
                self.bind_collection(collection, CollectionFlavor::Elements, &path)?
            }
            PropertyKind::Any(any) => {
                let naming = self.registry.config().naming;
                let column = naming.column_name(&spec.name);
                let meta_column = any
                    .meta_column
                    .clone()
                    .unwrap_or_else(|| format!("{}_TYPE", column));
                let id_columns = if any.id_columns.is_empty() {
                    vec![format!("{}_ID", column)]
                } else {
                    any.id_columns.clone()
                };
                let nullable = self.nullable(true, &path);
                let t = self.registry.table_mut(table);
                t.add_column(
                    Column::new(meta_column.clone())
                        .nullable(nullable)
                        .with_sql_type(any.meta_type.clone()),
                );
                for id_column in &id_columns {
                    t.add_column(Column::new(id_column.clone()).nullable(nullable));
                }
                Value::Any(AnyValue {
                    table,
                    meta_column,
                    id_columns,
                    id_type: any.id_type.clone(),
                })
            }
        };

        let mut property = Property::new(
            spec.name.clone(),
            spec.access.unwrap_or(self.default_access),
            value,
        );
        property.insertable = spec.insertable;
        property.updatable = spec.updatable;
        property.optional = spec.optional && !path.in_identifier;
        property.cascade = spec.cascade().to_vec();
        Ok(property)
    }

    fn bind_basic(
        &mut self,
        spec: &PropertySpec,
        path: &ValuePath,
        table: TableId,
    ) -> Result<Value, BindError> {
        if let Some(formula) = &spec.formula {
            return Ok(Value::Simple(SimpleValue {
                table,
                selectables: vec![Selectable::Formula(formula.clone())],
                type_name: spec.type_name.clone(),
                type_params: BTreeMap::new(),
            }));
        }

        let declared = if spec.columns.is_empty() {
            vec![ColumnSpec::default()]
        } else {
            spec.columns.clone()
        };
        let naming = self.registry.config().naming;
        let mut value_table = None;
        let mut selectables = Vec::with_capacity(declared.len());
        for column in &declared {
            let target = match &column.table {
                Some(name) => self.secondary_table(name, path)?,
                None => table,
            };
            value_table.get_or_insert(target);
            let name = column
                .name
                .clone()
                .unwrap_or_else(|| naming.column_name(&spec.name));
            let nullable = self.nullable(column.nullable, path);
            self.registry.table_mut(target).add_column(
                Column::new(name.clone())
                    .nullable(nullable)
                    .unique(column.unique)
                    .with_sql_type(column.sql_type.clone())
                    .with_length(column.length),
            );
            selectables.push(Selectable::Column(name));
        }

        Ok(Value::Simple(SimpleValue {
            table: value_table.unwrap_or(table),
            selectables,
            type_name: spec.type_name.clone(),
            type_params: BTreeMap::new(),
        }))
    }

    fn bind_to_one(
        &mut self,
        association: &AssociationSpec,
        kind: ToOneKind,
        path: &ValuePath,
        table: TableId,
    ) -> Result<Value, BindError> {
        let to_one = ToOne {
            table,
            columns: Vec::new(),
            referenced_entity: association.target.clone(),
            referenced_property: association.referenced_property.clone(),
            kind,
            foreign_key: association.foreign_key.clone(),
            unique: kind == ToOneKind::OneToOne,
            mapped_by: association.mapped_by.clone(),
            resolved: false,
        };

        if let Some(mapped_by) = &association.mapped_by {
            if path.in_identifier {
                return Err(BindError::UnsupportedMapping {
                    path: path.display(),
                    reason: "an inverse one-to-one cannot be part of an identifier".to_string(),
                });
            }
            self.queue
                .push(DeferredUnit::Generic(GenericPass::InverseOneToOne(
                    InverseOneToOnePass {
                        value: path.clone(),
                        target: association.target.clone(),
                        mapped_by: mapped_by.clone(),
                    },
                )));
            return Ok(Value::ToOne(to_one));
        }

        if path.in_identifier {
            self.registry.mark_key_pending(table);
        }
        self.queue.push(DeferredUnit::ForeignKeyCreate(ForeignKeyPass {
            owner: self.entity.clone(),
            path: path.display(),
            in_primary_key: path.in_identifier,
            referenced_entity: association.target.clone(),
            dependent_table: table,
            target: ForeignKeyTarget::Association {
                value: path.clone(),
                join_columns: association.join_columns.clone(),
                referenced_property: association.referenced_property.clone(),
                foreign_key: association.foreign_key.clone(),
                unique: kind == ToOneKind::OneToOne,
            },
        }));
        Ok(Value::ToOne(to_one))
    }

    fn bind_collection(
        &mut self,
        collection: &CollectionSpec,
        flavor: CollectionFlavor,
        path: &ValuePath,
    ) -> Result<Value, BindError> {
        if path.in_identifier {
            return Err(BindError::UnsupportedMapping {
                path: path.display(),
                reason: "a collection cannot be part of an identifier".to_string(),
            });
        }
        let role = path.display();
        self.queue
            .push(DeferredUnit::Generic(GenericPass::Collection(CollectionPass {
                value: path.clone(),
                role: role.clone(),
                owner_table: self.table,
                flavor,
                spec: collection.clone(),
            })));
        Ok(Value::Collection(Collection {
            role,
            kind: collection.kind,
            table: None,
            key_columns: Vec::new(),
            element: CollectionElement::Unresolved,
            inverse: collection.mapped_by.is_some(),
            mapped_by: collection.mapped_by.clone(),
            index_columns: Vec::new(),
            map_key: None,
            referenced_property: None,
        }))
    }

    fn secondary_table(&self, name: &str, path: &ValuePath) -> Result<TableId, BindError> {
        self.secondary_tables
            .get(name)
            .copied()
            .ok_or_else(|| BindError::UnsupportedMapping {
                path: path.display(),
                reason: format!("cannot find the expected secondary table {}", name),
            })
    }

    fn nullable(&self, declared: bool, path: &ValuePath) -> bool {
        if path.in_identifier {
            false
        } else {
            declared || self.force_nullable
        }
    }
}
