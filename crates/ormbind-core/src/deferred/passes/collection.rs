//! Collection binding: collection tables, key and element columns, index and map-key columns.

use tracing::trace;

use crate::binder::SyntheticReferenceBuilder;
use crate::error::{BindError, Failure};
use crate::model::{
    CollectionElement, Column, ForeignKey, MapKey, TableId, Value,
};
use crate::registry::Registry;
use crate::source::{CollectionKind, CollectionSpec, JoinColumnSpec, MapKeySpec};

use super::super::unit::ValuePath;
use super::foreign_key::copy_columns;

/// Collection flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionFlavor {
    /// Entities owned through a foreign key or a join table.
    OneToMany,
    /// Entities linked through a join table.
    ManyToMany,
    /// Basic values in a collection table.
    Elements,
}

/// Binds a collection once its owner's key and its element entity are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPass {
    /// Location of the collection value.
    pub value: ValuePath,
    /// Role (`Entity.property`).
    pub role: String,
    /// Table of the owning entity.
    pub owner_table: TableId,
    /// Collection flavor.
    pub flavor: CollectionFlavor,
    /// Declared collection.
    pub spec: CollectionSpec,
}

/// Where the collection rows live.
enum Layout {
    /// Managed by the owning side on the element entity.
    Inverse {
        table: TableId,
        key_columns: Vec<String>,
        element: CollectionElement,
    },
    /// Foreign key held in the element entity's table.
    ForeignKey {
        table: TableId,
        element_entity: String,
        element_key: Vec<String>,
        key_columns: Vec<Column>,
    },
    /// Dedicated collection table.
    CollectionTable {
        name: String,
        schema: Option<String>,
        key_columns: Vec<Column>,
        element: ElementPlan,
    },
}

/// Element columns of a collection table.
enum ElementPlan {
    Entity {
        entity: String,
        table: TableId,
        referenced: Vec<String>,
        columns: Vec<Column>,
        unique: bool,
    },
    Basic {
        column: Column,
        type_name: Option<String>,
    },
}

/// Map key computed before anything is modified.
enum MapKeyPlan {
    Basic(Column),
    Entity {
        entity: String,
        table: TableId,
        referenced: Vec<String>,
        columns: Vec<Column>,
    },
}

impl CollectionPass {
    /// Bind the collection.
    pub fn resolve(&self, registry: &mut Registry) -> Result<(), Failure> {
        let owner = registry
            .entity(&self.value.entity)
            .ok_or_else(|| BindError::Internal {
                path: self.role.clone(),
                message: "owner not registered".to_string(),
            })?;
        let owner_name = owner.name.clone();
        let owner_key = registry
            .settled_key(self.owner_table)
            .map_err(Failure::Recoverable)?;

        let layout = self.plan_layout(registry, &owner_name, &owner_key)?;
        let map_key = self.plan_map_key(registry)?;

        // Everything below may modify the registry; no retryable failure past this point.
        let (owner_referenced, referenced_property) =
            self.owner_reference(registry, &owner_name, &owner_key)?;

        let (table, key_columns, element, inverse) = match layout {
            Layout::Inverse {
                table,
                key_columns,
                element,
            } => (table, key_columns, element, true),
            Layout::ForeignKey {
                table,
                element_entity,
                element_key,
                key_columns,
            } => {
                let names = column_names(&key_columns);
                let constraint = format!("fk_{}_{}", registry.table(table).name, self.value.leaf());
                let t = registry.table_mut(table);
                for column in key_columns {
                    t.add_column(column);
                }
                t.add_foreign_key(ForeignKey {
                    name: constraint,
                    columns: names.clone(),
                    referenced_entity: owner_name.clone(),
                    referenced_table: Some(self.owner_table),
                    referenced_columns: owner_referenced.clone(),
                    cascade_delete: false,
                });
                let element = CollectionElement::Entity {
                    entity: element_entity,
                    columns: element_key,
                    one_to_many: true,
                };
                (table, names, element, false)
            }
            Layout::CollectionTable {
                name,
                schema,
                key_columns,
                element,
            } => {
                let table = registry.add_table(&name, schema.as_deref(), None, false, None)?;
                let names = column_names(&key_columns);
                let t = registry.table_mut(table);
                for column in key_columns {
                    t.add_column(column);
                }
                t.add_foreign_key(ForeignKey {
                    name: format!("fk_{}_{}", name, owner_name),
                    columns: names.clone(),
                    referenced_entity: owner_name.clone(),
                    referenced_table: Some(self.owner_table),
                    referenced_columns: owner_referenced.clone(),
                    cascade_delete: false,
                });
                let element = match element {
                    ElementPlan::Entity {
                        entity,
                        table: element_table,
                        referenced,
                        columns,
                        unique,
                    } => {
                        let element_names = column_names(&columns);
                        for column in columns {
                            t.add_column(column);
                        }
                        t.add_foreign_key(ForeignKey {
                            name: format!("fk_{}_{}", name, self.value.leaf()),
                            columns: element_names.clone(),
                            referenced_entity: entity.clone(),
                            referenced_table: Some(element_table),
                            referenced_columns: referenced,
                            cascade_delete: false,
                        });
                        if unique {
                            t.add_unique_key(None, element_names.clone());
                        }
                        CollectionElement::Entity {
                            entity,
                            columns: element_names,
                            one_to_many: false,
                        }
                    }
                    ElementPlan::Basic { column, type_name } => {
                        let name = column.name.clone();
                        t.add_column(column);
                        CollectionElement::Basic {
                            column: name,
                            type_name,
                        }
                    }
                };
                (table, names, element, false)
            }
        };

        let index_columns = self.bind_index_column(registry, table, inverse);
        let map_key = map_key.map(|plan| self.bind_map_key(registry, table, plan));
        if !inverse {
            self.bind_collection_key(registry, table, &key_columns, &element, &index_columns, &map_key);
        }

        match registry
            .entity_mut(&self.value.entity)
            .and_then(|e| e.value_mut(self.value.in_identifier, &self.value.path))
        {
            Some(Value::Collection(collection)) => {
                collection.table = Some(table);
                collection.key_columns = key_columns;
                collection.element = element;
                collection.inverse = inverse;
                collection.index_columns = index_columns;
                collection.map_key = map_key;
                collection.referenced_property = referenced_property;
            }
            _ => {
                return Err(BindError::Internal {
                    path: self.role.clone(),
                    message: "collection value not bound".to_string(),
                }
                .into())
            }
        }
        trace!(role = %self.role, "collection bound");
        Ok(())
    }

    fn plan_layout(
        &self,
        registry: &Registry,
        owner_name: &str,
        owner_key: &[String],
    ) -> Result<Layout, Failure> {
        let naming = registry.config().naming;
        let owner_table_name = registry.table(self.owner_table).name.clone();
        let property = self.value.leaf();

        if self.flavor == CollectionFlavor::Elements {
            let join_table = self.spec.join_table.clone().unwrap_or_default();
            let key_columns = self.key_columns(registry, &join_table.join_columns, owner_key, owner_name)?;
            let element_name = self
                .spec
                .element_column
                .clone()
                .unwrap_or_else(|| naming.column_name(property));
            return Ok(Layout::CollectionTable {
                name: join_table
                    .name
                    .unwrap_or_else(|| naming.join_table_name(&owner_table_name, property)),
                schema: join_table.schema,
                key_columns,
                element: ElementPlan::Basic {
                    column: Column::new(element_name).nullable(false),
                    type_name: self.spec.element_type.clone(),
                },
            });
        }

        let target_name = self.spec.target.as_deref().ok_or_else(|| BindError::UnsupportedMapping {
            path: self.role.clone(),
            reason: "entity collection without a target entity".to_string(),
        })?;
        let target = registry.require_entity(target_name, &self.role)?;
        let target_table = target.table;

        if let Some(mapped_by) = &self.spec.mapped_by {
            return self.plan_inverse(registry, target_name, mapped_by);
        }

        let element_key = registry
            .settled_key(target_table)
            .map_err(Failure::Recoverable)?;

        if self.flavor == CollectionFlavor::OneToMany
            && self.spec.join_table.is_none()
            && !self.spec.join_columns.is_empty()
        {
            let key_columns = self.key_columns(registry, &self.spec.join_columns, owner_key, owner_name)?;
            return Ok(Layout::ForeignKey {
                table: target_table,
                element_entity: target_name.to_string(),
                element_key,
                key_columns: key_columns
                    .into_iter()
                    .map(|c| c.nullable(true))
                    .collect(),
            });
        }

        let join_table = self.spec.join_table.clone().unwrap_or_default();
        let key_columns = self.key_columns(registry, &join_table.join_columns, owner_key, owner_name)?;
        let inverse_columns = &join_table.inverse_join_columns;
        if !inverse_columns.is_empty() && inverse_columns.len() != element_key.len() {
            return Err(BindError::ForeignKeyColumnCount {
                path: self.role.clone(),
                expected: element_key.len(),
                found: inverse_columns.len(),
            }
            .into());
        }
        let element_names: Vec<String> = element_key
            .iter()
            .enumerate()
            .map(|(i, col)| {
                inverse_columns
                    .get(i)
                    .and_then(|jc| jc.name.clone())
                    .unwrap_or_else(|| naming.foreign_key_column_name(property, col))
            })
            .collect();
        let columns = copy_columns(registry, target_table, &element_key, &element_names, false);
        let target_table_name = registry.table(target_table).name.clone();

        Ok(Layout::CollectionTable {
            name: join_table
                .name
                .unwrap_or_else(|| naming.join_table_name(&owner_table_name, &target_table_name)),
            schema: join_table.schema,
            key_columns,
            element: ElementPlan::Entity {
                entity: target_name.to_string(),
                table: target_table,
                referenced: element_key,
                columns,
                unique: self.flavor == CollectionFlavor::OneToMany,
            },
        })
    }

    fn plan_inverse(
        &self,
        registry: &Registry,
        target_name: &str,
        mapped_by: &str,
    ) -> Result<Layout, Failure> {
        let unknown = || BindError::UnknownMappedBy {
            path: self.role.clone(),
            target: target_name.to_string(),
            property: mapped_by.to_string(),
        };
        let pending = || {
            Failure::Recoverable(BindError::MappedByPending {
                path: self.role.clone(),
                target: target_name.to_string(),
                property: mapped_by.to_string(),
            })
        };
        let (_, property) = registry
            .find_property(target_name, mapped_by)
            .ok_or_else(unknown)?;

        match (&property.value, self.flavor) {
            (Value::ToOne(to_one), CollectionFlavor::OneToMany) => {
                if !to_one.resolved {
                    return Err(pending());
                }
                let element_key = registry
                    .settled_key(registry.require_entity(target_name, &self.role)?.table)
                    .map_err(Failure::Recoverable)?;
                Ok(Layout::Inverse {
                    table: to_one.table,
                    key_columns: to_one.columns.clone(),
                    element: CollectionElement::Entity {
                        entity: target_name.to_string(),
                        columns: element_key,
                        one_to_many: true,
                    },
                })
            }
            (Value::Collection(other), CollectionFlavor::ManyToMany) => {
                let Some(table) = other.table else {
                    return Err(pending());
                };
                let CollectionElement::Entity { columns, .. } = &other.element else {
                    return Err(unknown().into());
                };
                Ok(Layout::Inverse {
                    table,
                    key_columns: columns.clone(),
                    element: CollectionElement::Entity {
                        entity: target_name.to_string(),
                        columns: other.key_columns.clone(),
                        one_to_many: false,
                    },
                })
            }
            _ => Err(unknown().into()),
        }
    }

    /// Owner key columns of a collection or join table.
    fn key_columns(
        &self,
        registry: &Registry,
        declared: &[JoinColumnSpec],
        owner_key: &[String],
        owner_name: &str,
    ) -> Result<Vec<Column>, Failure> {
        let referenced = self.owner_referenced_columns(declared, owner_key);
        if !declared.is_empty() && declared.len() != referenced.len() {
            return Err(BindError::ForeignKeyColumnCount {
                path: self.role.clone(),
                expected: referenced.len(),
                found: declared.len(),
            }
            .into());
        }
        let naming = registry.config().naming;
        let names: Vec<String> = referenced
            .iter()
            .enumerate()
            .map(|(i, col)| {
                declared
                    .get(i)
                    .and_then(|jc| jc.name.clone())
                    .unwrap_or_else(|| naming.foreign_key_column_name(owner_name, col))
            })
            .collect();
        let sources: Vec<TableId> = registry
            .lineage(owner_name)
            .iter()
            .flat_map(|e| e.tables().collect::<Vec<_>>())
            .collect();
        Ok(referenced
            .iter()
            .zip(names)
            .map(|(col, name)| {
                match sources.iter().find_map(|&t| registry.find_column(t, col)) {
                    Some(column) => column.renamed(name).nullable(false),
                    None => Column::new(name).nullable(false),
                }
            })
            .collect())
    }

    /// Owner columns the collection key references: explicit referenced columns when every
    /// declared join column names one, the owner's primary key otherwise.
    fn owner_referenced_columns(&self, declared: &[JoinColumnSpec], owner_key: &[String]) -> Vec<String> {
        let explicit: Vec<String> = declared
            .iter()
            .filter_map(|jc| jc.referenced_column.clone())
            .collect();
        if !explicit.is_empty() && explicit.len() == declared.len() {
            explicit
        } else {
            owner_key.to_vec()
        }
    }

    /// Owner-side reference, creating a synthetic property for non-primary-key references.
    fn owner_reference(
        &self,
        registry: &mut Registry,
        owner_name: &str,
        owner_key: &[String],
    ) -> Result<(Vec<String>, Option<String>), Failure> {
        if self.spec.mapped_by.is_some() {
            return Ok((owner_key.to_vec(), None));
        }
        let declared = match &self.spec.join_table {
            Some(join_table) => join_table.join_columns.as_slice(),
            None => self.spec.join_columns.as_slice(),
        };
        let referenced = self.owner_referenced_columns(declared, owner_key);
        if referenced == owner_key {
            return Ok((referenced, None));
        }
        let synthetic = SyntheticReferenceBuilder::new(registry).build(
            owner_name,
            self.value.leaf(),
            owner_name,
            &referenced,
            false,
        )?;
        Ok((synthetic.columns, Some(synthetic.property)))
    }

    fn plan_map_key(&self, registry: &Registry) -> Result<Option<MapKeyPlan>, Failure> {
        if self.spec.kind != CollectionKind::Map {
            return Ok(None);
        }
        let naming = registry.config().naming;
        let property = self.value.leaf();
        match &self.spec.map_key {
            None => Ok(Some(MapKeyPlan::Basic(
                Column::new(format!("{}_KEY", naming.column_name(property))).nullable(false),
            ))),
            Some(MapKeySpec::Basic { column, type_name }) => Ok(Some(MapKeyPlan::Basic(
                Column::new(
                    column
                        .clone()
                        .unwrap_or_else(|| format!("{}_KEY", naming.column_name(property))),
                )
                .with_sql_type(type_name.clone())
                .nullable(false),
            ))),
            Some(MapKeySpec::Entity {
                target,
                join_columns,
            }) => {
                let table = registry.require_entity(target, &self.role)?.table;
                let referenced = registry.settled_key(table).map_err(Failure::Recoverable)?;
                if !join_columns.is_empty() && join_columns.len() != referenced.len() {
                    return Err(BindError::ForeignKeyColumnCount {
                        path: self.role.clone(),
                        expected: referenced.len(),
                        found: join_columns.len(),
                    }
                    .into());
                }
                let names: Vec<String> = referenced
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        join_columns
                            .get(i)
                            .and_then(|jc| jc.name.clone())
                            .unwrap_or_else(|| {
                                naming.foreign_key_column_name(&format!("{}_KEY", property), col)
                            })
                    })
                    .collect();
                let columns = copy_columns(registry, table, &referenced, &names, false);
                Ok(Some(MapKeyPlan::Entity {
                    entity: target.clone(),
                    table,
                    referenced,
                    columns,
                }))
            }
        }
    }

    fn bind_map_key(&self, registry: &mut Registry, table: TableId, plan: MapKeyPlan) -> MapKey {
        match plan {
            MapKeyPlan::Basic(column) => {
                let name = column.name.clone();
                registry.table_mut(table).add_column(column);
                MapKey::Basic { column: name }
            }
            MapKeyPlan::Entity {
                entity,
                table: key_table,
                referenced,
                columns,
            } => {
                let names = column_names(&columns);
                let t = registry.table_mut(table);
                let constraint = format!("fk_{}_{}_key", t.name, self.value.leaf());
                for column in columns {
                    t.add_column(column);
                }
                t.add_foreign_key(ForeignKey {
                    name: constraint,
                    columns: names.clone(),
                    referenced_entity: entity.clone(),
                    referenced_table: Some(key_table),
                    referenced_columns: referenced,
                    cascade_delete: false,
                });
                MapKey::Entity {
                    entity,
                    columns: names,
                }
            }
        }
    }

    fn bind_index_column(&self, registry: &mut Registry, table: TableId, inverse: bool) -> Vec<String> {
        if self.spec.kind != CollectionKind::List {
            return Vec::new();
        }
        let name = self.spec.order_column.clone().unwrap_or_else(|| {
            format!("{}_ORDER", registry.config().naming.column_name(self.value.leaf()))
        });
        registry
            .table_mut(table)
            .add_column(Column::new(name.clone()).nullable(inverse));
        vec![name]
    }

    /// Primary key of a dedicated collection table (sets, lists and maps only).
    fn bind_collection_key(
        &self,
        registry: &mut Registry,
        table: TableId,
        key_columns: &[String],
        element: &CollectionElement,
        index_columns: &[String],
        map_key: &Option<MapKey>,
    ) {
        let is_collection_table = match element {
            CollectionElement::Entity { one_to_many, .. } => !one_to_many,
            CollectionElement::Basic { .. } => true,
            CollectionElement::Unresolved => false,
        };
        if !is_collection_table {
            return;
        }
        let mut columns = key_columns.to_vec();
        match self.spec.kind {
            CollectionKind::Bag => return,
            CollectionKind::Set => match element {
                CollectionElement::Entity { columns: e, .. } => columns.extend(e.iter().cloned()),
                CollectionElement::Basic { column, .. } => columns.push(column.clone()),
                CollectionElement::Unresolved => {}
            },
            CollectionKind::List => columns.extend(index_columns.iter().cloned()),
            CollectionKind::Map => match map_key {
                Some(MapKey::Basic { column }) => columns.push(column.clone()),
                Some(MapKey::Entity { columns: k, .. }) => columns.extend(k.iter().cloned()),
                None => {}
            },
        }
        registry.table_mut(table).set_primary_key(columns);
    }
}

fn column_names(columns: &[Column]) -> Vec<String> {
    columns.iter().map(|c| c.name.clone()).collect()
}
