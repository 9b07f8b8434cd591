//! Foreign key creation for to-one associations and joined subclasses.

use tracing::trace;

use crate::binder::SyntheticReferenceBuilder;
use crate::error::{BindError, Failure};
use crate::model::{Column, ForeignKey, TableId, Value};
use crate::registry::Registry;
use crate::source::JoinColumnSpec;

use super::super::unit::ValuePath;

/// What a foreign-key unit creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKeyTarget {
    /// Key columns, primary key and parent foreign key of a joined subclass table.
    JoinedSubclass {
        /// Explicit key column names.
        pk_join_columns: Vec<String>,
        /// Cascade deletes from the parent table.
        cascade_delete: bool,
    },
    /// Columns and foreign key of an owning to-one association.
    Association {
        /// Location of the to-one value.
        value: ValuePath,
        /// Declared join columns.
        join_columns: Vec<JoinColumnSpec>,
        /// Referenced target property.
        referenced_property: Option<String>,
        /// Constraint name.
        foreign_key: Option<String>,
        /// The association is one-to-one.
        unique: bool,
    },
}

/// Creates a foreign key once the referenced entity's key is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyPass {
    /// Entity owning the foreign key.
    pub owner: String,
    /// `Entity.property` path (the entity name for joined subclasses).
    pub path: String,
    /// The foreign key completes the owner table's primary key.
    pub in_primary_key: bool,
    /// Referenced entity.
    pub referenced_entity: String,
    /// Table holding the foreign-key columns.
    pub dependent_table: TableId,
    /// What to create.
    pub target: ForeignKeyTarget,
}

/// Columns and references computed before anything is modified.
struct Plan {
    referenced_table: TableId,
    referenced_columns: Vec<String>,
    referenced_property: Option<String>,
    columns: Vec<Column>,
}

impl ForeignKeyPass {
    /// Table the foreign key points at, when the referenced entity exists.
    pub fn referenced_table(&self, registry: &Registry) -> Option<TableId> {
        registry.entity(&self.referenced_entity).map(|e| e.table)
    }

    /// Create the foreign key.
    pub fn resolve(&self, registry: &mut Registry) -> Result<(), Failure> {
        match &self.target {
            ForeignKeyTarget::JoinedSubclass {
                pk_join_columns,
                cascade_delete,
            } => self.resolve_joined_subclass(registry, pk_join_columns, *cascade_delete),
            ForeignKeyTarget::Association { .. } => self.resolve_association(registry),
        }
    }

    fn resolve_joined_subclass(
        &self,
        registry: &mut Registry,
        pk_join_columns: &[String],
        cascade_delete: bool,
    ) -> Result<(), Failure> {
        let parent = registry.require_entity(&self.referenced_entity, &self.path)?;
        let parent_table = parent.table;
        let parent_key = registry
            .settled_key(parent_table)
            .map_err(Failure::Recoverable)?;

        let names = if pk_join_columns.is_empty() {
            parent_key.clone()
        } else {
            pk_join_columns.to_vec()
        };
        if names.len() != parent_key.len() {
            return Err(BindError::ForeignKeyColumnCount {
                path: self.path.clone(),
                expected: parent_key.len(),
                found: names.len(),
            }
            .into());
        }
        let columns = copy_columns(registry, parent_table, &parent_key, &names, false);

        let name = format!(
            "fk_{}_{}",
            registry.table(self.dependent_table).name,
            registry.table(parent_table).name
        );
        let table = registry.table_mut(self.dependent_table);
        for column in columns {
            table.add_column(column);
        }
        table.set_primary_key(names.clone());
        table.add_foreign_key(ForeignKey {
            name,
            columns: names.clone(),
            referenced_entity: self.referenced_entity.clone(),
            referenced_table: Some(parent_table),
            referenced_columns: parent_key,
            cascade_delete,
        });
        if let Some(entity) = registry.entity_mut(&self.owner) {
            entity.key_columns = names;
        }
        registry.settle_key(self.dependent_table);
        trace!(entity = %self.owner, "joined subclass key created");
        Ok(())
    }

    fn resolve_association(&self, registry: &mut Registry) -> Result<(), Failure> {
        let ForeignKeyTarget::Association {
            value,
            join_columns,
            referenced_property,
            foreign_key,
            unique,
        } = &self.target
        else {
            return Ok(());
        };

        let plan = self.plan_association(registry, value, join_columns, referenced_property)?;
        let names: Vec<String> = plan.columns.iter().map(|c| c.name.clone()).collect();

        let table_name = registry.table(self.dependent_table).name.clone();
        let constraint = foreign_key
            .clone()
            .unwrap_or_else(|| format!("fk_{}_{}", table_name, value.path.join("_")));
        let table = registry.table_mut(self.dependent_table);
        for column in plan.columns {
            let single_unique = *unique && names.len() == 1;
            table.add_column(column.unique(single_unique));
        }
        if *unique && names.len() > 1 {
            table.add_unique_key(None, names.clone());
        }
        table.add_foreign_key(ForeignKey {
            name: constraint.clone(),
            columns: names.clone(),
            referenced_entity: self.referenced_entity.clone(),
            referenced_table: Some(plan.referenced_table),
            referenced_columns: plan.referenced_columns,
            cascade_delete: false,
        });
        if self.in_primary_key {
            table.extend_primary_key(&names);
        }

        if let Some(property) = &plan.referenced_property {
            registry.add_property_reference(self.referenced_entity.clone(), property.clone(), true);
        }
        match registry
            .entity_mut(&value.entity)
            .and_then(|e| e.value_mut(value.in_identifier, &value.path))
        {
            Some(Value::ToOne(to_one)) => {
                to_one.columns = names;
                to_one.foreign_key = Some(constraint);
                to_one.referenced_property = plan.referenced_property;
                to_one.resolved = true;
            }
            _ => {
                return Err(BindError::Internal {
                    path: self.path.clone(),
                    message: "to-one value not bound".to_string(),
                }
                .into())
            }
        }
        if self.in_primary_key {
            registry.settle_key(self.dependent_table);
        }
        trace!(path = %self.path, "foreign key created");
        Ok(())
    }

    /// Work out referenced and referencing columns without modifying anything but the
    /// synthetic property a non-primary-key reference needs.
    fn plan_association(
        &self,
        registry: &mut Registry,
        value: &ValuePath,
        join_columns: &[JoinColumnSpec],
        referenced_property: &Option<String>,
    ) -> Result<Plan, Failure> {
        let target = registry.require_entity(&self.referenced_entity, &self.path)?;
        let target_table = target.table;

        let explicit_refs: Vec<String> = join_columns
            .iter()
            .filter_map(|jc| jc.referenced_column.clone())
            .collect();
        if !explicit_refs.is_empty() && explicit_refs.len() != join_columns.len() {
            return Err(BindError::UnsupportedMapping {
                path: self.path.clone(),
                reason: "either every join column or none names a referenced column".to_string(),
            }
            .into());
        }

        let (referenced_columns, referenced_property) = match referenced_property {
            Some(property) if !registry.is_identifier_property(&self.referenced_entity, property) => {
                let (_, found) = registry
                    .find_property(&self.referenced_entity, property)
                    .ok_or_else(|| BindError::UnknownProperty {
                        entity: self.referenced_entity.clone(),
                        property: property.clone(),
                    })?;
                let columns = found.value.columns();
                if columns.is_empty() {
                    return Err(Failure::Recoverable(BindError::ColumnNotFound {
                        table: registry.table_name(target_table),
                        column: property.clone(),
                    }));
                }
                (columns, Some(property.clone()))
            }
            _ => {
                let key = registry
                    .settled_key(target_table)
                    .map_err(Failure::Recoverable)?;
                if explicit_refs.is_empty() || explicit_refs == key {
                    (key, None)
                } else {
                    let synthetic = SyntheticReferenceBuilder::new(registry).build(
                        &value.entity,
                        value.leaf(),
                        &self.referenced_entity,
                        &explicit_refs,
                        true,
                    )?;
                    (synthetic.columns, Some(synthetic.property))
                }
            }
        };

        if !join_columns.is_empty() && join_columns.len() != referenced_columns.len() {
            return Err(BindError::ForeignKeyColumnCount {
                path: self.path.clone(),
                expected: referenced_columns.len(),
                found: join_columns.len(),
            }
            .into());
        }

        let naming = registry.config().naming;
        let names: Vec<String> = referenced_columns
            .iter()
            .enumerate()
            .map(|(i, referenced)| {
                join_columns
                    .get(i)
                    .and_then(|jc| jc.name.clone())
                    .unwrap_or_else(|| naming.foreign_key_column_name(value.leaf(), referenced))
            })
            .collect();
        let nullable: Vec<bool> = (0..names.len())
            .map(|i| join_columns.get(i).map_or(true, |jc| jc.nullable) && !self.in_primary_key)
            .collect();

        let source_tables: Vec<TableId> = registry
            .lineage(&self.referenced_entity)
            .iter()
            .flat_map(|e| e.tables().collect::<Vec<_>>())
            .collect();
        let columns = referenced_columns
            .iter()
            .zip(names)
            .zip(nullable)
            .map(|((referenced, name), nullable)| {
                let source = source_tables
                    .iter()
                    .find_map(|&t| registry.find_column(t, referenced));
                match source {
                    Some(column) => column.renamed(name).nullable(nullable),
                    None => Column::new(name).nullable(nullable),
                }
            })
            .collect();

        Ok(Plan {
            referenced_table: target_table,
            referenced_columns,
            referenced_property,
            columns,
        })
    }
}

/// Copies of `sources` (columns of `table`) under new names.
pub(crate) fn copy_columns(
    registry: &Registry,
    table: TableId,
    sources: &[String],
    names: &[String],
    nullable: bool,
) -> Vec<Column> {
    sources
        .iter()
        .zip(names)
        .map(|(source, name)| match registry.find_column(table, source) {
            Some(column) => column.renamed(name.as_str()).nullable(nullable),
            None => Column::new(name.as_str()).nullable(nullable),
        })
        .collect()
}
