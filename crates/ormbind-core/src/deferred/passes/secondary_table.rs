//! Secondary table key and foreign key creation.

use crate::error::{BindError, Failure};
use crate::model::{Column, ForeignKey, TableId};
use crate::registry::Registry;

/// Gives a secondary table a copy of its entity's key, makes it the secondary table's primary
/// key and references the entity's table with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryTablePass {
    /// Owning entity.
    pub entity: String,
    /// Secondary table.
    pub table: TableId,
    /// Explicit key column names.
    pub pk_join_columns: Vec<String>,
}

impl SecondaryTablePass {
    /// Finalize the secondary table.
    pub fn resolve(&self, registry: &mut Registry) -> Result<(), Failure> {
        let entity = registry
            .entity(&self.entity)
            .ok_or_else(|| BindError::Internal {
                path: self.entity.clone(),
                message: "entity not registered".to_string(),
            })?;
        let root = registry
            .root_of(&self.entity)
            .ok_or_else(|| BindError::MissingIdentifier {
                entity: self.entity.clone(),
            })?;

        if !registry.is_key_settled(root.table) {
            return Err(BindError::UnsupportedMapping {
                path: self.entity.clone(),
                reason: format!(
                    "secondary table {} needs a primary key that depends on an association",
                    registry.table_name(self.table)
                ),
            }
            .into());
        }
        let root_key = registry.primary_key_columns(root.table).unwrap_or_default();
        let owner_key = if entity.key_columns.is_empty() {
            root_key.clone()
        } else {
            entity.key_columns.clone()
        };

        let names = if self.pk_join_columns.is_empty() {
            owner_key.clone()
        } else {
            self.pk_join_columns.clone()
        };
        if names.len() != owner_key.len() {
            return Err(BindError::ForeignKeyColumnCount {
                path: registry.table_name(self.table),
                expected: owner_key.len(),
                found: names.len(),
            }
            .into());
        }

        let columns: Vec<Column> = root_key
            .iter()
            .zip(&names)
            .map(|(source, name)| match registry.find_column(root.table, source) {
                Some(column) => column.renamed(name.as_str()).nullable(false),
                None => Column::new(name.as_str()).nullable(false),
            })
            .collect();
        let owner_table = entity.table;
        let foreign_key = ForeignKey {
            name: format!(
                "fk_{}_{}",
                registry.table(self.table).name,
                registry.table(owner_table).name
            ),
            columns: names.clone(),
            referenced_entity: self.entity.clone(),
            referenced_table: Some(owner_table),
            referenced_columns: owner_key,
            cascade_delete: false,
        };

        let table = registry.table_mut(self.table);
        for column in columns {
            table.add_column(column);
        }
        table.set_primary_key(names.clone());
        table.add_foreign_key(foreign_key);

        if let Some(join) = registry
            .entity_mut(&self.entity)
            .and_then(|e| e.joins.iter_mut().find(|j| j.table == self.table))
        {
            join.key_columns = names;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::MetadataCompiler;
    use crate::source::{
        ClassDescriptor, ColumnSpec, IdentifierSpec, MappingSource, PropertySpec,
        SecondaryTableSpec,
    };

    fn customer(secondary: SecondaryTableSpec) -> MappingSource {
        MappingSource::new().with_class(
            ClassDescriptor::entity("Customer")
                .with_identifier(IdentifierSpec::simple(PropertySpec::basic("id", "long")))
                .with_secondary_table(secondary)
                .with_property(
                    PropertySpec::basic("bio", "text")
                        .with_column(ColumnSpec::named("bio").in_table("customer_details")),
                ),
        )
    }

    #[test]
    fn test_secondary_table_copies_owner_key() {
        let source = customer(SecondaryTableSpec::new("customer_details"));
        let model = MetadataCompiler::default().compile(&source).unwrap();

        let details = model.table_named("customer_details").unwrap();
        assert_eq!(details.primary_key_columns(), ["id".to_string()]);
        assert!(!details.column("id").unwrap().nullable);
        let fk = &details.foreign_keys[0];
        assert_eq!(fk.referenced_entity, "Customer");
        assert_eq!(fk.referenced_columns, vec!["id"]);
        assert_eq!(
            model.entity("Customer").unwrap().joins[0].key_columns,
            vec!["id"]
        );
    }

    #[test]
    fn test_secondary_table_uses_declared_key_columns() {
        let source = customer(
            SecondaryTableSpec::new("customer_details").with_pk_join_columns(["customer_id"]),
        );
        let model = MetadataCompiler::default().compile(&source).unwrap();

        let details = model.table_named("customer_details").unwrap();
        assert_eq!(details.primary_key_columns(), ["customer_id".to_string()]);
        assert_eq!(details.foreign_keys[0].columns, vec!["customer_id"]);
    }
}
