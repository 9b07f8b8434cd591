//! Class descriptors.

use serde::{Deserialize, Serialize};

use super::identifier::{GeneratorDefinition, IdentifierSpec};
use super::property::{AccessKind, PropertySpec};
use super::query::{NamedQuery, ResultSetMapping};
use super::table::{SecondaryTableSpec, TableSpec};

/// Role of a class in the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    /// A persistent entity.
    #[default]
    Entity,
    /// A non-entity ancestor contributing shared properties.
    MappedSuperclass,
    /// A class that is not mapped at all.
    Plain,
}

/// Inheritance mapping strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InheritanceStrategy {
    /// Whole hierarchy in one table with a discriminator.
    SingleTable,
    /// One table per class joined by primary key.
    Joined,
    /// One denormalized table per concrete class.
    TablePerClass,
}

impl std::fmt::Display for InheritanceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InheritanceStrategy::SingleTable => write!(f, "SINGLE_TABLE"),
            InheritanceStrategy::Joined => write!(f, "JOINED"),
            InheritanceStrategy::TablePerClass => write!(f, "TABLE_PER_CLASS"),
        }
    }
}

/// Discriminator declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscriminatorSpec {
    /// Column name. The configured default when absent.
    pub column: Option<String>,
    /// SQL formula instead of a column.
    pub formula: Option<String>,
    /// Discriminator type (`string`, `char`, `integer`).
    pub type_name: Option<String>,
    /// Column length.
    pub length: Option<u32>,
    /// Restrict loaded rows to known discriminator values.
    pub force: bool,
}

/// Declarative mapping facts of one class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDescriptor {
    /// Fully qualified class name.
    pub class_name: String,
    /// Direct superclass name.
    pub superclass: Option<String>,
    /// Role of the class.
    pub kind: ClassKind,
    /// Entity name override. The unqualified class name when absent.
    pub entity_name: Option<String>,
    /// Whether the class is abstract.
    pub is_abstract: bool,
    /// Table declaration.
    pub table: Option<TableSpec>,
    /// Secondary tables.
    pub secondary_tables: Vec<SecondaryTableSpec>,
    /// Explicit inheritance strategy.
    pub inheritance: Option<InheritanceStrategy>,
    /// Discriminator declaration.
    pub discriminator: Option<DiscriminatorSpec>,
    /// Discriminator value of this class.
    pub discriminator_value: Option<String>,
    /// Key column names of a joined subclass.
    pub primary_key_join_columns: Vec<String>,
    /// Cascade deletes from the parent table of a joined subclass.
    pub on_delete_cascade: bool,
    /// Identifier declaration.
    pub identifier: Option<IdentifierSpec>,
    /// Declared properties.
    pub properties: Vec<PropertySpec>,
    /// Class-level generators.
    pub generators: Vec<GeneratorDefinition>,
    /// Named queries declared on the class.
    pub named_queries: Vec<NamedQuery>,
    /// Result-set mappings declared on the class.
    pub result_set_mappings: Vec<ResultSetMapping>,
    /// Default property access.
    pub default_access: Option<AccessKind>,
}

impl ClassDescriptor {
    /// Describe an entity class.
    pub fn entity(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            kind: ClassKind::Entity,
            ..Default::default()
        }
    }

    /// Describe a mapped superclass.
    pub fn mapped_superclass(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            kind: ClassKind::MappedSuperclass,
            ..Default::default()
        }
    }

    /// Describe an unmapped class.
    pub fn plain(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            kind: ClassKind::Plain,
            ..Default::default()
        }
    }

    /// Set the superclass.
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Set the entity name.
    pub fn with_entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    /// Mark the class abstract.
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Set the table declaration.
    pub fn with_table(mut self, table: TableSpec) -> Self {
        self.table = Some(table);
        self
    }

    /// Add a secondary table.
    pub fn with_secondary_table(mut self, table: SecondaryTableSpec) -> Self {
        self.secondary_tables.push(table);
        self
    }

    /// Set the inheritance strategy.
    pub fn with_inheritance(mut self, strategy: InheritanceStrategy) -> Self {
        self.inheritance = Some(strategy);
        self
    }

    /// Set the discriminator declaration.
    pub fn with_discriminator(mut self, discriminator: DiscriminatorSpec) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    /// Set the discriminator value.
    pub fn with_discriminator_value(mut self, value: impl Into<String>) -> Self {
        self.discriminator_value = Some(value.into());
        self
    }

    /// Set the joined-subclass key column names.
    pub fn with_primary_key_join_columns(
        mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.primary_key_join_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Cascade deletes from the parent table.
    pub fn with_on_delete_cascade(mut self) -> Self {
        self.on_delete_cascade = true;
        self
    }

    /// Set the identifier.
    pub fn with_identifier(mut self, identifier: IdentifierSpec) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// Add a property.
    pub fn with_property(mut self, property: PropertySpec) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a class-level generator.
    pub fn with_generator(mut self, generator: GeneratorDefinition) -> Self {
        self.generators.push(generator);
        self
    }

    /// Add a named query.
    pub fn with_named_query(mut self, query: NamedQuery) -> Self {
        self.named_queries.push(query);
        self
    }

    /// Add a result-set mapping.
    pub fn with_result_set_mapping(mut self, mapping: ResultSetMapping) -> Self {
        self.result_set_mappings.push(mapping);
        self
    }

    /// Entity name: the explicit one, or the unqualified class name.
    pub fn entity_name(&self) -> String {
        match &self.entity_name {
            Some(name) => name.clone(),
            None => self
                .class_name
                .rsplit('.')
                .next()
                .unwrap_or(&self.class_name)
                .to_string(),
        }
    }

    /// Check if the class takes part in the mapping.
    pub fn is_modeled(&self) -> bool {
        matches!(self.kind, ClassKind::Entity | ClassKind::MappedSuperclass)
    }

    /// Check if the class is an entity.
    pub fn is_entity(&self) -> bool {
        self.kind == ClassKind::Entity
    }

    /// Look up a declared property.
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_name_defaults_to_simple_name() {
        let class = ClassDescriptor::entity("com.acme.Order");
        assert_eq!(class.entity_name(), "Order");

        let named = ClassDescriptor::entity("com.acme.Order").with_entity_name("PurchaseOrder");
        assert_eq!(named.entity_name(), "PurchaseOrder");
    }

    #[test]
    fn test_modeled_kinds() {
        assert!(ClassDescriptor::entity("A").is_modeled());
        assert!(ClassDescriptor::mapped_superclass("B").is_modeled());
        assert!(!ClassDescriptor::plain("C").is_modeled());
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(InheritanceStrategy::TablePerClass.to_string(), "TABLE_PER_CLASS");
    }
}
