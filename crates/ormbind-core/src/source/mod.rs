//! Declarative mapping facts consumed by the compiler.
//!
//! A [`MappingSource`] is produced by whatever extracts mapping facts (annotations, XML, a
//! JSON document) and is never mutated by the compiler.

mod class;
mod identifier;
mod property;
mod query;
mod table;

pub use class::{ClassDescriptor, ClassKind, DiscriminatorSpec, InheritanceStrategy};
pub use identifier::{
    GeneratedValue, GenerationType, GeneratorDefinition, IdentifierKind, IdentifierSpec,
};
pub use property::{
    AccessKind, AnySpec, AssociationSpec, CollectionKind, CollectionSpec, ColumnSpec,
    JoinColumnSpec, JoinTableSpec, MapKeySpec, PropertyKind, PropertySpec,
};
pub use query::{EntityResult, NamedQuery, ResultSetMapping, TypeDef};
pub use table::{IndexSpec, SecondaryTableSpec, TableSpec, UniqueConstraintSpec};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Every mapping fact of one compilation run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingSource {
    /// All known classes, mapped or not.
    pub classes: Vec<ClassDescriptor>,
    /// Classes explicitly declared for mapping. Every modeled class when empty.
    pub annotated: Vec<String>,
    /// Global named generators.
    pub generators: Vec<GeneratorDefinition>,
    /// Type definitions.
    pub type_defs: Vec<TypeDef>,
    /// Global named queries.
    pub named_queries: Vec<NamedQuery>,
    /// Global result-set mappings.
    pub result_set_mappings: Vec<ResultSetMapping>,
}

impl MappingSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON mapping document.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON mapping document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Add a class.
    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.classes.push(class);
        self
    }

    /// Add several classes.
    pub fn with_classes(mut self, classes: impl IntoIterator<Item = ClassDescriptor>) -> Self {
        self.classes.extend(classes);
        self
    }

    /// Declare a class for mapping explicitly.
    pub fn with_annotated(mut self, class_name: impl Into<String>) -> Self {
        self.annotated.push(class_name.into());
        self
    }

    /// Add a global generator.
    pub fn with_generator(mut self, generator: GeneratorDefinition) -> Self {
        self.generators.push(generator);
        self
    }

    /// Add a type definition.
    pub fn with_type_def(mut self, type_def: TypeDef) -> Self {
        self.type_defs.push(type_def);
        self
    }

    /// Add a global named query.
    pub fn with_named_query(mut self, query: NamedQuery) -> Self {
        self.named_queries.push(query);
        self
    }

    /// Add a global result-set mapping.
    pub fn with_result_set_mapping(mut self, mapping: ResultSetMapping) -> Self {
        self.result_set_mappings.push(mapping);
        self
    }

    /// Look up a class by name.
    pub fn class(&self, class_name: &str) -> Option<&ClassDescriptor> {
        self.classes.iter().find(|c| c.class_name == class_name)
    }

    /// Names of the classes to map, in declaration order.
    pub fn annotated_classes(&self) -> Vec<&str> {
        if self.annotated.is_empty() {
            self.classes
                .iter()
                .filter(|c| c.is_modeled())
                .map(|c| c.class_name.as_str())
                .collect()
        } else {
            self.annotated.iter().map(String::as_str).collect()
        }
    }
}
