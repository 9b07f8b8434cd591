//! Identifier and id-generator declarations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::property::PropertySpec;

/// Declared identifier generation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationType {
    /// Let the database pick.
    Auto,
    /// Identity column.
    Identity,
    /// Sequence with hi/lo optimisation.
    Sequence,
    /// Hi/lo values kept in a table.
    Table,
}

impl GenerationType {
    /// Strategy name the generation type maps to.
    pub fn strategy(self) -> &'static str {
        match self {
            GenerationType::Auto => "native",
            GenerationType::Identity => "identity",
            GenerationType::Sequence => "seqhilo",
            GenerationType::Table => "table-hilo",
        }
    }
}

/// Generated-value declaration on an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedValue {
    /// Declared generation type, if any.
    pub strategy: Option<GenerationType>,
    /// Name of a named generator.
    pub generator: Option<String>,
}

impl GeneratedValue {
    /// Generated value with a declared type.
    pub fn of(strategy: GenerationType) -> Self {
        Self {
            strategy: Some(strategy),
            generator: None,
        }
    }

    /// Generated value using a named generator.
    pub fn named(generator: impl Into<String>) -> Self {
        Self {
            strategy: None,
            generator: Some(generator.into()),
        }
    }

    /// Set the generator name.
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }
}

/// A named id-generator definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorDefinition {
    /// Generator name.
    pub name: String,
    /// Strategy name (`identity`, `seqhilo`, `table-hilo`, `sequence`, ...).
    pub strategy: String,
    /// Generator parameters.
    pub params: BTreeMap<String, String>,
}

impl GeneratorDefinition {
    /// Create a generator definition.
    pub fn new(name: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy: strategy.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Shape of an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Single property (basic, or an identifying to-one association).
    Simple {
        /// Identifier property.
        property: PropertySpec,
    },
    /// Embedded component identifier.
    Embedded {
        /// Component property.
        property: PropertySpec,
    },
    /// Identifier made of several entity properties, described by an id class.
    IdClass {
        /// Id class name.
        class_name: String,
        /// Entity properties forming the identifier.
        properties: Vec<String>,
    },
}

/// A declared identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierSpec {
    /// Identifier shape.
    pub kind: IdentifierKind,
    /// Generated-value declaration.
    #[serde(default)]
    pub generated: Option<GeneratedValue>,
    /// Generators declared on the identifier property itself.
    #[serde(default)]
    pub generators: Vec<GeneratorDefinition>,
}

impl IdentifierSpec {
    /// Single-property identifier.
    pub fn simple(property: PropertySpec) -> Self {
        Self {
            kind: IdentifierKind::Simple { property },
            generated: None,
            generators: Vec::new(),
        }
    }

    /// Embedded component identifier.
    pub fn embedded(property: PropertySpec) -> Self {
        Self {
            kind: IdentifierKind::Embedded { property },
            generated: None,
            generators: Vec::new(),
        }
    }

    /// Id-class identifier over entity properties.
    pub fn id_class(
        class_name: impl Into<String>,
        properties: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            kind: IdentifierKind::IdClass {
                class_name: class_name.into(),
                properties: properties.into_iter().map(Into::into).collect(),
            },
            generated: None,
            generators: Vec::new(),
        }
    }

    /// Set the generated-value declaration.
    pub fn generated(mut self, generated: GeneratedValue) -> Self {
        self.generated = Some(generated);
        self
    }

    /// Add a property-level generator.
    pub fn with_generator(mut self, generator: GeneratorDefinition) -> Self {
        self.generators.push(generator);
        self
    }
}
