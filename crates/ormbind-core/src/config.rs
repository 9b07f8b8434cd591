//! Compiler configuration.

/// How implicit table and column names are derived from entity and property names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingStrategy {
    /// Use names as declared.
    #[default]
    Verbatim,
    /// Convert `CamelCase` names to `camel_case`.
    SnakeCase,
}

impl NamingStrategy {
    /// Implicit table name for an entity.
    pub fn table_name(&self, entity_name: &str) -> String {
        self.apply(entity_name)
    }

    /// Implicit column name for a property.
    pub fn column_name(&self, property_name: &str) -> String {
        self.apply(property_name)
    }

    /// Implicit foreign-key column name for an association column.
    pub fn foreign_key_column_name(&self, property_name: &str, referenced_column: &str) -> String {
        format!("{}_{}", self.apply(property_name), referenced_column)
    }

    /// Implicit join-table name.
    pub fn join_table_name(&self, owner_table: &str, other: &str) -> String {
        format!("{}_{}", owner_table, self.apply(other))
    }

    fn apply(&self, name: &str) -> String {
        match self {
            NamingStrategy::Verbatim => name.to_string(),
            NamingStrategy::SnakeCase => to_snake_case(name),
        }
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch == '.' {
            out.push('_');
            prev_lower = false;
        } else if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

/// Configuration of a compilation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileConfig {
    /// Naming of implicit tables and columns.
    pub naming: NamingStrategy,
    /// Schema applied to tables with no explicit schema.
    pub default_schema: Option<String>,
    /// Catalog applied to tables with no explicit catalog.
    pub default_catalog: Option<String>,
    /// Discriminator column name when none is declared.
    pub discriminator_column: String,
    /// Discriminator column length when none is declared.
    pub discriminator_length: u32,
    /// Treat every warning as a fatal error.
    pub strict_warnings: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            naming: NamingStrategy::Verbatim,
            default_schema: None,
            default_catalog: None,
            discriminator_column: "DTYPE".to_string(),
            discriminator_length: 31,
            strict_warnings: false,
        }
    }
}

impl CompileConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the naming strategy.
    pub fn with_naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Set the default schema.
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Set the default catalog.
    pub fn with_default_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.default_catalog = Some(catalog.into());
        self
    }

    /// Set the default discriminator column.
    pub fn with_discriminator_column(mut self, column: impl Into<String>, length: u32) -> Self {
        self.discriminator_column = column.into();
        self.discriminator_length = length;
        self
    }

    /// Promote warnings to errors.
    pub fn strict(mut self) -> Self {
        self.strict_warnings = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_naming() {
        let naming = NamingStrategy::SnakeCase;
        assert_eq!(naming.table_name("OrderLine"), "order_line");
        assert_eq!(naming.column_name("createdAt"), "created_at");
        assert_eq!(naming.column_name("address.zipCode"), "address_zip_code");
        assert_eq!(naming.column_name("id"), "id");
    }

    #[test]
    fn test_verbatim_naming() {
        let naming = NamingStrategy::Verbatim;
        assert_eq!(naming.table_name("OrderLine"), "OrderLine");
        assert_eq!(naming.foreign_key_column_name("customer", "id"), "customer_id");
    }

    #[test]
    fn test_default_config() {
        let config = CompileConfig::default();
        assert_eq!(config.discriminator_column, "DTYPE");
        assert_eq!(config.discriminator_length, 31);
        assert!(!config.strict_warnings);

        let config = CompileConfig::new().with_default_schema("app").strict();
        assert_eq!(config.default_schema.as_deref(), Some("app"));
        assert!(config.strict_warnings);
    }
}
