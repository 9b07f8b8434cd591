//! Relational tables of the resolved model.

use serde::Serialize;

/// Index of a table in the run's table arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TableId(pub usize);

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    /// Column name (unique within its table).
    pub name: String,
    /// SQL type, when known.
    pub sql_type: Option<String>,
    /// Length for character types.
    pub length: Option<u32>,
    /// Whether the column accepts nulls.
    pub nullable: bool,
    /// Whether the column carries a single-column unique constraint.
    pub unique: bool,
}

impl Column {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: None,
            length: None,
            nullable: true,
            unique: false,
        }
    }

    /// Set nullability.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set uniqueness.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Set the SQL type.
    pub fn with_sql_type(mut self, sql_type: Option<String>) -> Self {
        self.sql_type = sql_type;
        self
    }

    /// Set the length.
    pub fn with_length(mut self, length: Option<u32>) -> Self {
        self.length = length;
        self
    }

    /// Copy of this column under another name, keeping its type.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: self.sql_type.clone(),
            length: self.length,
            nullable: self.nullable,
            unique: false,
        }
    }
}

/// A primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryKey {
    /// Constraint name.
    pub name: String,
    /// Key columns in order.
    pub columns: Vec<String>,
}

/// A foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,
    /// Referencing columns in order.
    pub columns: Vec<String>,
    /// Entity owning the referenced table.
    pub referenced_entity: String,
    /// Referenced table, set once the referenced entity is resolved.
    pub referenced_table: Option<TableId>,
    /// Referenced columns. The referenced primary key when empty.
    pub referenced_columns: Vec<String>,
    /// Delete referencing rows with the referenced row.
    pub cascade_delete: bool,
}

/// A unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueKey {
    /// Constraint name.
    pub name: String,
    /// Constrained columns.
    pub columns: Vec<String>,
}

/// An index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Indexed columns.
    pub columns: Vec<String>,
}

/// A relational table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Schema qualifier.
    pub schema: Option<String>,
    /// Catalog qualifier.
    pub catalog: Option<String>,
    /// Columns in creation order.
    pub columns: Vec<Column>,
    /// Primary key.
    pub primary_key: Option<PrimaryKey>,
    /// Foreign keys.
    pub foreign_keys: Vec<ForeignKey>,
    /// Unique keys.
    pub unique_keys: Vec<UniqueKey>,
    /// Indexes.
    pub indexes: Vec<Index>,
    /// Table of an abstract class; never holds rows itself.
    pub is_abstract: bool,
    /// Table whose columns and keys this table repeats (table-per-class).
    pub denormalized_from: Option<TableId>,
}

impl Table {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            catalog: None,
            columns: Vec::new(),
            primary_key: None,
            foreign_keys: Vec::new(),
            unique_keys: Vec::new(),
            indexes: Vec::new(),
            is_abstract: false,
            denormalized_from: None,
        }
    }

    /// Fully qualified name (`catalog.schema.name`, skipping absent parts).
    pub fn qualified_name(&self) -> String {
        qualify(self.catalog.as_deref(), self.schema.as_deref(), &self.name)
    }

    /// Look up a column.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column for modification.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Check if the table has a column.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Add a column. An existing column of the same name is kept; only nullability is
    /// tightened.
    pub fn add_column(&mut self, column: Column) {
        match self.column_mut(&column.name) {
            Some(existing) => {
                existing.nullable &= column.nullable;
                existing.unique |= column.unique;
                if existing.sql_type.is_none() {
                    existing.sql_type = column.sql_type;
                    existing.length = column.length;
                }
            }
            None => self.columns.push(column),
        }
    }

    /// Primary key column names, empty when there is no primary key.
    pub fn primary_key_columns(&self) -> &[String] {
        self.primary_key
            .as_ref()
            .map(|pk| pk.columns.as_slice())
            .unwrap_or(&[])
    }

    /// Set the primary key, marking its columns not null.
    pub fn set_primary_key(&mut self, columns: Vec<String>) {
        for name in &columns {
            if let Some(column) = self.column_mut(name) {
                column.nullable = false;
            }
        }
        self.primary_key = Some(PrimaryKey {
            name: format!("pk_{}", self.name),
            columns,
        });
    }

    /// Append columns to the primary key, creating it if needed.
    pub fn extend_primary_key(&mut self, columns: &[String]) {
        let mut all = self.primary_key_columns().to_vec();
        for name in columns {
            if !all.contains(name) {
                all.push(name.clone());
            }
        }
        self.set_primary_key(all);
    }

    /// Add a unique key unless one over the same columns exists. Returns the key name.
    pub fn add_unique_key(&mut self, name: Option<String>, columns: Vec<String>) -> String {
        if let Some(existing) = self.unique_keys.iter().find(|k| k.columns == columns) {
            return existing.name.clone();
        }
        let name = name.unwrap_or_else(|| format!("uk_{}_{}", self.name, columns.join("_")));
        self.unique_keys.push(UniqueKey {
            name: name.clone(),
            columns,
        });
        name
    }

    /// Add an index unless one of the same name exists.
    pub fn add_index(&mut self, name: String, columns: Vec<String>) {
        if !self.indexes.iter().any(|i| i.name == name) {
            self.indexes.push(Index { name, columns });
        }
    }

    /// Add a foreign key unless one over the same columns to the same entity exists.
    pub fn add_foreign_key(&mut self, foreign_key: ForeignKey) {
        let duplicate = self.foreign_keys.iter().any(|fk| {
            fk.columns == foreign_key.columns && fk.referenced_entity == foreign_key.referenced_entity
        });
        if !duplicate {
            self.foreign_keys.push(foreign_key);
        }
    }

    /// Column names missing from this table.
    pub fn missing_columns<'a>(&self, names: &'a [String]) -> Vec<&'a String> {
        names.iter().filter(|n| !self.has_column(n)).collect()
    }
}

/// Qualify a table name.
pub fn qualify(catalog: Option<&str>, schema: Option<&str>, name: &str) -> String {
    let mut qualified = String::new();
    for part in [catalog, schema].into_iter().flatten() {
        qualified.push_str(part);
        qualified.push('.');
    }
    qualified.push_str(name);
    qualified
}
