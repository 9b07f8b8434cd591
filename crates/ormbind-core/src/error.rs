//! Error and diagnostic types for a compilation run.

use serde::Serialize;
use thiserror::Error;

/// Classification of a fatal binding error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The mapping facts are structurally invalid.
    Structural,
    /// A reference (entity, property, column, generator, mapping) could not be resolved.
    UnresolvedReference,
    /// Primary-key foreign keys form a cycle.
    Circularity,
    /// A name was registered twice.
    Duplicate,
    /// The engine reached a state its own ordering should have prevented.
    Internal,
}

/// Fatal errors raised while binding mapping facts.
///
/// Any of these aborts the run; the registry it was raised against must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A root entity has no identifier anywhere in its shared-ancestor chain.
    #[error("no identifier specified for entity: {entity}")]
    MissingIdentifier {
        /// Entity name.
        entity: String,
    },

    /// A subclass tried to declare its own identifier.
    #[error("{entity} is a subclass and cannot redefine the identifier of its hierarchy")]
    IdentifierOnSubclass {
        /// Entity name.
        entity: String,
    },

    /// An id-class lists a property the entity does not declare.
    #[error("{entity}: id class {id_class} references unknown property {property}")]
    UnknownIdClassProperty {
        /// Entity name.
        entity: String,
        /// Id class name.
        id_class: String,
        /// Missing property name.
        property: String,
    },

    /// The identifier maps no column at all.
    #[error("identifier of {entity} does not map any column")]
    EmptyIdentifier {
        /// Entity name.
        entity: String,
    },

    /// Entity name registered twice.
    #[error("duplicate entity mapping: {entity}")]
    DuplicateEntity {
        /// Entity name.
        entity: String,
    },

    /// A table name is used both as a denormalized and as a regular table.
    #[error("table {table} is mapped both as a regular and as a denormalized table")]
    DuplicateTable {
        /// Qualified table name.
        table: String,
    },

    /// Named query registered twice.
    #[error("duplicate query mapping: {name}")]
    DuplicateQuery {
        /// Query name.
        name: String,
    },

    /// Result-set mapping registered twice.
    #[error("duplicate result set mapping: {name}")]
    DuplicateResultSetMapping {
        /// Mapping name.
        name: String,
    },

    /// Named generator registered twice in the global map.
    #[error("duplicate generator name: {name}")]
    DuplicateGenerator {
        /// Generator name.
        name: String,
    },

    /// An association references an entity that is not mapped.
    #[error("{path} references an unknown entity: {target}")]
    UnknownEntity {
        /// `Entity.property` path of the association.
        path: String,
        /// Referenced entity name.
        target: String,
    },

    /// Identifier refers to a named generator that does not exist.
    #[error("{path}: unknown id generator: {generator}")]
    UnknownGenerator {
        /// `Entity.property` path of the identifier.
        path: String,
        /// Generator name.
        generator: String,
    },

    /// A single-table subclass declares table-level constraints that cannot be honored.
    #[error("{entity} is a single-table subclass and cannot declare constraints on table {table}")]
    IllegalTable {
        /// Entity name.
        entity: String,
        /// Declared table name.
        table: String,
    },

    /// Misuse of the discriminator declaration.
    #[error("{entity}: invalid discriminator: {reason}")]
    DiscriminatorMisuse {
        /// Entity name.
        entity: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two entities of one single-table hierarchy share a discriminator value.
    #[error("{entity} uses discriminator value '{value}' already used by {other}")]
    DuplicateDiscriminatorValue {
        /// Entity name.
        entity: String,
        /// Discriminator value.
        value: String,
        /// Entity already holding the value.
        other: String,
    },

    /// No table of the referenced entity hierarchy holds the referenced column.
    #[error("{path}: no table of {target} or its superclasses holds column {column}")]
    ColumnOwnerNotFound {
        /// `Entity.property` path of the association.
        path: String,
        /// Referenced entity.
        target: String,
        /// Referenced column.
        column: String,
    },

    /// Referenced columns are not each mapped to a single-column property.
    #[error(
        "referencedColumnNames({}) of {path} referencing {target} not mapped to a single property",
        columns.join(", ")
    )]
    UnmatchedReferencedColumns {
        /// `Entity.property` path of the association.
        path: String,
        /// Referenced entity.
        target: String,
        /// Columns without a single-column property match.
        columns: Vec<String>,
    },

    /// A referenced column is not present (yet) on a table.
    #[error("unable to find column {column} on table {table}")]
    ColumnNotFound {
        /// Qualified table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A primary key another unit depends on is not complete yet.
    #[error("primary key of table {table} is not complete yet")]
    PrimaryKeyPending {
        /// Qualified table name.
        table: String,
    },

    /// Primary-key foreign keys form a cycle.
    #[error(
        "foreign key circularity dependency involving the following tables: {}",
        tables.join(" -> ")
    )]
    ForeignKeyCircularity {
        /// Table chain, starting and ending with the start table.
        tables: Vec<String>,
    },

    /// Foreign-key column count differs from the referenced key.
    #[error("{path}: foreign key has {found} column(s) but the referenced key has {expected}")]
    ForeignKeyColumnCount {
        /// `Entity.property` path or table name.
        path: String,
        /// Number of referenced columns.
        expected: usize,
        /// Number of foreign-key columns.
        found: usize,
    },

    /// `mapped_by` names a property the target does not have.
    #[error("{path}: mappedBy references an unknown target property: {target}.{property}")]
    UnknownMappedBy {
        /// `Entity.property` path of the inverse side.
        path: String,
        /// Target entity.
        target: String,
        /// Missing property.
        property: String,
    },

    /// `mapped_by` target exists but is not resolved yet.
    #[error("{path}: owning side {target}.{property} is not resolved yet")]
    MappedByPending {
        /// `Entity.property` path of the inverse side.
        path: String,
        /// Target entity.
        target: String,
        /// Owning property.
        property: String,
    },

    /// A property reference names a property the entity does not have.
    #[error("property-ref {property} not found on entity {entity}")]
    UnknownProperty {
        /// Entity name.
        entity: String,
        /// Property name.
        property: String,
    },

    /// A declared unique key or index names columns the table does not have.
    #[error(
        "unable to create {constraint} ({}) on table {table}: {} not found",
        columns.join(", "),
        missing.join(", ")
    )]
    ConstraintColumns {
        /// "unique key constraint" or "index".
        constraint: &'static str,
        /// Qualified table name.
        table: String,
        /// Declared columns.
        columns: Vec<String>,
        /// Columns that do not exist.
        missing: Vec<String>,
    },

    /// Native query refers to a result-set mapping that was never declared.
    #[error("query {query} references unknown result set mapping: {mapping}")]
    UnknownResultSetMapping {
        /// Query name.
        query: String,
        /// Mapping name.
        mapping: String,
    },

    /// A mapping combination the engine does not support.
    #[error("{path}: unsupported mapping: {reason}")]
    UnsupportedMapping {
        /// Path of the offending element.
        path: String,
        /// Why it is unsupported.
        reason: String,
    },

    /// The superclass chain of a class loops back on itself.
    #[error("cyclic superclass chain involving class {class_name}")]
    CyclicHierarchy {
        /// Class where the loop was detected.
        class_name: String,
    },

    /// A warning promoted to an error by strict mode.
    #[error("strict mode: {0}")]
    Strict(BindWarning),

    /// Internal ordering invariant violated.
    #[error("internal error at {path}: {message}")]
    Internal {
        /// Where it happened.
        path: String,
        /// Description.
        message: String,
    },
}

impl BindError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BindError::MissingIdentifier { .. }
            | BindError::IdentifierOnSubclass { .. }
            | BindError::EmptyIdentifier { .. }
            | BindError::IllegalTable { .. }
            | BindError::DiscriminatorMisuse { .. }
            | BindError::UnmatchedReferencedColumns { .. }
            | BindError::ForeignKeyColumnCount { .. }
            | BindError::UnsupportedMapping { .. }
            | BindError::CyclicHierarchy { .. }
            | BindError::Strict(_) => ErrorKind::Structural,
            BindError::UnknownIdClassProperty { .. }
            | BindError::UnknownEntity { .. }
            | BindError::UnknownGenerator { .. }
            | BindError::ColumnOwnerNotFound { .. }
            | BindError::ColumnNotFound { .. }
            | BindError::PrimaryKeyPending { .. }
            | BindError::UnknownMappedBy { .. }
            | BindError::MappedByPending { .. }
            | BindError::UnknownProperty { .. }
            | BindError::ConstraintColumns { .. }
            | BindError::UnknownResultSetMapping { .. } => ErrorKind::UnresolvedReference,
            BindError::ForeignKeyCircularity { .. } => ErrorKind::Circularity,
            BindError::DuplicateEntity { .. }
            | BindError::DuplicateTable { .. }
            | BindError::DuplicateQuery { .. }
            | BindError::DuplicateResultSetMapping { .. }
            | BindError::DuplicateGenerator { .. }
            | BindError::DuplicateDiscriminatorValue { .. } => ErrorKind::Duplicate,
            BindError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Human-readable location of the error (`Entity.property`, entity or table name).
    pub fn path(&self) -> Option<&str> {
        match self {
            BindError::MissingIdentifier { entity }
            | BindError::IdentifierOnSubclass { entity }
            | BindError::UnknownIdClassProperty { entity, .. }
            | BindError::EmptyIdentifier { entity }
            | BindError::DuplicateEntity { entity }
            | BindError::IllegalTable { entity, .. }
            | BindError::DiscriminatorMisuse { entity, .. }
            | BindError::DuplicateDiscriminatorValue { entity, .. }
            | BindError::UnknownProperty { entity, .. } => Some(entity),
            BindError::UnknownEntity { path, .. }
            | BindError::UnknownGenerator { path, .. }
            | BindError::ColumnOwnerNotFound { path, .. }
            | BindError::UnmatchedReferencedColumns { path, .. }
            | BindError::ForeignKeyColumnCount { path, .. }
            | BindError::UnknownMappedBy { path, .. }
            | BindError::MappedByPending { path, .. }
            | BindError::UnsupportedMapping { path, .. }
            | BindError::Internal { path, .. } => Some(path),
            BindError::DuplicateTable { table }
            | BindError::ColumnNotFound { table, .. }
            | BindError::PrimaryKeyPending { table }
            | BindError::ConstraintColumns { table, .. } => Some(table),
            BindError::DuplicateQuery { name }
            | BindError::DuplicateResultSetMapping { name }
            | BindError::DuplicateGenerator { name } => Some(name),
            BindError::UnknownResultSetMapping { query, .. } => Some(query),
            BindError::CyclicHierarchy { class_name } => Some(class_name),
            BindError::ForeignKeyCircularity { tables } => tables.first().map(String::as_str),
            BindError::Strict(warning) => Some(warning.subject()),
        }
    }
}

/// Outcome of a failed deferred-unit resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// A dependency is not ready yet; the unit can be retried in a later round.
    Recoverable(BindError),
    /// The unit can never succeed.
    Fatal(BindError),
}

impl Failure {
    /// Wrap a cause as retryable.
    pub fn recoverable(cause: BindError) -> Self {
        Failure::Recoverable(cause)
    }

    /// Check if the failure may succeed on retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Failure::Recoverable(_))
    }

    /// Get the underlying cause.
    pub fn cause(&self) -> &BindError {
        match self {
            Failure::Recoverable(cause) | Failure::Fatal(cause) => cause,
        }
    }

    /// Unwrap into the underlying cause; the caller treats it as fatal.
    pub fn into_cause(self) -> BindError {
        match self {
            Failure::Recoverable(cause) | Failure::Fatal(cause) => cause,
        }
    }
}

impl From<BindError> for Failure {
    fn from(cause: BindError) -> Self {
        Failure::Fatal(cause)
    }
}

/// Non-fatal diagnostics. Each one is resolved by a fixed fallback rule.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindWarning {
    /// A subclass declares an inheritance strategy different from its hierarchy's.
    #[error("{class_name} declares strategy {declared} but inherits {inherited}; keeping {inherited}")]
    StrategyConflict {
        /// Class name.
        class_name: String,
        /// Strategy the class declared.
        declared: String,
        /// Strategy of the hierarchy.
        inherited: String,
    },

    /// Table declaration on a class that does not own a table.
    #[error("{entity} does not own a table; table declaration {table} ignored")]
    TableIgnored {
        /// Entity name.
        entity: String,
        /// Declared table name.
        table: String,
    },

    /// Discriminator declared where it has no effect.
    #[error("{entity}: discriminator declaration ignored: {reason}")]
    DiscriminatorIgnored {
        /// Entity name.
        entity: String,
        /// Why it was ignored.
        reason: String,
    },

    /// Primary-key join columns on something that is not a joined subclass.
    #[error("{entity} is not a joined subclass; primary key join columns ignored")]
    PrimaryKeyJoinColumnsIgnored {
        /// Entity name.
        entity: String,
    },

    /// On-delete cascade on something that is not a joined subclass.
    #[error("{entity} is not a joined subclass; on-delete cascade ignored")]
    OnDeleteIgnored {
        /// Entity name.
        entity: String,
    },
}

impl BindWarning {
    /// Class or entity the warning is about.
    pub fn subject(&self) -> &str {
        match self {
            BindWarning::StrategyConflict { class_name, .. } => class_name,
            BindWarning::TableIgnored { entity, .. }
            | BindWarning::DiscriminatorIgnored { entity, .. }
            | BindWarning::PrimaryKeyJoinColumnsIgnored { entity }
            | BindWarning::OnDeleteIgnored { entity } => entity,
        }
    }
}

/// Crate-level error covering loading and binding.
#[derive(Debug, Error)]
pub enum Error {
    /// Fatal binding error.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// Reading a mapping document failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A mapping document could not be parsed.
    #[error("invalid mapping document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_path() {
        let err = BindError::UnknownEntity {
            path: "Order.customer".to_string(),
            target: "Customer".to_string(),
        };
        assert!(err.to_string().contains("Order.customer"));
        assert_eq!(err.path(), Some("Order.customer"));
        assert_eq!(err.kind(), ErrorKind::UnresolvedReference);
    }

    #[test]
    fn test_unmatched_columns_message() {
        let err = BindError::UnmatchedReferencedColumns {
            path: "Order.customer".to_string(),
            target: "Customer".to_string(),
            columns: vec!["code".to_string(), "region".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "referencedColumnNames(code, region) of Order.customer referencing Customer not mapped to a single property"
        );
    }

    #[test]
    fn test_circularity_message() {
        let err = BindError::ForeignKeyCircularity {
            tables: vec!["a".into(), "b".into(), "a".into()],
        };
        assert!(err.to_string().ends_with("a -> b -> a"));
        assert_eq!(err.kind(), ErrorKind::Circularity);
    }

    #[test]
    fn test_failure_conversions() {
        let cause = BindError::PrimaryKeyPending {
            table: "orders".to_string(),
        };
        let failure = Failure::recoverable(cause.clone());
        assert!(failure.is_recoverable());
        assert_eq!(failure.cause(), &cause);

        let fatal: Failure = cause.clone().into();
        assert!(!fatal.is_recoverable());
        assert_eq!(fatal.into_cause(), cause);
    }

    #[test]
    fn test_strict_wraps_warning() {
        let warning = BindWarning::TableIgnored {
            entity: "Cat".to_string(),
            table: "cats".to_string(),
        };
        let err = BindError::Strict(warning);
        assert_eq!(err.path(), Some("Cat"));
        assert!(err.to_string().starts_with("strict mode:"));
    }
}
