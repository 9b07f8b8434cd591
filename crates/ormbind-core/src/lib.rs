//! ormbind core - Object-relational mapping metadata resolution.
//!
//! Turns declarative class mappings (entities, properties, associations, inheritance,
//! identifier generation) into a resolved relational model of tables, keys and per-entity
//! property graphs.
//!
//! A run orders the classes ancestors first, computes inheritance facts, binds each class,
//! then drains the deferred work queue: fixed stages first, then identifying foreign keys in
//! dependency order, then the remaining units to a fixed point.

pub mod binder;
pub mod compiler;
pub mod config;
pub mod deferred;
pub mod error;
pub mod model;
pub mod registry;
pub mod source;

pub use binder::{
    EntityBinder, HierarchyOrder, HierarchyOrderer, InheritanceState, InheritanceStateCalculator,
    SyntheticReference, SyntheticReferenceBuilder,
};
pub use compiler::MetadataCompiler;
pub use config::{CompileConfig, NamingStrategy};
pub use deferred::{
    DeferredUnit, DeferredWorkQueue, DependencyNode, DependencyOrderer, QueueReport,
    RetryReport, RetryResolver, UnitKind,
};
pub use error::{BindError, BindWarning, Error, ErrorKind, Failure};
pub use model::{Entity, EntityKind, ModelStats, ResolvedModel, Table, TableId};
pub use registry::{PropertyReference, Registry};
pub use source::{ClassDescriptor, MappingSource};
