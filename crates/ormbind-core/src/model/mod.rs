//! Resolved entity and table model.
//!
//! Tables live in an arena owned by the run's registry and are addressed by [`TableId`];
//! entities refer to tables by id and to each other by name.

mod entity;
mod resolved;
mod table;
mod value;

pub use entity::{
    Discriminator, Entity, EntityKind, GeneratorSettings, Identifier, Join, SharedAncestor,
};
pub use resolved::{ModelStats, ResolvedModel};
pub use table::{qualify, Column, ForeignKey, Index, PrimaryKey, Table, TableId, UniqueKey};
pub use value::{
    AnyValue, Collection, CollectionElement, Component, MapKey, Property, Selectable, SimpleValue,
    ToOne, ToOneKind, Value,
};
