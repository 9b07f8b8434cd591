//! Phase-one binding: class ordering, inheritance facts, entities, identifiers and properties.

mod entity;
mod hierarchy;
mod identifier;
mod inheritance;
mod property;
mod synthetic;

pub use entity::EntityBinder;
pub use hierarchy::{HierarchyOrder, HierarchyOrderer};
pub use identifier::{make_id_generator, ASSIGNED};
pub use inheritance::{InheritanceState, InheritanceStateCalculator};
pub use synthetic::{SyntheticReference, SyntheticReferenceBuilder};
