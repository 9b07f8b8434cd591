//! Deferred resolution units.

use crate::error::Failure;
use crate::registry::Registry;

use super::passes::{
    CollectionPass, ForeignKeyPass, InverseOneToOnePass, KeyPass, QueryMappingPass,
    SecondaryTablePass, SimpleTypePass,
};

/// Location of a value inside an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePath {
    /// Entity holding the value.
    pub entity: String,
    /// The value belongs to the entity's identifier.
    pub in_identifier: bool,
    /// Property names from the entity (or identifier) down to the value.
    pub path: Vec<String>,
}

impl ValuePath {
    /// Path of a top-level property.
    pub fn property(entity: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            in_identifier: false,
            path: vec![property.into()],
        }
    }

    /// Path of a nested property.
    pub fn child(&self, property: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(property.into());
        Self {
            entity: self.entity.clone(),
            in_identifier: self.in_identifier,
            path,
        }
    }

    /// Name of the innermost property.
    pub fn leaf(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    /// `Entity.property.nested` form for diagnostics.
    pub fn display(&self) -> String {
        let mut out = self.entity.clone();
        for segment in &self.path {
            out.push('.');
            out.push_str(segment);
        }
        out
    }
}

/// Kind of a deferred unit, in global processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitKind {
    /// Resolve type definitions of basic values.
    SimpleTypeFinalize,
    /// Create a root entity's primary key.
    KeyCreate,
    /// Create the key and foreign key of a secondary table.
    SecondaryTableFinalize,
    /// Create a foreign key (association or joined subclass).
    ForeignKeyCreate,
    /// Anything else that may need another unit first.
    Generic,
}

/// Units with no dedicated stage, resolved by the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericPass {
    /// Collection binding.
    Collection(CollectionPass),
    /// Inverse one-to-one binding.
    InverseOneToOne(InverseOneToOnePass),
    /// Native query result-set mapping check.
    QueryMapping(QueryMappingPass),
}

impl GenericPass {
    fn resolve(&self, registry: &mut Registry) -> Result<(), Failure> {
        match self {
            GenericPass::Collection(pass) => pass.resolve(registry),
            GenericPass::InverseOneToOne(pass) => pass.resolve(registry),
            GenericPass::QueryMapping(pass) => pass.resolve(registry),
        }
    }

    fn describe(&self) -> String {
        match self {
            GenericPass::Collection(pass) => pass.role.clone(),
            GenericPass::InverseOneToOne(pass) => pass.value.display(),
            GenericPass::QueryMapping(pass) => pass.query.clone(),
        }
    }
}

/// A unit of binding work postponed until every entity is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredUnit {
    /// Resolve type definitions of basic values.
    SimpleTypeFinalize(SimpleTypePass),
    /// Create a root entity's primary key.
    KeyCreate(KeyPass),
    /// Create the key and foreign key of a secondary table.
    SecondaryTableFinalize(SecondaryTablePass),
    /// Create a foreign key.
    ForeignKeyCreate(ForeignKeyPass),
    /// Anything else.
    Generic(GenericPass),
}

impl DeferredUnit {
    /// Kind of the unit.
    pub fn kind(&self) -> UnitKind {
        match self {
            DeferredUnit::SimpleTypeFinalize(_) => UnitKind::SimpleTypeFinalize,
            DeferredUnit::KeyCreate(_) => UnitKind::KeyCreate,
            DeferredUnit::SecondaryTableFinalize(_) => UnitKind::SecondaryTableFinalize,
            DeferredUnit::ForeignKeyCreate(_) => UnitKind::ForeignKeyCreate,
            DeferredUnit::Generic(_) => UnitKind::Generic,
        }
    }

    /// Human-readable location the unit works on.
    pub fn describe(&self) -> String {
        match self {
            DeferredUnit::SimpleTypeFinalize(pass) => pass.value.display(),
            DeferredUnit::KeyCreate(pass) => pass.entity.clone(),
            DeferredUnit::SecondaryTableFinalize(pass) => pass.entity.clone(),
            DeferredUnit::ForeignKeyCreate(pass) => pass.path.clone(),
            DeferredUnit::Generic(pass) => pass.describe(),
        }
    }

    /// Complete the postponed binding.
    pub fn resolve(&self, registry: &mut Registry) -> Result<(), Failure> {
        match self {
            DeferredUnit::SimpleTypeFinalize(pass) => pass.resolve(registry),
            DeferredUnit::KeyCreate(pass) => pass.resolve(registry),
            DeferredUnit::SecondaryTableFinalize(pass) => pass.resolve(registry),
            DeferredUnit::ForeignKeyCreate(pass) => pass.resolve(registry),
            DeferredUnit::Generic(pass) => pass.resolve(registry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_path_display() {
        let path = ValuePath::property("Order", "address").child("zip");
        assert_eq!(path.display(), "Order.address.zip");
        assert_eq!(path.leaf(), "zip");
    }

    #[test]
    fn test_unit_kind_order() {
        assert!(UnitKind::SimpleTypeFinalize < UnitKind::KeyCreate);
        assert!(UnitKind::KeyCreate < UnitKind::SecondaryTableFinalize);
        assert!(UnitKind::SecondaryTableFinalize < UnitKind::ForeignKeyCreate);
        assert!(UnitKind::ForeignKeyCreate < UnitKind::Generic);
    }
}
