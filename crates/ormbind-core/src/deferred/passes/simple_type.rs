//! Type-definition resolution for basic values.

use std::collections::HashMap;

use crate::error::{BindError, Failure};
use crate::model::{SimpleValue, Value};
use crate::registry::Registry;
use crate::source::TypeDef;

use super::super::unit::ValuePath;

/// Replaces type-definition names on a property's basic values with the defined type and
/// merges the definition's parameters (declared parameters win).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleTypePass {
    /// Property whose basic values are finalized.
    pub value: ValuePath,
}

impl SimpleTypePass {
    /// Create a pass for a property.
    pub fn new(value: ValuePath) -> Self {
        Self { value }
    }

    /// Resolve the type definitions.
    pub fn resolve(&self, registry: &mut Registry) -> Result<(), Failure> {
        let mut names = Vec::new();
        {
            let value = locate(registry, &self.value)?;
            collect_type_names(value, &mut names);
        }

        let definitions: HashMap<String, TypeDef> = names
            .into_iter()
            .filter_map(|name| registry.type_def(&name).cloned().map(|def| (name, def)))
            .collect();
        if definitions.is_empty() {
            return Ok(());
        }

        let value = registry
            .entity_mut(&self.value.entity)
            .and_then(|entity| entity.value_mut(self.value.in_identifier, &self.value.path))
            .ok_or_else(|| missing(&self.value))?;
        value.for_each_simple_mut(&mut |simple: &mut SimpleValue| {
            let Some(def) = simple.type_name.as_deref().and_then(|n| definitions.get(n)) else {
                return;
            };
            simple.type_name = Some(def.type_name.clone());
            for (key, param) in &def.params {
                simple
                    .type_params
                    .entry(key.clone())
                    .or_insert_with(|| param.clone());
            }
        });
        Ok(())
    }
}

fn locate<'a>(registry: &'a Registry, path: &ValuePath) -> Result<&'a Value, BindError> {
    registry
        .entity(&path.entity)
        .and_then(|entity| entity.value(path.in_identifier, &path.path))
        .ok_or_else(|| missing(path))
}

fn missing(path: &ValuePath) -> BindError {
    BindError::Internal {
        path: path.display(),
        message: "value not bound".to_string(),
    }
}

fn collect_type_names(value: &Value, names: &mut Vec<String>) {
    match value {
        Value::Simple(simple) => {
            if let Some(name) = &simple.type_name {
                names.push(name.clone());
            }
        }
        Value::Component(component) => {
            for property in &component.properties {
                collect_type_names(&property.value, names);
            }
        }
        _ => {}
    }
}
