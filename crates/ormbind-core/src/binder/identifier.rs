//! Identifier binding and id-generator resolution.

use std::collections::BTreeMap;

use tracing::trace;

use crate::deferred::ValuePath;
use crate::error::BindError;
use crate::model::{Component, GeneratorSettings, Identifier, TableId, Value};
use crate::registry::Registry;
use crate::source::{GeneratedValue, GeneratorDefinition, IdentifierKind, IdentifierSpec, PropertySpec};

use super::property::PropertyBinder;

/// Strategy of an identifier without a generated value.
pub const ASSIGNED: &str = "assigned";

/// Named-generator strategies that never replace a declared generation type; only their
/// parameters are merged.
const NEVER_OVERRIDDEN: [&str; 3] = ["identity", "seqhilo", "table-hilo"];

/// Bind the identifier of a root entity.
///
/// `available` holds the properties of the class and its shared ancestors, where id-class
/// properties are looked up. Returns the identifier and the property names it consumed.
pub(crate) fn bind_identifier(
    binder: &mut PropertyBinder<'_>,
    spec: &IdentifierSpec,
    available: &[&PropertySpec],
    class_generators: &[GeneratorDefinition],
) -> Result<(Identifier, Vec<String>), BindError> {
    let entity = binder.entity.clone();
    let table = binder.table;
    let in_identifier = |name: &str| ValuePath {
        entity: entity.clone(),
        in_identifier: true,
        path: vec![name.to_string()],
    };

    let (property, value, embedded, id_class, consumed) = match &spec.kind {
        IdentifierKind::Simple { property } => {
            let bound = binder.bind(property, in_identifier(&property.name), table)?;
            (Some(property.name.clone()), bound.value, false, None, Vec::new())
        }
        IdentifierKind::Embedded { property } => {
            let bound = binder.bind(property, in_identifier(&property.name), table)?;
            (Some(property.name.clone()), bound.value, true, None, Vec::new())
        }
        IdentifierKind::IdClass {
            class_name,
            properties,
        } => {
            let mut bound = Vec::with_capacity(properties.len());
            for name in properties {
                let declared = available
                    .iter()
                    .find(|p| &p.name == name)
                    .ok_or_else(|| BindError::UnknownIdClassProperty {
                        entity: entity.clone(),
                        id_class: class_name.clone(),
                        property: name.clone(),
                    })?;
                bound.push(binder.bind(declared, in_identifier(name), table)?);
            }
            let value = Value::Component(Component {
                table,
                class_name: Some(class_name.clone()),
                properties: bound,
                embedded: false,
            });
            (None, value, true, Some(class_name.clone()), properties.clone())
        }
    };

    let mut local: BTreeMap<String, GeneratorDefinition> = BTreeMap::new();
    for generator in class_generators.iter().chain(&spec.generators) {
        local.insert(generator.name.clone(), generator.clone());
    }
    let columns = if value.has_pending_associations() {
        Vec::new()
    } else {
        value.columns()
    };
    let path = match &property {
        Some(name) => format!("{}.{}", entity, name),
        None => entity.clone(),
    };
    let generator = make_id_generator(
        binder.registry,
        &path,
        table,
        &columns,
        spec.generated.as_ref(),
        &local,
    )?;
    let declared = match &spec.generated {
        Some(generated) => generated.strategy.map(|s| s.strategy()).unwrap_or("native"),
        None => ASSIGNED,
    };
    let unsaved_value = (declared == ASSIGNED).then(|| "undefined".to_string());

    Ok((
        Identifier {
            property,
            value,
            embedded,
            id_class,
            generator,
            unsaved_value,
        },
        consumed,
    ))
}

/// Resolve the generator strategy and parameters of an identifier.
///
/// A named generator is looked up in `local` first, then among the registry's global
/// generators. Its strategy replaces the declared one, except when a generation type was
/// declared and the named generator's strategy is identity, seqhilo or table-hilo. Its
/// parameters are always merged over the defaults.
pub fn make_id_generator(
    registry: &Registry,
    path: &str,
    table: TableId,
    columns: &[String],
    generated: Option<&GeneratedValue>,
    local: &BTreeMap<String, GeneratorDefinition>,
) -> Result<GeneratorSettings, BindError> {
    let mut params = BTreeMap::new();
    params.insert("target_table".to_string(), registry.table_name(table));
    if let [column] = columns {
        params.insert("target_column".to_string(), column.clone());
    }

    let Some(generated) = generated else {
        return Ok(GeneratorSettings {
            strategy: ASSIGNED.to_string(),
            params,
        });
    };

    let mut strategy = generated
        .strategy
        .map(|s| s.strategy())
        .unwrap_or("native")
        .to_string();

    if let Some(name) = generated.generator.as_deref().filter(|n| !n.is_empty()) {
        let definition = local
            .get(name)
            .or_else(|| registry.generator(name))
            .ok_or_else(|| BindError::UnknownGenerator {
                path: path.to_string(),
                generator: name.to_string(),
            })?;
        let keep_declared = generated.strategy.is_some()
            && NEVER_OVERRIDDEN.contains(&definition.strategy.as_str());
        if !keep_declared && !definition.strategy.is_empty() {
            strategy = definition.strategy.clone();
        }
        params.extend(definition.params.clone());
    }

    trace!(path = %path, strategy = %strategy, "id generator resolved");
    Ok(GeneratorSettings { strategy, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileConfig;
    use crate::source::GenerationType;

    fn setup() -> (Registry, TableId) {
        let mut registry = Registry::new(CompileConfig::new());
        let table = registry.add_table("orders", None, None, false, None).unwrap();
        registry
            .add_generator(GeneratorDefinition::new("shared", "uuid").with_param("scope", "global"))
            .unwrap();
        (registry, table)
    }

    #[test]
    fn test_no_generated_value_is_assigned() {
        let (registry, table) = setup();
        let settings =
            make_id_generator(&registry, "Order.id", table, &["id".to_string()], None, &BTreeMap::new())
                .unwrap();
        assert_eq!(settings.strategy, ASSIGNED);
        assert_eq!(settings.params["target_table"], "orders");
        assert_eq!(settings.params["target_column"], "id");
    }

    #[test]
    fn test_auto_maps_to_native() {
        let (registry, table) = setup();
        let generated = GeneratedValue::of(GenerationType::Auto);
        let settings =
            make_id_generator(&registry, "Order.id", table, &[], Some(&generated), &BTreeMap::new())
                .unwrap();
        assert_eq!(settings.strategy, "native");
        assert!(!settings.params.contains_key("target_column"));
    }

    #[test]
    fn test_local_generator_shadows_global() {
        let (registry, table) = setup();
        let mut local = BTreeMap::new();
        local.insert(
            "shared".to_string(),
            GeneratorDefinition::new("shared", "sequence").with_param("scope", "local"),
        );
        let generated = GeneratedValue::named("shared");
        let settings =
            make_id_generator(&registry, "Order.id", table, &[], Some(&generated), &local).unwrap();
        assert_eq!(settings.strategy, "sequence");
        assert_eq!(settings.params["scope"], "local");
    }

    #[test]
    fn test_global_generator_used_when_no_local() {
        let (registry, table) = setup();
        let generated = GeneratedValue::named("shared");
        let settings =
            make_id_generator(&registry, "Order.id", table, &[], Some(&generated), &BTreeMap::new())
                .unwrap();
        assert_eq!(settings.strategy, "uuid");
        assert_eq!(settings.params["scope"], "global");
    }

    #[test]
    fn test_declared_identity_overridden_by_named_generator() {
        let (registry, table) = setup();
        let generated = GeneratedValue::of(GenerationType::Identity).with_generator("shared");
        let settings =
            make_id_generator(&registry, "Order.id", table, &[], Some(&generated), &BTreeMap::new())
                .unwrap();
        assert_eq!(settings.strategy, "uuid");
        assert_eq!(settings.params["scope"], "global");
    }

    #[test]
    fn test_auto_is_overridden_by_named_generator() {
        let (registry, table) = setup();
        let generated = GeneratedValue::of(GenerationType::Auto).with_generator("shared");
        let settings =
            make_id_generator(&registry, "Order.id", table, &[], Some(&generated), &BTreeMap::new())
                .unwrap();
        assert_eq!(settings.strategy, "uuid");
    }

    #[test]
    fn test_auto_keeps_native_over_named_seqhilo() {
        let (mut registry, table) = setup();
        registry
            .add_generator(GeneratorDefinition::new("hilo", "seqhilo").with_param("max_lo", "50"))
            .unwrap();
        let generated = GeneratedValue::of(GenerationType::Auto).with_generator("hilo");
        let settings =
            make_id_generator(&registry, "Order.id", table, &[], Some(&generated), &BTreeMap::new())
                .unwrap();
        assert_eq!(settings.strategy, "native");
        assert_eq!(settings.params["max_lo"], "50");
    }

    #[test]
    fn test_named_identity_applies_without_declared_type() {
        let (mut registry, table) = setup();
        registry
            .add_generator(GeneratorDefinition::new("ident", "identity"))
            .unwrap();
        let generated = GeneratedValue::named("ident");
        let settings =
            make_id_generator(&registry, "Order.id", table, &[], Some(&generated), &BTreeMap::new())
                .unwrap();
        assert_eq!(settings.strategy, "identity");
    }

    #[test]
    fn test_unknown_generator() {
        let (registry, table) = setup();
        let generated = GeneratedValue::named("missing");
        let err =
            make_id_generator(&registry, "Order.id", table, &[], Some(&generated), &BTreeMap::new())
                .unwrap_err();
        assert!(matches!(err, BindError::UnknownGenerator { .. }));
    }
}
