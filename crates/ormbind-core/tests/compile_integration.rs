//! End-to-end compilation tests.

use std::io::Write;

use ormbind_core::model::{CollectionElement, Value};
use ormbind_core::source::{
    AssociationSpec, CollectionSpec, IdentifierSpec, InheritanceStrategy, PropertySpec,
};
use ormbind_core::{
    BindError, BindWarning, ClassDescriptor, CompileConfig, EntityKind, ErrorKind,
    HierarchyOrderer, MappingSource, MetadataCompiler, NamingStrategy, ResolvedModel,
};
use pretty_assertions::assert_eq;

fn id() -> IdentifierSpec {
    IdentifierSpec::simple(PropertySpec::basic("id", "long"))
}

fn identifying(property: &str, target: &str) -> IdentifierSpec {
    IdentifierSpec::simple(PropertySpec::many_to_one(property, AssociationSpec::to(target)))
}

fn compile(source: &MappingSource) -> Result<ResolvedModel, BindError> {
    MetadataCompiler::default().compile(source)
}

fn hierarchy(strategy: InheritanceStrategy) -> MappingSource {
    MappingSource::new()
        .with_class(ClassDescriptor::entity("Savings").extends("Account"))
        .with_class(
            ClassDescriptor::entity("Account")
                .with_inheritance(strategy)
                .with_identifier(id())
                .with_property(PropertySpec::basic("balance", "decimal")),
        )
        .with_class(
            ClassDescriptor::entity("Checking")
                .extends("Account")
                .with_property(PropertySpec::basic("overdraft", "decimal")),
        )
}

#[test]
fn test_hierarchy_orders_ancestors_first() {
    let source = MappingSource::new()
        .with_class(ClassDescriptor::entity("C").extends("B"))
        .with_class(ClassDescriptor::entity("A").with_identifier(id()))
        .with_class(ClassDescriptor::entity("B").extends("A"));
    let order = HierarchyOrderer::order(&source).unwrap();
    assert_eq!(order.classes, vec!["A", "B", "C"]);

    let model = compile(&source).unwrap();
    let names: Vec<&str> = model.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[test]
fn test_strategy_conflicts_warn_once_per_subclass() {
    let source = MappingSource::new()
        .with_class(ClassDescriptor::entity("A").with_identifier(id()))
        .with_class(
            ClassDescriptor::entity("B")
                .extends("A")
                .with_inheritance(InheritanceStrategy::Joined),
        )
        .with_class(
            ClassDescriptor::entity("C")
                .extends("B")
                .with_inheritance(InheritanceStrategy::TablePerClass),
        );
    let model = compile(&source).unwrap();

    let conflicts: Vec<&str> = model
        .warnings
        .iter()
        .filter(|w| matches!(w, BindWarning::StrategyConflict { .. }))
        .map(|w| w.subject())
        .collect();
    assert_eq!(conflicts, vec!["B", "C"]);
    assert_eq!(model.tables.len(), 1);
    assert!(model
        .entities
        .iter()
        .skip(1)
        .all(|e| e.kind == EntityKind::SingleTableChild));
}

#[test]
fn test_table_count_per_strategy() {
    let single = compile(&hierarchy(InheritanceStrategy::SingleTable)).unwrap();
    assert_eq!(single.tables.len(), 1);
    let table = single.entity_table("Account").unwrap();
    assert!(table.has_column("DTYPE"));
    assert!(table.column("overdraft").unwrap().nullable);

    let joined = compile(&hierarchy(InheritanceStrategy::Joined)).unwrap();
    assert_eq!(joined.tables.len(), 3);
    let savings = joined.entity_table("Savings").unwrap();
    assert_eq!(savings.primary_key_columns(), ["id".to_string()]);
    assert_eq!(savings.foreign_keys[0].referenced_entity, "Account");

    let union = compile(&hierarchy(InheritanceStrategy::TablePerClass)).unwrap();
    assert_eq!(union.tables.len(), 3);
    let checking = union.entity_table("Checking").unwrap();
    assert!(checking.has_column("balance"));
    assert!(checking.has_column("overdraft"));
    assert_eq!(checking.primary_key_columns(), ["id".to_string()]);
    assert_eq!(union.entities_of_kind(EntityKind::UnionChild).count(), 2);
}

#[test]
fn test_identifying_chain_resolves_in_dependency_order() {
    let source = MappingSource::new()
        .with_class(ClassDescriptor::entity("A").with_identifier(identifying("b", "B")))
        .with_class(ClassDescriptor::entity("B").with_identifier(identifying("c", "C")))
        .with_class(ClassDescriptor::entity("C").with_identifier(identifying("d", "D")))
        .with_class(ClassDescriptor::entity("D").with_identifier(id()));
    let model = compile(&source).unwrap();

    assert_eq!(model.entity_table("C").unwrap().primary_key_columns(), ["d_id".to_string()]);
    assert_eq!(model.entity_table("B").unwrap().primary_key_columns(), ["c_d_id".to_string()]);
    assert_eq!(model.entity_table("A").unwrap().primary_key_columns(), ["b_c_d_id".to_string()]);
    assert_eq!(model.entity("A").unwrap().key_columns, vec!["b_c_d_id"]);
    let fk = &model.entity_table("A").unwrap().foreign_keys[0];
    assert_eq!(fk.referenced_columns, vec!["c_d_id"]);
}

#[test]
fn test_mutual_identifying_associations_are_circular() {
    let source = MappingSource::new()
        .with_class(ClassDescriptor::entity("A").with_identifier(identifying("b", "B")))
        .with_class(ClassDescriptor::entity("B").with_identifier(identifying("a", "A")));
    let err = compile(&source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Circularity);
    let BindError::ForeignKeyCircularity { tables } = err else {
        panic!("expected a circularity error");
    };
    assert_eq!(tables.first(), tables.last());
    assert!(tables.contains(&"A".to_string()));
    assert!(tables.contains(&"B".to_string()));
}

#[test]
fn test_inverse_many_to_many_converges_on_retry() {
    // The inverse side is queued before the owning side it depends on.
    let source = MappingSource::new()
        .with_class(
            ClassDescriptor::entity("Course")
                .with_identifier(id())
                .with_property(PropertySpec::many_to_many(
                    "students",
                    CollectionSpec::of("Student").mapped_by("courses"),
                )),
        )
        .with_class(
            ClassDescriptor::entity("Student")
                .with_identifier(id())
                .with_property(PropertySpec::many_to_many(
                    "courses",
                    CollectionSpec::of("Course"),
                )),
        );
    let model = compile(&source).unwrap();

    let collection_table = |entity: &str, property: &str| {
        match &model.entity(entity).unwrap().property(property).unwrap().value {
            Value::Collection(collection) => collection.table,
            other => panic!("not a collection: {:?}", other),
        }
    };
    let owning = collection_table("Student", "courses").unwrap();
    assert_eq!(collection_table("Course", "students"), Some(owning));

    let join_table = model.table(owning).unwrap();
    assert_eq!(join_table.name, "Student_Course");
    assert_eq!(join_table.foreign_keys.len(), 2);
}

#[test]
fn test_inverse_one_to_many_uses_owning_foreign_key() {
    let source = MappingSource::new()
        .with_class(
            ClassDescriptor::entity("Customer")
                .with_identifier(id())
                .with_property(PropertySpec::one_to_many(
                    "orders",
                    CollectionSpec::of("Order").mapped_by("customer"),
                )),
        )
        .with_class(
            ClassDescriptor::entity("Order")
                .with_identifier(id())
                .with_property(PropertySpec::many_to_one(
                    "customer",
                    AssociationSpec::to("Customer"),
                )),
        );
    let model = compile(&source).unwrap();

    let Value::Collection(orders) = &model
        .entity("Customer")
        .unwrap()
        .property("orders")
        .unwrap()
        .value
    else {
        panic!("orders is not a collection");
    };
    assert!(orders.inverse);
    assert_eq!(orders.key_columns, vec!["customer_id"]);
    assert!(matches!(orders.element, CollectionElement::Entity { .. }));
}

#[test]
fn test_unknown_mapped_by_is_fatal() {
    let source = MappingSource::new()
        .with_class(
            ClassDescriptor::entity("Customer")
                .with_identifier(id())
                .with_property(PropertySpec::one_to_many(
                    "orders",
                    CollectionSpec::of("Order").mapped_by("buyer"),
                )),
        )
        .with_class(ClassDescriptor::entity("Order").with_identifier(id()));
    let err = compile(&source).unwrap_err();
    assert!(matches!(err, BindError::UnknownMappedBy { .. }));
}

#[test]
fn test_snake_case_naming_and_default_schema() {
    let source = MappingSource::new().with_class(
        ClassDescriptor::entity("LineItem")
            .with_identifier(id())
            .with_property(PropertySpec::basic("unitPrice", "decimal")),
    );
    let config = CompileConfig::new()
        .with_naming(NamingStrategy::SnakeCase)
        .with_default_schema("shop");
    let model = MetadataCompiler::new(config).compile(&source).unwrap();

    let table = model.entity_table("LineItem").unwrap();
    assert_eq!(table.qualified_name(), "shop.line_item");
    assert!(table.has_column("unit_price"));
}

#[test]
fn test_strict_mode_rejects_warnings() {
    let source = hierarchy(InheritanceStrategy::SingleTable).with_class(
        ClassDescriptor::entity("Loan")
            .extends("Account")
            .with_inheritance(InheritanceStrategy::Joined),
    );
    assert!(compile(&source).is_ok());

    let err = MetadataCompiler::new(CompileConfig::new().strict())
        .compile(&source)
        .unwrap_err();
    assert!(matches!(err, BindError::Strict(BindWarning::StrategyConflict { .. })));
}

#[test]
fn test_compile_from_json_document() {
    let json = r#"{
        "classes": [
            {
                "class_name": "com.shop.Customer",
                "identifier": {
                    "kind": { "type": "simple", "property": { "name": "id", "type_name": "long" } },
                    "generated": { "strategy": "identity" }
                },
                "properties": [
                    { "name": "email", "type_name": "string", "columns": [ { "name": "email", "nullable": false } ] }
                ]
            }
        ]
    }"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let source = MappingSource::from_path(file.path()).unwrap();
    let model = compile(&source).unwrap();

    let customer = model.entity("Customer").unwrap();
    assert_eq!(customer.class_name, "com.shop.Customer");
    let identifier = customer.identifier.as_ref().unwrap();
    assert_eq!(identifier.generator.strategy, "identity");
    assert_eq!(identifier.unsaved_value, None);
    let table = model.entity_table("Customer").unwrap();
    assert!(!table.column("email").unwrap().nullable);
}

#[test]
fn test_invalid_json_document() {
    let err = MappingSource::from_json_str("{ \"classes\": 3 }").unwrap_err();
    assert!(matches!(err, ormbind_core::Error::Parse(_)));
}
