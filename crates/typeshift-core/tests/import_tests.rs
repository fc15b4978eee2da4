use std::path::Path;
use std::sync::Arc;

use typeshift_core::error::ConversionError;
use typeshift_core::import::{Dialect, ImportDispatcher, ImportOptions};
use typeshift_core::model::{ArgumentLocation, PropertyKind, Shape, TypeKind};
use typeshift_core::naming::DigestNaming;
use typeshift_core::resolve::{FileFetcher, OfflineResolver};

const PARTIAL: &str = include_str!("fixtures/partial.typeschema.json");
const LEGACY: &str = include_str!("fixtures/legacy.internal.json");
const PETSTORE_JSON: &str = include_str!("fixtures/petstore.openapi.json");
const PETSTORE_YAML: &str = include_str!("fixtures/petstore.openapi.yaml");
const ORDER: &str = include_str!("fixtures/order.sample.json");

fn dispatcher() -> ImportDispatcher {
    ImportDispatcher::new(
        Arc::new(OfflineResolver),
        Arc::new(DigestNaming::default()),
        ImportOptions::default(),
    )
}

#[tokio::test]
async fn one_broken_definition_is_dropped() {
    let imported = dispatcher()
        .import("typeschema", PARTIAL)
        .await
        .expect("document should import");
    let spec = &imported.spec;

    let names: Vec<&str> = spec.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Pet", "Person", "Tags"]);
    assert_eq!(spec.root_type().map(|t| t.name.as_str()), Some("Pet"));

    assert_eq!(imported.diagnostics.len(), 1);
    assert_eq!(imported.diagnostics[0].entry, "Broken");
    assert!(matches!(
        imported.diagnostics[0].error,
        ConversionError::UnresolvableReference(_)
    ));

    let pet = &spec.types[0];
    assert_eq!(pet.description, "A pet in the store");
    assert_eq!(pet.property("name").and_then(|p| p.max_length), Some(64));
    let owner = pet.property("owner").expect("owner property");
    assert_eq!(owner.kind, PropertyKind::Object);
    assert_eq!(owner.reference.as_deref(), Some("Person"));

    let tags = &spec.types[2];
    assert_eq!(tags.kind, TypeKind::Array);
    assert_eq!(tags.reference.as_deref(), Some("string"));

    // Nothing left dangling once the broken type is gone
    assert!(spec.unresolved_references().is_empty());
}

#[tokio::test]
async fn legacy_body_arguments_fold_into_payload() {
    let spec = dispatcher()
        .transform("internal", LEGACY)
        .await
        .expect("legacy model should load");

    let create = spec.find_operation("pets.create").expect("pets.create");
    assert_eq!(create.payload.as_deref(), Some("Pet"));
    assert_eq!(create.payload_shape, None);
    assert_eq!(create.http_code, 201);
    let args: Vec<&str> = create.arguments.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(args, vec!["dryRun"]);

    // An explicit payload wins over a body argument
    let replace = spec.find_operation("pets.replace").expect("pets.replace");
    assert_eq!(replace.payload.as_deref(), Some("Pet"));
    assert!(
        replace
            .arguments
            .iter()
            .all(|a| a.location != ArgumentLocation::Body)
    );

    // Out-of-range root index is dropped
    assert_eq!(spec.root, None);
}

#[tokio::test]
async fn openapi_petstore() {
    let imported = dispatcher()
        .import("openapi-json", PETSTORE_JSON)
        .await
        .expect("petstore should import");
    assert!(imported.diagnostics.is_empty());
    let spec = imported.spec;

    assert_eq!(
        spec.base_url.as_deref(),
        Some("https://petstore.example.com/v1")
    );
    assert_eq!(spec.security, None);

    let names: Vec<&str> = spec.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names.len(), 3);
    assert_eq!(&names[..2], ["Pet", "Error"]);
    assert!(names[2].starts_with("Object_"));
    assert_eq!(names[2].len(), "Object_".len() + 12);

    let pet = &spec.types[0];
    assert!(pet.property("tag").expect("tag").nullable);
    assert_eq!(pet.property("id").and_then(|p| p.format.as_deref()), Some("int64"));

    let page = &spec.types[2];
    let items = page.property("items").expect("items");
    assert_eq!(items.kind, PropertyKind::Array);
    assert_eq!(items.reference.as_deref(), Some("Pet"));

    let ops: Vec<&str> = spec.operations.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(ops, vec!["listPets", "createPet", "showPetById", "deletePet"]);

    let list = &spec.operations[0];
    assert_eq!(list.description, "List all pets");
    assert_eq!(list.tags, vec!["pets"]);
    assert_eq!(list.return_type.as_deref(), Some(names[2]));
    assert_eq!(list.arguments.len(), 1);
    assert_eq!(list.arguments[0].type_name, "integer");
    assert_eq!(list.arguments[0].location, ArgumentLocation::Query);
    // `default` responses are neither a return nor a throw
    assert!(list.throws.is_empty());

    let create = &spec.operations[1];
    assert_eq!(create.payload.as_deref(), Some("Pet"));
    assert_eq!(create.http_code, 201);
    assert_eq!(create.return_type.as_deref(), Some("Pet"));
    assert_eq!(create.throws.len(), 1);
    assert_eq!(create.throws[0].code, 400);
    assert_eq!(create.throws[0].type_name, "Error");

    let show = &spec.operations[2];
    assert_eq!(show.arguments[0].name, "petId");
    assert_eq!(show.arguments[0].location, ArgumentLocation::Path);
    assert_eq!(show.throws[0].code, 404);

    let delete = &spec.operations[3];
    assert_eq!(delete.http_code, 204);
    assert_eq!(delete.return_type, None);
    assert_eq!(delete.stability, Some(0));
    assert_eq!(delete.arguments.len(), 1);

    assert!(spec.unresolved_references().is_empty());
}

#[tokio::test]
async fn openapi_yaml_matches_json() {
    let dispatcher = dispatcher();
    let from_json = dispatcher.transform("openapi-json", PETSTORE_JSON).await.unwrap();
    let from_yaml = dispatcher.transform("openapi-yaml", PETSTORE_YAML).await.unwrap();
    assert_eq!(from_yaml, from_json);
}

#[tokio::test]
async fn anonymous_names_are_stable_across_imports() {
    let first = dispatcher().transform("openapi-json", PETSTORE_JSON).await.unwrap();
    let second = dispatcher().transform("openapi-json", PETSTORE_JSON).await.unwrap();
    assert_eq!(first.types[2].name, second.types[2].name);
}

#[tokio::test]
async fn route_based_names_with_aliases() {
    let options = ImportOptions {
        naming_strategy: typeshift_core::config::NamingStrategy::UseRouteBased,
        aliases: [("PetsGet".to_string(), "listPets".to_string())]
            .into_iter()
            .collect(),
        ..ImportOptions::default()
    };
    let dispatcher = ImportDispatcher::new(
        Arc::new(OfflineResolver),
        Arc::new(DigestNaming::default()),
        options,
    );
    let spec = dispatcher.transform("openapi-json", PETSTORE_JSON).await.unwrap();
    let ops: Vec<&str> = spec.operations.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(ops, vec!["listPets", "PetsPost", "PetsPetIdGet", "PetsPetIdDelete"]);
}

#[tokio::test]
async fn raw_sample_inference() {
    let spec = dispatcher().transform("raw-json", ORDER).await.unwrap();

    assert_eq!(spec.types.len(), 3);
    assert_eq!(spec.root, Some(0));
    assert!(spec.operations.is_empty());

    let order = &spec.types[0];
    assert!(order.name.starts_with("Type_"));
    let kinds: Vec<(&str, PropertyKind)> = order
        .properties
        .iter()
        .map(|p| (p.name.as_str(), p.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("id", PropertyKind::Integer),
            ("placedAt", PropertyKind::String),
            ("total", PropertyKind::Number),
            ("paid", PropertyKind::Boolean),
            ("customer", PropertyKind::Object),
            ("items", PropertyKind::Array),
            ("notes", PropertyKind::Array),
        ]
    );
    assert_eq!(
        order.property("placedAt").and_then(|p| p.format.as_deref()),
        Some("date-time")
    );
    assert_eq!(order.property("notes").and_then(|p| p.reference.clone()), None);

    let customer = order
        .property("customer")
        .and_then(|p| p.reference.as_deref())
        .expect("customer reference");
    let (_, customer) = spec.find_type(customer).expect("customer type");
    assert_eq!(
        customer.property("since").and_then(|p| p.format.as_deref()),
        Some("date")
    );

    let item = order
        .property("items")
        .and_then(|p| p.reference.as_deref())
        .expect("item reference");
    let (_, item) = spec.find_type(item).expect("item type");
    assert_eq!(item.property("quantity").map(|p| p.kind), Some(PropertyKind::Integer));
}

#[tokio::test]
async fn raw_yaml_sample() {
    let spec = dispatcher()
        .transform("raw-yaml", "name: Rex\nage: 3\n")
        .await
        .unwrap();
    assert_eq!(spec.types.len(), 1);
    assert_eq!(spec.types[0].properties.len(), 2);
}

#[tokio::test]
async fn jsonschema_yaml_definitions() {
    let spec = dispatcher()
        .transform(
            "jsonschema-yaml",
            r##"
title: person
type: object
properties:
  name:
    type: string
  address:
    $ref: "#/$defs/Address"
$defs:
  Address:
    type: object
    properties:
      city:
        type: string
"##,
        )
        .await
        .unwrap();

    let names: Vec<&str> = spec.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Address", "Person"]);
    assert_eq!(spec.root_type().map(|t| t.name.as_str()), Some("Person"));
    assert!(spec.unresolved_references().is_empty());
}

#[tokio::test]
async fn file_includes_are_resolved_through_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let common = dir.path().join("common.json");
    std::fs::write(
        &common,
        r#"{"definitions": {"Address": {"type": "struct", "properties": {"city": {"type": "string"}}}}}"#,
    )
    .unwrap();
    let url = url::Url::from_file_path(&common).unwrap();

    let document = format!(
        r#"{{
            "$import": {{"common": "{url}"}},
            "definitions": {{
                "Person": {{"type": "struct", "properties": {{"home": {{"$ref": "common:Address"}}}}}}
            }}
        }}"#
    );

    let dispatcher =
        ImportDispatcher::with_sources(Arc::new(FileFetcher), None, ImportOptions::default());
    let spec = dispatcher.transform("typeschema", &document).await.unwrap();

    let include = &spec.imports[0];
    assert_eq!(include.alias, "common");
    let types = include.types.as_ref().expect("include should resolve");
    assert_eq!(types[0].name, "Address");
    assert!(spec.unresolved_references().is_empty());
}

#[tokio::test]
async fn missing_include_stays_unresolved() {
    let dispatcher =
        ImportDispatcher::with_sources(Arc::new(FileFetcher), None, ImportOptions::default());
    let spec = dispatcher
        .transform(
            "typeschema",
            r#"{"$import": {"gone": "file:///nonexistent/typeshift/gone.json"}, "definitions": {}}"#,
        )
        .await
        .unwrap();
    assert_eq!(spec.imports.len(), 1);
    assert!(spec.imports[0].types.is_none());
}

#[test]
fn fixture_names_select_dialects() {
    let guess = |name: &str| Dialect::from_path(Path::new(name));
    assert_eq!(guess("petstore.openapi.json"), Some(Dialect::OpenApiJson));
    assert_eq!(guess("petstore.openapi.yaml"), Some(Dialect::OpenApiYaml));
    assert_eq!(guess("partial.typeschema.json"), Some(Dialect::TypeSchema));
    assert_eq!(guess("legacy.internal.json"), Some(Dialect::Internal));
    assert_eq!(guess("order.sample.json"), Some(Dialect::RawJson));
    assert_eq!(guess("animals.typeapi.json"), Some(Dialect::TypeApi));
}

#[tokio::test]
async fn payload_shapes_survive_import() {
    let spec = dispatcher()
        .transform(
            "typeapi",
            r#"{"operations": {"upload": {
                "method": "POST",
                "arguments": {"file": {"in": "body", "contentType": "application/octet-stream"}},
                "return": {"schema": {"type": "object", "additionalProperties": {"type": "integer"}}}
            }}}"#,
        )
        .await
        .unwrap();
    let op = &spec.operations[0];
    assert_eq!(op.payload.as_deref(), Some("application/octet-stream"));
    assert_eq!(op.payload_shape, Some(Shape::Mime));
    assert_eq!(op.return_type.as_deref(), Some("integer"));
    assert_eq!(op.return_shape, Some(Shape::Map));
}
