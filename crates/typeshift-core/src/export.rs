//! Serialization of a [`Specification`] into a TypeAPI document.
//!
//! The output is what the TypeAPI importer reads back: struct, map, array and
//! reference definitions, operations with their arguments grouped by binding,
//! and `$import` locators. Any dangling reference aborts the export.

use log::warn;
use serde_json::{Map, Value, json};

use crate::error::ExportError;
use crate::model::{
    ArgumentLocation, GENERIC_PARAMETER, Operation, Property, PropertyKind, Shape, Specification,
    Type, TypeKind, is_scalar,
};

/// The status code whose response carries no body.
const NO_CONTENT: u16 = 204;

/// Name of the synthesized body argument.
const PAYLOAD_ARGUMENT: &str = "payload";

/// Build the TypeAPI document of `spec`.
pub fn export(spec: &Specification) -> Result<Value, ExportError> {
    let mut document = Map::new();

    if let Some(base_url) = &spec.base_url {
        document.insert("baseUrl".into(), json!(base_url));
    }
    if let Some(security) = &spec.security {
        document.insert("security".into(), serde_json::to_value(security)?);
    }

    if !spec.imports.is_empty() {
        let mut imports = Map::new();
        for include in &spec.imports {
            match include.locator() {
                Some(locator) => {
                    imports.insert(include.alias.clone(), json!(locator));
                }
                None => warn!("include `{}` has no locator, not exported", include.alias),
            }
        }
        document.insert("$import".into(), Value::Object(imports));
    }

    if !spec.operations.is_empty() {
        let mut operations = Map::new();
        for operation in &spec.operations {
            operations.insert(operation.name.clone(), export_operation(operation)?);
        }
        document.insert("operations".into(), Value::Object(operations));
    }

    if !spec.types.is_empty() {
        let mut definitions = Map::new();
        for ty in &spec.types {
            definitions.insert(ty.name.clone(), export_type(spec, ty)?);
        }
        document.insert("definitions".into(), Value::Object(definitions));
    }

    if let Some(root) = spec.root_type() {
        document.insert("$ref".into(), json!(root.name));
    }

    Ok(Value::Object(document))
}

pub fn to_json_string(spec: &Specification, pretty: bool) -> Result<String, ExportError> {
    let document = export(spec)?;
    let text = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    Ok(text)
}

pub fn to_yaml_string(spec: &Specification) -> Result<String, ExportError> {
    Ok(serde_yaml_ng::to_string(&export(spec)?)?)
}

fn missing(context: impl Into<String>) -> ExportError {
    ExportError::MissingReference {
        context: context.into(),
    }
}

fn export_type(spec: &Specification, ty: &Type) -> Result<Value, ExportError> {
    let mut out = Map::new();
    if !ty.description.is_empty() {
        out.insert("description".into(), json!(ty.description));
    }
    if ty.deprecated {
        out.insert("deprecated".into(), json!(true));
    }

    match ty.kind {
        TypeKind::Reference => {
            let target = required(ty.reference.as_deref(), &ty.name)?;
            out.insert("type".into(), json!("reference"));
            out.insert("target".into(), json!(target));
            if !ty.template.is_empty() {
                out.insert("template".into(), json!(ty.template));
            }
        }
        TypeKind::Map | TypeKind::Array => {
            let element = required(ty.reference.as_deref(), &ty.name)?;
            out.insert("type".into(), json!(ty.kind.as_str()));
            out.insert("schema".into(), reference_schema(element, &ty.name)?);
        }
        TypeKind::Struct => {
            out.insert("type".into(), json!("struct"));
            if let Some(parent) = &ty.parent {
                out.insert("$extends".into(), json!(parent));
            }
            if ty.base {
                out.insert("base".into(), json!(true));
            }
            if !ty.template.is_empty() {
                out.insert("$template".into(), json!(ty.template));
            }
            if let Some(discriminator) = &ty.discriminator {
                out.insert("discriminator".into(), json!(discriminator));
            }
            if !ty.mapping.is_empty() {
                let mut mapping = Map::new();
                for (type_name, value) in &ty.mapping {
                    if !spec.resolves(type_name) {
                        return Err(missing(format!("{} mapping `{type_name}`", ty.name)));
                    }
                    let key = if value.is_empty() { type_name } else { value };
                    mapping.insert(key.clone(), json!(type_name));
                }
                out.insert("mapping".into(), Value::Object(mapping));
            }
            if !ty.properties.is_empty() {
                let mut properties = Map::new();
                for property in &ty.properties {
                    let context = format!("{}.{}", ty.name, property.name);
                    properties.insert(property.name.clone(), export_property(property, &context)?);
                }
                out.insert("properties".into(), Value::Object(properties));
            }
        }
    }

    Ok(Value::Object(out))
}

fn export_property(property: &Property, context: &str) -> Result<Value, ExportError> {
    let mut out = Map::new();
    if !property.description.is_empty() {
        out.insert("description".into(), json!(property.description));
    }
    for (flag, set) in [
        ("deprecated", property.deprecated),
        ("nullable", property.nullable),
        ("readonly", property.readonly),
    ] {
        if set {
            out.insert(flag.into(), json!(true));
        }
    }

    match property.kind {
        PropertyKind::Object => {
            let reference = required(property.reference.as_deref(), context)?;
            merge(&mut out, reference_schema(reference, context)?);
            if !property.template.is_empty() {
                out.insert("$template".into(), json!(property.template));
            }
        }
        PropertyKind::Map => {
            let reference = required(property.reference.as_deref(), context)?;
            out.insert("type".into(), json!("object"));
            out.insert("additionalProperties".into(), reference_schema(reference, context)?);
        }
        PropertyKind::Array => {
            let reference = required(property.reference.as_deref(), context)?;
            out.insert("type".into(), json!("array"));
            out.insert("items".into(), reference_schema(reference, context)?);
        }
        PropertyKind::Union | PropertyKind::Intersection => {
            if property.references.is_empty() {
                return Err(missing(context));
            }
            let members = property
                .references
                .iter()
                .map(|r| reference_schema(r, context))
                .collect::<Result<Vec<_>, _>>()?;
            let key = if property.kind == PropertyKind::Union { "oneOf" } else { "allOf" };
            out.insert(key.into(), Value::Array(members));
        }
        PropertyKind::Generic => {
            let name = property.generic.as_deref().unwrap_or(GENERIC_PARAMETER);
            out.insert("$generic".into(), json!(name));
        }
        scalar => {
            out.insert("type".into(), json!(scalar.as_str()));
            if let Some(format) = &property.format {
                out.insert("format".into(), json!(format));
            }
            if let Some(pattern) = &property.pattern {
                out.insert("pattern".into(), json!(pattern));
            }
            if let Some(min_length) = property.min_length {
                out.insert("minLength".into(), json!(min_length));
            }
            if let Some(max_length) = property.max_length {
                out.insert("maxLength".into(), json!(max_length));
            }
            if let Some(minimum) = property.minimum {
                out.insert("minimum".into(), json!(minimum));
            }
            if let Some(maximum) = property.maximum {
                out.insert("maximum".into(), json!(maximum));
            }
        }
    }

    if let Some(default) = &property.default {
        out.insert("default".into(), default.clone());
    }
    for (key, value) in &property.metadata {
        out.insert(format!("x-{key}"), json!(value));
    }

    Ok(Value::Object(out))
}

/// Name of the body argument: `payload`, suffixed until it clears every
/// declared argument.
fn payload_argument_name(operation: &Operation) -> String {
    let taken = |candidate: &str| operation.arguments.iter().any(|a| a.name == candidate);
    if !taken(PAYLOAD_ARGUMENT) {
        return PAYLOAD_ARGUMENT.to_string();
    }
    (1..)
        .map(|n| format!("{PAYLOAD_ARGUMENT}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| PAYLOAD_ARGUMENT.to_string())
}

fn export_operation(operation: &Operation) -> Result<Value, ExportError> {
    let name = &operation.name;
    let mut out = Map::new();
    if !operation.description.is_empty() {
        out.insert("description".into(), json!(operation.description));
    }
    out.insert("method".into(), json!(operation.http_method.as_str()));
    out.insert("path".into(), json!(operation.http_path));

    let mut arguments = Map::new();
    let bind = |location: ArgumentLocation,
                    arguments: &mut Map<String, Value>|
     -> Result<(), ExportError> {
        for argument in operation.arguments_in(location) {
            let context = format!("{name} argument {}", argument.name);
            let mut binding =
                shaped_schema(&argument.type_name, argument.type_shape, &context)?;
            binding.insert("in".into(), json!(location.as_str()));
            arguments.insert(argument.name.clone(), Value::Object(binding));
        }
        Ok(())
    };
    bind(ArgumentLocation::Path, &mut arguments)?;
    if let Some(payload) = &operation.payload {
        let mut binding =
            shaped_schema(payload, operation.payload_shape, &format!("{name} payload"))?;
        binding.insert("in".into(), json!(ArgumentLocation::Body.as_str()));
        arguments.insert(payload_argument_name(operation), Value::Object(binding));
    }
    bind(ArgumentLocation::Query, &mut arguments)?;
    bind(ArgumentLocation::Header, &mut arguments)?;
    if !arguments.is_empty() {
        out.insert("arguments".into(), Value::Object(arguments));
    }

    let mut ret = Map::new();
    ret.insert("code".into(), json!(operation.http_code));
    if let Some(return_type) = operation.return_type.as_deref() {
        if operation.http_code != NO_CONTENT {
            let schema =
                shaped_schema(return_type, operation.return_shape, &format!("{name} return"))?;
            ret.extend(schema);
        }
    }
    out.insert("return".into(), Value::Object(ret));

    if !operation.throws.is_empty() {
        let throws = operation
            .throws
            .iter()
            .map(|throw| {
                let context = format!("{name} throw {}", throw.code);
                let mut entry = shaped_schema(&throw.type_name, throw.type_shape, &context)?;
                entry.insert("code".into(), json!(throw.code));
                Ok(Value::Object(entry))
            })
            .collect::<Result<Vec<_>, ExportError>>()?;
        out.insert("throws".into(), Value::Array(throws));
    }

    if let Some(stability) = operation.stability {
        out.insert("stability".into(), json!(stability));
    }
    if !operation.security.is_empty() {
        out.insert("security".into(), json!(operation.security));
    }
    if operation.authorization {
        out.insert("authorization".into(), json!(true));
    }
    if !operation.tags.is_empty() {
        out.insert("tags".into(), json!(operation.tags));
    }

    Ok(Value::Object(out))
}

/// `{schema}` or `{contentType}` for a reference qualified by `shape`.
fn shaped_schema(
    reference: &str,
    shape: Option<Shape>,
    context: &str,
) -> Result<Map<String, Value>, ExportError> {
    let reference = required(Some(reference), context)?;
    let mut out = Map::new();
    match shape {
        Some(Shape::Mime) => {
            out.insert("contentType".into(), json!(reference));
        }
        Some(Shape::Map) => {
            out.insert(
                "schema".into(),
                json!({"type": "object", "additionalProperties": reference_schema(reference, context)?}),
            );
        }
        Some(Shape::Array) => {
            out.insert(
                "schema".into(),
                json!({"type": "array", "items": reference_schema(reference, context)?}),
            );
        }
        None => {
            out.insert("schema".into(), reference_schema(reference, context)?);
        }
    }
    Ok(out)
}

fn reference_schema(reference: &str, context: &str) -> Result<Value, ExportError> {
    let reference = required(Some(reference), context)?;
    Ok(if is_scalar(reference) {
        json!({"type": reference})
    } else if reference == GENERIC_PARAMETER {
        json!({"$generic": GENERIC_PARAMETER})
    } else {
        json!({"$ref": reference})
    })
}

fn required<'a>(reference: Option<&'a str>, context: &str) -> Result<&'a str, ExportError> {
    reference
        .filter(|r| !r.is_empty())
        .ok_or_else(|| missing(context))
}

fn merge(out: &mut Map<String, Value>, schema: Value) {
    if let Value::Object(fields) = schema {
        out.extend(fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Argument, HttpMethod, Include, Throw};

    fn pet_spec() -> Specification {
        let mut pet = Type::new("Pet", TypeKind::Struct);
        pet.properties = vec![
            Property::new("name", PropertyKind::String),
            Property::new("tags", PropertyKind::Array).with_reference("string"),
        ];
        let mut op = Operation::new("pet.update", HttpMethod::Put, "/pet/:id");
        op.arguments = vec![
            Argument {
                name: "trace".into(),
                location: ArgumentLocation::Header,
                type_name: "string".into(),
                type_shape: None,
            },
            Argument {
                name: "force".into(),
                location: ArgumentLocation::Query,
                type_name: "boolean".into(),
                type_shape: None,
            },
            Argument {
                name: "id".into(),
                location: ArgumentLocation::Path,
                type_name: "integer".into(),
                type_shape: None,
            },
        ];
        op.payload = Some("Pet".into());
        op.return_type = Some("Pet".into());
        Specification {
            operations: vec![op],
            types: vec![pet],
            root: Some(0),
            ..Specification::default()
        }
    }

    #[test]
    fn arguments_are_grouped_by_binding() {
        let document = export(&pet_spec()).unwrap();
        let arguments = document["operations"]["pet.update"]["arguments"]
            .as_object()
            .unwrap();
        let names: Vec<&str> = arguments.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "payload", "force", "trace"]);
        assert_eq!(arguments["payload"]["in"], "body");
        assert_eq!(arguments["payload"]["schema"]["$ref"], "Pet");
        assert_eq!(arguments["id"]["schema"]["type"], "integer");
        assert_eq!(document["$ref"], "Pet");
    }

    #[test]
    fn payload_steps_around_a_same_named_argument() {
        let mut spec = pet_spec();
        let op = &mut spec.operations[0];
        op.arguments[1].name = "payload".into();
        op.arguments.push(Argument {
            name: "payload_1".into(),
            location: ArgumentLocation::Header,
            type_name: "string".into(),
            type_shape: None,
        });

        let document = export(&spec).unwrap();
        let arguments = &document["operations"]["pet.update"]["arguments"];
        assert_eq!(arguments.as_object().unwrap().len(), 5);
        assert_eq!(arguments["payload"]["in"], "query");
        assert_eq!(arguments["payload_1"]["in"], "header");
        assert_eq!(arguments["payload_2"]["in"], "body");
        assert_eq!(arguments["payload_2"]["schema"]["$ref"], "Pet");
    }

    #[test]
    fn no_content_return_keeps_only_the_code() {
        let mut spec = pet_spec();
        spec.operations[0].http_code = 204;
        let document = export(&spec).unwrap();
        assert_eq!(document["operations"]["pet.update"]["return"], json!({"code": 204}));
    }

    #[test]
    fn shapes_become_containers() {
        let mut spec = pet_spec();
        let op = &mut spec.operations[0];
        op.return_shape = Some(Shape::Map);
        op.throws = vec![Throw {
            code: 415,
            type_name: "text/plain".into(),
            type_shape: Some(Shape::Mime),
        }];
        let document = export(&spec).unwrap();
        let op = &document["operations"]["pet.update"];
        assert_eq!(
            op["return"]["schema"],
            json!({"type": "object", "additionalProperties": {"$ref": "Pet"}})
        );
        assert_eq!(op["throws"][0], json!({"contentType": "text/plain", "code": 415}));
    }

    #[test]
    fn generic_and_template_references() {
        let mut collection = Type::new("Collection", TypeKind::Struct);
        collection.properties = vec![Property::new("entries", PropertyKind::Array).with_reference("T")];
        let mut pets = Type::new("PetCollection", TypeKind::Reference);
        pets.reference = Some("Collection".into());
        pets.template.insert("T".into(), "Pet".into());
        let spec = Specification {
            types: vec![collection, pets],
            ..Specification::default()
        };

        let document = export(&spec).unwrap();
        let definitions = &document["definitions"];
        assert_eq!(definitions["Collection"]["properties"]["entries"]["items"], json!({"$generic": "T"}));
        assert_eq!(
            definitions["PetCollection"],
            json!({"type": "reference", "target": "Collection", "template": {"T": "Pet"}})
        );
    }

    #[test]
    fn mapping_is_keyed_by_discriminator_value() {
        let mut animal = Type::new("Animal", TypeKind::Struct);
        animal.discriminator = Some("kind".into());
        animal.mapping.insert("Dog".into(), "dog".into());
        animal.mapping.insert("Cat".into(), String::new());
        let mut spec = Specification {
            types: vec![animal, Type::new("Dog", TypeKind::Struct), Type::new("Cat", TypeKind::Struct)],
            ..Specification::default()
        };

        let document = export(&spec).unwrap();
        assert_eq!(
            document["definitions"]["Animal"]["mapping"],
            json!({"dog": "Dog", "Cat": "Cat"})
        );

        spec.types[0].mapping.insert("Bird".into(), String::new());
        let err = export(&spec).unwrap_err();
        assert!(matches!(err, ExportError::MissingReference { context } if context.contains("Bird")));
    }

    #[test]
    fn empty_references_abort_the_export() {
        let mut spec = pet_spec();
        spec.types[0].properties.push(Property::new("owner", PropertyKind::Object));
        let err = export(&spec).unwrap_err();
        assert!(matches!(err, ExportError::MissingReference { context } if context == "Pet.owner"));

        let mut spec = pet_spec();
        spec.operations[0].return_type = Some(String::new());
        assert!(matches!(export(&spec), Err(ExportError::MissingReference { .. })));

        let spec = Specification {
            types: vec![Type::new("Lookup", TypeKind::Map)],
            ..Specification::default()
        };
        assert!(matches!(export(&spec), Err(ExportError::MissingReference { .. })));
    }

    #[test]
    fn imports_use_their_locator() {
        let mut spec = Specification::default();
        spec.imports.push(Include::from_url("common", "https://example.com/common.json"));
        spec.imports.push(Include {
            alias: "incomplete".into(),
            ..Include::default()
        });
        let document = export(&spec).unwrap();
        assert_eq!(
            document["$import"],
            json!({"common": "https://example.com/common.json"})
        );
    }

    #[test]
    fn yaml_output_matches_json_document() {
        let spec = pet_spec();
        let yaml = to_yaml_string(&spec).unwrap();
        let reparsed: Value = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(reparsed, export(&spec).unwrap());
        assert!(to_json_string(&spec, true).unwrap().contains('\n'));
        assert!(!to_json_string(&spec, false).unwrap().contains('\n'));
    }
}
