use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;

use crate::error::ConversionError;
use crate::model::{GENERIC_PARAMETER, Property, PropertyKind, Shape, Type, TypeKind};
use crate::naming::{NamingService, anonymous_object_name};
use crate::parse::entry;
use crate::parse::schema::{Discriminator, Schema, SchemaType};

/// Local pointer prefixes stripped from `$ref` values.
const REF_PREFIXES: [&str; 3] = ["#/definitions/", "#/$defs/", "#/components/schemas/"];

/// Strip a known local pointer prefix from a `$ref`.
pub fn normalize_ref(reference: &str) -> String {
    REF_PREFIXES
        .iter()
        .find_map(|prefix| reference.strip_prefix(prefix))
        .unwrap_or(reference)
        .to_string()
}

/// An entry dropped during a best-effort import.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Name of the dropped definition, operation or argument.
    pub entry: String,
    pub error: ConversionError,
}

/// Shape a schema node takes once dialect spellings are unified.
enum Normalized<'s> {
    Reference(String),
    Map(Option<&'s Schema>),
    Array(&'s Schema),
    Struct,
}

fn normalize(schema: &Schema) -> Normalized<'_> {
    if let Some(reference) = &schema.ref_path {
        return Normalized::Reference(normalize_ref(reference));
    }
    if schema.primary_type() == Some(&SchemaType::Reference) {
        if let Some(target) = &schema.target {
            return Normalized::Reference(target.clone());
        }
    }
    if schema.properties.is_none() {
        if let Some(values) = schema.map_values() {
            return Normalized::Map(Some(values));
        }
        if schema.allows_any_values() {
            return Normalized::Map(None);
        }
    }
    if let Some(items) = &schema.items {
        return Normalized::Array(items);
    }
    match (schema.primary_type(), schema.schema.as_deref()) {
        (Some(SchemaType::Map), Some(element)) => Normalized::Map(Some(element)),
        (Some(SchemaType::Array), Some(element)) => Normalized::Array(element),
        _ => Normalized::Struct,
    }
}

/// The structural converter shared by every schema based importer.
///
/// One converter lives for exactly one import pass: it owns the side table of
/// anonymous objects discovered while converting, and the diagnostics of
/// every entry dropped along the way.
pub struct SchemaConverter<'a> {
    naming: &'a dyn NamingService,
    anonymous: IndexMap<String, Schema>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SchemaConverter<'a> {
    pub fn new(naming: &'a dyn NamingService) -> Self {
        Self {
            naming,
            anonymous: IndexMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Log and remember a dropped entry.
    pub fn record(&mut self, entry: impl Into<String>, error: ConversionError) {
        let entry = entry.into();
        warn!("dropping `{entry}`: {error}");
        self.diagnostics.push(Diagnostic { entry, error });
    }

    /// Convert one raw definition. Failures are recorded and yield `None`.
    pub fn convert_entry(&mut self, name: &str, raw: &Value) -> Option<Type> {
        let result = entry::<Schema>(raw)
            .map_err(|e| ConversionError::InvalidArgument(format!("{name}: {e}")))
            .and_then(|schema| self.convert_type(name, &schema));
        match result {
            Ok(ty) => Some(ty),
            Err(error) => {
                self.record(name, error);
                None
            }
        }
    }

    /// Convert a named schema into a type.
    pub fn convert_type(&mut self, name: &str, schema: &Schema) -> Result<Type, ConversionError> {
        let mut ty = match normalize(schema) {
            Normalized::Reference(target) => Type {
                reference: Some(target),
                template: schema.template.clone(),
                ..Type::new(name, TypeKind::Reference)
            },
            Normalized::Map(element) => Type {
                reference: Some(match element {
                    Some(element) => self.element_reference(element)?,
                    None => "any".to_string(),
                }),
                ..Type::new(name, TypeKind::Map)
            },
            Normalized::Array(element) => Type {
                reference: Some(self.element_reference(element)?),
                ..Type::new(name, TypeKind::Array)
            },
            Normalized::Struct => self.convert_struct(name, schema)?,
        };
        ty.description = schema.description.clone().unwrap_or_default();
        ty.deprecated = schema.deprecated.unwrap_or(false);
        Ok(ty)
    }

    fn convert_struct(&mut self, name: &str, schema: &Schema) -> Result<Type, ConversionError> {
        if let Some(scalar) = schema.scalar_keyword() {
            return Err(ConversionError::ScalarType(scalar.to_string()));
        }
        match schema.primary_type() {
            Some(SchemaType::Array) => {
                return Err(ConversionError::UnresolvableReference(format!(
                    "{name}: array without items"
                )));
            }
            Some(SchemaType::Generic | SchemaType::Null | SchemaType::Unknown) => {
                return Err(ConversionError::UnknownType(name.to_string()));
            }
            _ => {}
        }

        let mut ty = Type::new(name, TypeKind::Struct);
        ty.parent = schema.parent_name().map(normalize_ref);
        ty.base = schema.base.unwrap_or(false);
        ty.template = schema.template.clone();

        // allOf: one `$ref` member is the parent, inline members add properties.
        let mut members: Vec<&Schema> = Vec::new();
        let parents: Vec<&String> = schema
            .all_of
            .iter()
            .filter_map(|member| member.ref_path.as_ref())
            .collect();
        if ty.parent.is_none() {
            if let [parent] = parents.as_slice() {
                ty.parent = Some(normalize_ref(parent));
            } else if parents.len() > 1 {
                debug!("{name}: allOf with {} references has no single parent", parents.len());
            }
        }
        members.extend(schema.all_of.iter().filter(|m| m.ref_path.is_none()));
        members.push(schema);

        for member in members {
            for (prop_name, prop_schema) in member.properties.iter().flatten() {
                let property = self.convert_property(prop_name, prop_schema).map_err(|e| {
                    debug!("{name}.{prop_name}: {e}");
                    e
                })?;
                ty.properties.push(property);
            }
        }

        match &schema.discriminator {
            Some(Discriminator::Property(property)) => {
                ty.discriminator = Some(property.clone());
                ty.mapping = invert_mapping(&schema.mapping);
            }
            Some(Discriminator::Object {
                property_name,
                mapping,
            }) => {
                ty.discriminator = Some(property_name.clone());
                ty.mapping = invert_mapping(if mapping.is_empty() {
                    &schema.mapping
                } else {
                    mapping
                });
            }
            None => {}
        }

        Ok(ty)
    }

    /// Convert one property schema.
    pub fn convert_property(
        &mut self,
        name: &str,
        schema: &Schema,
    ) -> Result<Property, ConversionError> {
        let mut property = Property::new(name, PropertyKind::Any);
        property.description = schema.description.clone().unwrap_or_default();
        property.deprecated = schema.deprecated.unwrap_or(false);
        property.nullable = schema.nullable.unwrap_or(false) || schema.has_null_type();
        property.readonly = schema.read_only.unwrap_or(false);
        property.default = schema.default_value.clone();
        property.metadata = schema.metadata();

        if schema.properties.is_some() {
            // Inline objects can not be expressed as a property; give them a name.
            property.kind = PropertyKind::Object;
            property.reference = Some(self.defer_anonymous(schema)?);
            return Ok(property);
        }

        match normalize(schema) {
            Normalized::Reference(target) => {
                property.kind = PropertyKind::Object;
                property.reference = Some(target);
                property.template = schema.template.clone();
                return Ok(property);
            }
            Normalized::Map(element) => {
                property.kind = PropertyKind::Map;
                property.reference = Some(match element {
                    Some(element) => self.element_reference(element)?,
                    None => "any".to_string(),
                });
                return Ok(property);
            }
            Normalized::Array(element) => {
                property.kind = PropertyKind::Array;
                property.reference = Some(self.element_reference(element)?);
                return Ok(property);
            }
            Normalized::Struct => {}
        }

        if schema.is_generic_marker() {
            property.kind = PropertyKind::Generic;
            property.generic = Some(schema.generic_parameter().to_string());
            return Ok(property);
        }

        let union = if schema.one_of.is_empty() {
            &schema.any_of
        } else {
            &schema.one_of
        };
        if !union.is_empty() {
            property.kind = PropertyKind::Union;
            for member in union {
                if member.primary_type() == Some(&SchemaType::Null) {
                    property.nullable = true;
                    continue;
                }
                property.references.push(self.element_reference(member)?);
            }
            return Ok(property);
        }
        if !schema.all_of.is_empty() {
            property.kind = PropertyKind::Intersection;
            for member in &schema.all_of {
                property.references.push(self.element_reference(member)?);
            }
            return Ok(property);
        }

        match schema.primary_type() {
            Some(SchemaType::Array) => Err(ConversionError::UnresolvableReference(format!(
                "{name}: array without items"
            ))),
            Some(SchemaType::Object) => Ok(property),
            Some(t) => match t.scalar_keyword().and_then(PropertyKind::scalar) {
                Some(kind) => {
                    property.kind = kind;
                    property.format = schema.format.clone();
                    property.pattern = schema.pattern.clone();
                    property.min_length = schema.min_length;
                    property.max_length = schema.max_length;
                    property.minimum = schema.minimum;
                    property.maximum = schema.maximum;
                    Ok(property)
                }
                None => Err(ConversionError::UnknownType(name.to_string())),
            },
            None => Err(ConversionError::UnknownType(name.to_string())),
        }
    }

    /// Name a referenced element; inline objects become anonymous types.
    pub fn element_reference(&mut self, schema: &Schema) -> Result<String, ConversionError> {
        if schema.properties.is_some() {
            return self.defer_anonymous(schema);
        }
        parse_ref(schema)
    }

    /// Reference plus shape of a payload, return or throw schema.
    pub fn body_reference(
        &mut self,
        schema: &Schema,
    ) -> Result<(String, Option<Shape>), ConversionError> {
        if schema.properties.is_some() {
            return Ok((self.defer_anonymous(schema)?, None));
        }
        match normalize(schema) {
            Normalized::Reference(target) => Ok((target, None)),
            Normalized::Map(Some(element)) => Ok((self.element_reference(element)?, Some(Shape::Map))),
            Normalized::Map(None) => Ok(("any".to_string(), Some(Shape::Map))),
            Normalized::Array(element) => {
                Ok((self.element_reference(element)?, Some(Shape::Array)))
            }
            Normalized::Struct if schema.primary_type() == Some(&SchemaType::Object) => {
                Ok(("any".to_string(), None))
            }
            Normalized::Struct => Ok((parse_ref(schema)?, None)),
        }
    }

    /// Register an inline object under its content-hash name.
    pub fn defer_anonymous(&mut self, schema: &Schema) -> Result<String, ConversionError> {
        let json = serde_json::to_string(schema)
            .map_err(|e| ConversionError::Unserializable(e.to_string()))?;
        let name = anonymous_object_name(self.naming, &json);
        self.anonymous
            .entry(name.clone())
            .or_insert_with(|| schema.clone());
        Ok(name)
    }

    /// Convert every deferred anonymous object, including the ones discovered
    /// while converting them, and append them to `types`.
    pub fn drain_anonymous(&mut self, types: &mut Vec<Type>) {
        while let Some((name, schema)) = self.anonymous.shift_remove_index(0) {
            if types.iter().any(|t| t.name == name) {
                continue;
            }
            match self.convert_type(&name, &schema) {
                Ok(ty) => types.push(ty),
                Err(error) => self.record(name, error),
            }
        }
    }

    pub fn has_pending_anonymous(&self) -> bool {
        !self.anonymous.is_empty()
    }
}

/// Strict reference parsing: a target, a `$ref`, the generic marker, a
/// scalar, or an array of one of those.
pub fn parse_ref(schema: &Schema) -> Result<String, ConversionError> {
    if let Some(target) = &schema.target {
        return Ok(target.clone());
    }
    if let Some(reference) = &schema.ref_path {
        return Ok(normalize_ref(reference));
    }
    if schema.is_generic_marker() {
        return Ok(GENERIC_PARAMETER.to_string());
    }
    if let Some(scalar) = schema.scalar_keyword() {
        return Ok(scalar.to_string());
    }
    if schema.primary_type() == Some(&SchemaType::Array) {
        if let Some(items) = schema.items.as_deref().or(schema.schema.as_deref()) {
            return parse_ref(items);
        }
    }
    Err(serde_json::to_string(schema).map_or_else(
        |e| ConversionError::Unserializable(e.to_string()),
        ConversionError::UnresolvableReference,
    ))
}

/// `{value: TypeName}` → `{TypeName: value}`, with `""` for values equal to
/// the type name.
fn invert_mapping(mapping: &IndexMap<String, String>) -> IndexMap<String, String> {
    mapping
        .iter()
        .map(|(value, target)| {
            let type_name = normalize_ref(target);
            let value = if *value == type_name {
                String::new()
            } else {
                value.clone()
            };
            (type_name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::DigestNaming;

    fn schema(json: &str) -> Schema {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn normalize_ref_strips_known_prefixes() {
        assert_eq!(normalize_ref("#/definitions/Pet"), "Pet");
        assert_eq!(normalize_ref("#/$defs/Pet"), "Pet");
        assert_eq!(normalize_ref("#/components/schemas/Pet"), "Pet");
        assert_eq!(normalize_ref("ext:Pet"), "ext:Pet");
    }

    #[test]
    fn parse_ref_rules() {
        assert_eq!(parse_ref(&schema(r##"{"$ref":"#/$defs/A"}"##)).unwrap(), "A");
        assert_eq!(parse_ref(&schema(r#"{"type":"reference","target":"B"}"#)).unwrap(), "B");
        assert_eq!(parse_ref(&schema(r#"{"$generic":"T"}"#)).unwrap(), "T");
        assert_eq!(parse_ref(&schema(r#"{"type":"integer"}"#)).unwrap(), "integer");
        assert_eq!(
            parse_ref(&schema(r#"{"type":"array","items":{"$ref":"C"}}"#)).unwrap(),
            "C"
        );
        assert!(matches!(
            parse_ref(&schema(r#"{"type":"object"}"#)),
            Err(ConversionError::UnresolvableReference(text)) if text.contains("object")
        ));
    }

    #[test]
    fn anonymous_names_hash_the_schema_text() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);
        let point = schema(r#"{"properties":{"x":{"type":"number"}}}"#);
        let label = schema(r#"{"properties":{"text":{"type":"string"}}}"#);

        let first = converter.defer_anonymous(&point).unwrap();
        assert_eq!(converter.defer_anonymous(&point).unwrap(), first);
        assert_ne!(converter.defer_anonymous(&label).unwrap(), first);
        assert_ne!(first, anonymous_object_name(&naming, ""));
        assert_eq!(
            first,
            anonymous_object_name(&naming, &serde_json::to_string(&point).unwrap())
        );
    }

    #[test]
    fn scalar_definitions_are_rejected() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);
        let err = converter
            .convert_type("Name", &schema(r#"{"type":"string"}"#))
            .unwrap_err();
        assert_eq!(err, ConversionError::ScalarType("string".to_string()));
    }

    #[test]
    fn map_and_array_types_carry_one_reference() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);

        let map = converter
            .convert_type("Labels", &schema(r#"{"additionalProperties":{"type":"string"}}"#))
            .unwrap();
        assert_eq!(map.kind, TypeKind::Map);
        assert_eq!(map.reference.as_deref(), Some("string"));

        let array = converter
            .convert_type("Pets", &schema(r#"{"type":"array","items":{"$ref":"Pet"}}"#))
            .unwrap();
        assert_eq!(array.kind, TypeKind::Array);
        assert_eq!(array.reference.as_deref(), Some("Pet"));
    }

    #[test]
    fn struct_with_closed_additional_properties_stays_struct() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);
        let ty = converter
            .convert_type(
                "Pet",
                &schema(r#"{"type":"object","additionalProperties":false,"properties":{"id":{"type":"integer"}}}"#),
            )
            .unwrap();
        assert_eq!(ty.kind, TypeKind::Struct);
        assert_eq!(ty.properties.len(), 1);
    }

    #[test]
    fn scalar_property_constraints_are_carried() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);
        let prop = converter
            .convert_property(
                "code",
                &schema(r#"{"type":["string","null"],"pattern":"^[A-Z]+$","minLength":2,"maxLength":4,"readOnly":true,"default":"AB"}"#),
            )
            .unwrap();
        assert_eq!(prop.kind, PropertyKind::String);
        assert!(prop.nullable);
        assert!(prop.readonly);
        assert_eq!(prop.pattern.as_deref(), Some("^[A-Z]+$"));
        assert_eq!(prop.min_length, Some(2));
        assert_eq!(prop.max_length, Some(4));
        assert_eq!(prop.default, Some(Value::String("AB".to_string())));
    }

    #[test]
    fn union_skips_null_members() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);
        let prop = converter
            .convert_property(
                "pet",
                &schema(r##"{"oneOf":[{"$ref":"#/definitions/Dog"},{"$ref":"#/definitions/Cat"},{"type":"null"}]}"##),
            )
            .unwrap();
        assert_eq!(prop.kind, PropertyKind::Union);
        assert_eq!(prop.references, vec!["Dog", "Cat"]);
        assert!(prop.nullable);
    }

    #[test]
    fn generic_property_binds_parameter() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);
        let prop = converter
            .convert_property("entry", &schema(r#"{"$generic":"T"}"#))
            .unwrap();
        assert_eq!(prop.kind, PropertyKind::Generic);
        assert_eq!(prop.generic.as_deref(), Some("T"));
    }

    #[test]
    fn nested_anonymous_objects_are_drained() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);
        let outer = converter
            .convert_type(
                "Outer",
                &schema(r#"{"properties":{"a":{"properties":{"b":{"properties":{"c":{"type":"string"}}}}}}}"#),
            )
            .unwrap();
        let mut types = vec![outer];
        converter.drain_anonymous(&mut types);

        assert_eq!(types.len(), 3);
        assert!(types[1..].iter().all(|t| t.name.starts_with("Object_")));
        assert!(!converter.has_pending_anonymous());
        let a_ref = types[0].properties[0].reference.as_deref().unwrap();
        assert_eq!(types[1].name, a_ref);
    }

    #[test]
    fn discriminator_object_mapping_is_inverted() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);
        let ty = converter
            .convert_type(
                "Animal",
                &schema(r##"{"type":"object","discriminator":{"propertyName":"kind","mapping":{"dog":"#/components/schemas/Dog","Cat":"Cat"}}}"##),
            )
            .unwrap();
        assert_eq!(ty.discriminator.as_deref(), Some("kind"));
        assert_eq!(ty.mapping["Dog"], "dog");
        assert_eq!(ty.mapping["Cat"], "");
    }

    #[test]
    fn all_of_single_ref_becomes_parent() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);
        let ty = converter
            .convert_type(
                "Dog",
                &schema(r##"{"allOf":[{"$ref":"#/components/schemas/Animal"},{"properties":{"bark":{"type":"boolean"}}}]}"##),
            )
            .unwrap();
        assert_eq!(ty.parent.as_deref(), Some("Animal"));
        assert_eq!(ty.properties[0].name, "bark");
    }

    #[test]
    fn failing_property_fails_its_type() {
        let naming = DigestNaming::default();
        let mut converter = SchemaConverter::new(&naming);
        let raw: Value = serde_json::from_str(
            r#"{"properties":{"ok":{"type":"string"},"bad":{"type":"array"}}}"#,
        )
        .unwrap();
        assert!(converter.convert_entry("Broken", &raw).is_none());
        assert_eq!(converter.diagnostics().len(), 1);
        assert_eq!(converter.diagnostics()[0].entry, "Broken");
    }
}
