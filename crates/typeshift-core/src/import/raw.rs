use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Number, Value};

use super::{Imported, Importer};
use crate::error::ImportError;
use crate::model::{Property, PropertyKind, Specification, Type, TypeKind};
use crate::naming::{NamingService, sample_type_name};

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));
static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
        .expect("valid regex")
});
static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").expect("valid regex"));

/// Infers types from a sample JSON value instead of a schema.
///
/// The sample itself becomes the root struct; every nested object becomes a
/// `Type_<hash>` struct named after its own serialization.
pub struct RawImporter {
    naming: Arc<dyn NamingService>,
}

impl RawImporter {
    pub fn new(naming: Arc<dyn NamingService>) -> Self {
        Self { naming }
    }
}

#[async_trait]
impl Importer for RawImporter {
    async fn import(&self, text: &str) -> Result<Imported, ImportError> {
        let sample: Value = serde_json::from_str(text)?;
        let mut inference = Inference {
            naming: self.naming.as_ref(),
            nested: IndexMap::new(),
        };

        // A top-level array describes its elements.
        let root_value = match &sample {
            Value::Array(items) => items.iter().find(|item| item.is_object()),
            other => Some(other),
        };
        let root = match root_value {
            Some(Value::Object(fields)) => inference.struct_type(fields),
            _ => Type::new(sample_type_name(inference.naming, &sample.to_string()), TypeKind::Struct),
        };

        let mut spec = Specification {
            root: Some(0),
            ..Specification::default()
        };
        let root_name = root.name.clone();
        spec.types.push(root);
        spec.types
            .extend(inference.nested.into_values().filter(|ty| ty.name != root_name));

        Ok(Imported {
            spec,
            diagnostics: Vec::new(),
        })
    }
}

/// Element type of an array, widened across its members.
#[derive(Debug, Clone, PartialEq)]
enum Element {
    Scalar(PropertyKind),
    Object(String),
}

impl Element {
    fn widen(self, other: Element) -> Element {
        match (self, other) {
            (a, b) if a == b => a,
            (Element::Scalar(PropertyKind::Integer), Element::Scalar(PropertyKind::Number))
            | (Element::Scalar(PropertyKind::Number), Element::Scalar(PropertyKind::Integer)) => {
                Element::Scalar(PropertyKind::Number)
            }
            (Element::Object(first), Element::Object(_)) => Element::Object(first),
            _ => Element::Scalar(PropertyKind::Any),
        }
    }

    fn into_reference(self) -> String {
        match self {
            Element::Scalar(kind) => kind.as_str().to_string(),
            Element::Object(name) => name,
        }
    }
}

struct Inference<'a> {
    naming: &'a dyn NamingService,
    /// Nested object types in the order their definitions complete.
    nested: IndexMap<String, Type>,
}

impl Inference<'_> {
    fn struct_type(&mut self, fields: &Map<String, Value>) -> Type {
        let name = sample_type_name(self.naming, &Value::Object(fields.clone()).to_string());
        let mut ty = Type::new(name, TypeKind::Struct);
        ty.properties = fields
            .iter()
            .filter_map(|(key, value)| self.property(key, value))
            .collect();
        ty
    }

    fn nested_type(&mut self, fields: &Map<String, Value>) -> String {
        let ty = self.struct_type(fields);
        let name = ty.name.clone();
        self.nested.entry(name.clone()).or_insert(ty);
        name
    }

    fn property(&mut self, name: &str, value: &Value) -> Option<Property> {
        let property = match value {
            Value::Null => return None,
            Value::String(text) => {
                let mut property = Property::new(name, PropertyKind::String);
                property.format = string_format(text).map(str::to_string);
                property
            }
            Value::Array(items) => {
                let mut property = Property::new(name, PropertyKind::Array);
                property.reference = self.element(items).map(Element::into_reference);
                property
            }
            Value::Object(fields) => {
                Property::new(name, PropertyKind::Object).with_reference(self.nested_type(fields))
            }
            scalar => Property::new(name, scalar_kind(scalar)),
        };
        Some(property)
    }

    /// Element type of an array: the first non-null member, widened by the
    /// rest. `None` for empty or all-null arrays.
    fn element(&mut self, items: &[Value]) -> Option<Element> {
        let mut element: Option<Element> = None;
        for item in items.iter().filter(|item| !item.is_null()) {
            let next = match (item, &element) {
                (Value::Object(_), Some(Element::Object(_))) => continue,
                (Value::Object(fields), None) => Element::Object(self.nested_type(fields)),
                (Value::Object(_) | Value::Array(_), _) => Element::Scalar(PropertyKind::Any),
                (scalar, _) => Element::Scalar(scalar_kind(scalar)),
            };
            element = Some(match element.take() {
                Some(current) => current.widen(next),
                None => next,
            });
        }
        element
    }
}

fn scalar_kind(value: &Value) -> PropertyKind {
    match value {
        Value::Bool(_) => PropertyKind::Boolean,
        Value::Number(number) => number_kind(number),
        Value::String(_) => PropertyKind::String,
        _ => PropertyKind::Any,
    }
}

fn number_kind(number: &Number) -> PropertyKind {
    let integral = number.is_i64()
        || number.is_u64()
        || number.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0);
    if integral {
        PropertyKind::Integer
    } else {
        PropertyKind::Number
    }
}

fn string_format(value: &str) -> Option<&'static str> {
    if DATE.is_match(value) {
        Some("date")
    } else if DATE_TIME.is_match(value) {
        Some("date-time")
    } else if TIME.is_match(value) {
        Some("time")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::DigestNaming;

    async fn infer(text: &str) -> Specification {
        RawImporter::new(Arc::new(DigestNaming::default()))
            .transform(text)
            .await
            .unwrap()
    }

    fn kinds(ty: &Type) -> Vec<(&str, PropertyKind)> {
        ty.properties.iter().map(|p| (p.name.as_str(), p.kind)).collect()
    }

    #[tokio::test]
    async fn infers_scalars_dates_and_arrays() {
        let spec = infer(r#"{"id": 1, "tags": ["x"], "when": "2024-01-01"}"#).await;

        assert_eq!(spec.types.len(), 1);
        assert_eq!(spec.root, Some(0));
        let root = &spec.types[0];
        assert!(root.name.starts_with("Type_"));
        assert_eq!(
            kinds(root),
            vec![
                ("id", PropertyKind::Integer),
                ("tags", PropertyKind::Array),
                ("when", PropertyKind::String)
            ]
        );
        assert_eq!(root.properties[1].reference.as_deref(), Some("string"));
        assert_eq!(root.properties[2].format.as_deref(), Some("date"));
        assert!(spec.operations.is_empty());
        assert!(spec.imports.is_empty());
    }

    #[test]
    fn string_formats() {
        assert_eq!(string_format("2024-01-01T10:00:00Z"), Some("date-time"));
        assert_eq!(string_format("2024-01-01T10:00:00.123+02:00"), Some("date-time"));
        assert_eq!(string_format("10:00:00"), Some("time"));
        assert_eq!(string_format("2024-1-1"), None);
        assert_eq!(string_format("hello"), None);
    }

    #[tokio::test]
    async fn numbers_and_nulls() {
        let spec = infer(r#"{"a": 1.5, "b": 2.0, "c": -3, "d": true, "e": null}"#).await;
        assert_eq!(
            kinds(&spec.types[0]),
            vec![
                ("a", PropertyKind::Number),
                ("b", PropertyKind::Integer),
                ("c", PropertyKind::Integer),
                ("d", PropertyKind::Boolean)
            ]
        );
    }

    #[tokio::test]
    async fn nested_objects_share_types() {
        let spec = infer(
            r#"{
                "home": {"city": "Berlin"},
                "work": {"city": "Berlin"},
                "pets": [{"name": "Rex", "owner": {"id": 1}}]
            }"#,
        )
        .await;

        let root = &spec.types[0];
        let home = root.property("home").unwrap().reference.clone().unwrap();
        assert_eq!(root.property("work").unwrap().reference.as_deref(), Some(home.as_str()));

        let pet = root.property("pets").unwrap().reference.clone().unwrap();
        let (_, pet_type) = spec.find_type(&pet).unwrap();
        let owner = pet_type.property("owner").unwrap().reference.clone().unwrap();
        assert!(spec.find_type(&owner).is_some());

        // root, address, owner, pet
        assert_eq!(spec.types.len(), 4);
        assert!(spec.unresolved_references().is_empty());
    }

    #[tokio::test]
    async fn array_elements_widen() {
        let spec = infer(
            r#"{"nums": [1, 2.5], "mixed": [1, "a"], "nested": [[1]], "empty": [], "nulls": [null, 3]}"#,
        )
        .await;
        let reference = |name: &str| spec.types[0].property(name).unwrap().reference.clone();
        assert_eq!(reference("nums").as_deref(), Some("number"));
        assert_eq!(reference("mixed").as_deref(), Some("any"));
        assert_eq!(reference("nested").as_deref(), Some("any"));
        assert_eq!(reference("empty"), None);
        assert_eq!(reference("nulls").as_deref(), Some("integer"));
    }

    #[tokio::test]
    async fn top_level_arrays_and_scalars() {
        let spec = infer(r#"[null, {"id": 1}, {"id": 2, "extra": true}]"#).await;
        assert_eq!(kinds(&spec.types[0]), vec![("id", PropertyKind::Integer)]);

        let spec = infer("42").await;
        assert_eq!(spec.types.len(), 1);
        assert!(spec.types[0].properties.is_empty());
    }

    #[tokio::test]
    async fn only_invalid_json_fails() {
        let err = RawImporter::new(Arc::new(DigestNaming::default()))
            .transform("{not json")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Json(_)));
    }
}
