use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::is_false;

/// Discriminant of a named [`Type`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    #[serde(alias = "object")]
    Struct,
    Reference,
    Map,
    Array,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Struct => "struct",
            TypeKind::Reference => "reference",
            TypeKind::Map => "map",
            TypeKind::Array => "array",
        }
    }
}

/// A named schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: TypeKind,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,

    /// Single inheritance for structs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Marks an intermediate struct whose own subtypes are mapped instead of itself.
    #[serde(default, skip_serializing_if = "is_false")]
    pub base: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,

    /// Name of the property carrying the discriminator value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    /// Concrete type name → discriminator value (empty means "use the type name").
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,

    /// Generic parameter bindings (`T` → type name).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub template: IndexMap<String, String>,

    /// Target of a `reference`, element of a `map` or `array`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Type {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Discriminant of a [`Property`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Any,
    Object,
    Map,
    Array,
    Union,
    Intersection,
    Generic,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::String => "string",
            PropertyKind::Integer => "integer",
            PropertyKind::Number => "number",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Any => "any",
            PropertyKind::Object => "object",
            PropertyKind::Map => "map",
            PropertyKind::Array => "array",
            PropertyKind::Union => "union",
            PropertyKind::Intersection => "intersection",
            PropertyKind::Generic => "generic",
        }
    }

    /// Parse a scalar keyword.
    pub fn scalar(name: &str) -> Option<Self> {
        match name {
            "string" => Some(PropertyKind::String),
            "integer" => Some(PropertyKind::Integer),
            "number" => Some(PropertyKind::Number),
            "boolean" => Some(PropertyKind::Boolean),
            "any" => Some(PropertyKind::Any),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            PropertyKind::String
                | PropertyKind::Integer
                | PropertyKind::Number
                | PropertyKind::Boolean
                | PropertyKind::Any
        )
    }
}

/// A named field of a struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: PropertyKind,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub readonly: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Element of `object`, `map` and `array` properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Members of `union` and `intersection` properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,

    /// Template parameter a `generic` property is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub template: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, String>,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Every type name this property points at.
    pub fn referenced_names(&self) -> Vec<&str> {
        match self.kind {
            PropertyKind::Union | PropertyKind::Intersection => {
                self.references.iter().map(String::as_str).collect()
            }
            PropertyKind::Object | PropertyKind::Map | PropertyKind::Array => {
                self.reference.as_deref().into_iter().collect()
            }
            _ => Vec::new(),
        }
    }
}
