use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::GENERIC_PARAMETER;

/// A `type` keyword value across the JSON-Schema flavoured dialects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Any,
    Null,
    Array,
    Object,
    Struct,
    Map,
    Reference,
    Generic,
    #[serde(other)]
    Unknown,
}

impl SchemaType {
    /// The scalar keyword for scalar types.
    pub fn scalar_keyword(&self) -> Option<&'static str> {
        match self {
            SchemaType::String => Some("string"),
            SchemaType::Number => Some("number"),
            SchemaType::Integer => Some("integer"),
            SchemaType::Boolean => Some("boolean"),
            SchemaType::Any => Some("any"),
            _ => None,
        }
    }
}

/// The `type` field can be a single type or an array of types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<Schema>),
}

/// Either a bare property name (TypeSchema) or an OpenAPI discriminator object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Discriminator {
    Property(String),
    Object {
        #[serde(rename = "propertyName")]
        property_name: String,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        mapping: IndexMap<String, String>,
    },
}

/// TypeSchema `extends`, either a plain name or a reference node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extends {
    Name(String),
    Reference {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        target: String,
    },
}

impl Extends {
    pub fn target(&self) -> &str {
        match self {
            Extends::Name(name) => name,
            Extends::Reference { target, .. } => target,
        }
    }
}

/// A schema node as written in TypeSchema, TypeAPI, JSON-Schema and OpenAPI.
///
/// The struct is deliberately permissive: every keyword is optional and
/// unknown keywords are kept in `extensions`, so one node type serves both
/// directions of every dialect.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<TypeSet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Target of a TypeSchema `reference` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(rename = "$generic", default, skip_serializing_if = "Option::is_none")]
    pub generic: Option<String>,

    /// Template parameter name of a TypeSchema `generic` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "$extends", default, skip_serializing_if = "Option::is_none")]
    pub extends_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<Extends>,

    #[serde(
        rename = "$template",
        alias = "template",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub template: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,

    #[serde(
        rename = "readonly",
        alias = "readOnly",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub read_only: Option<bool>,

    // Object properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,

    // Array items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    /// Element of a TypeSchema `map`/`array` node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Box<Schema>>,

    // Composition
    #[serde(rename = "allOf", default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,

    // String constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(rename = "maxLength", default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    // Numeric constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(rename = "default", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<serde_json::Value>,

    /// Raw body content type in place of a schema.
    #[serde(rename = "contentType", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl Schema {
    /// `{"$ref": name}`
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            ref_path: Some(name.into()),
            ..Self::default()
        }
    }

    /// `{"type": t}`
    pub fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(TypeSet::Single(schema_type)),
            ..Self::default()
        }
    }

    /// `{"$generic": name}`
    pub fn generic(name: impl Into<String>) -> Self {
        Self {
            generic: Some(name.into()),
            ..Self::default()
        }
    }

    /// The first non-null entry of `type`.
    pub fn primary_type(&self) -> Option<&SchemaType> {
        match self.schema_type.as_ref()? {
            TypeSet::Single(t) => Some(t),
            TypeSet::Multiple(types) => types.iter().find(|t| **t != SchemaType::Null),
        }
    }

    /// `type` lists `null` next to another type.
    pub fn has_null_type(&self) -> bool {
        matches!(&self.schema_type, Some(TypeSet::Multiple(types)) if types.contains(&SchemaType::Null))
    }

    /// The scalar keyword if this node is a plain scalar.
    pub fn scalar_keyword(&self) -> Option<&'static str> {
        self.primary_type().and_then(SchemaType::scalar_keyword)
    }

    /// The schema describing map values, if any.
    pub fn map_values(&self) -> Option<&Schema> {
        match &self.additional_properties {
            Some(AdditionalProperties::Schema(s)) => Some(s),
            _ => None,
        }
    }

    /// `additionalProperties: true` without a value schema.
    pub fn allows_any_values(&self) -> bool {
        matches!(self.additional_properties, Some(AdditionalProperties::Bool(true)))
    }

    /// The parent named through `$extends` or `extends`.
    pub fn parent_name(&self) -> Option<&str> {
        self.extends_ref
            .as_deref()
            .or_else(|| self.extends.as_ref().map(Extends::target))
    }

    pub fn is_generic_marker(&self) -> bool {
        self.generic.is_some() || self.primary_type() == Some(&SchemaType::Generic)
    }

    /// Template parameter bound by a generic node.
    pub fn generic_parameter(&self) -> &str {
        self.generic
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(GENERIC_PARAMETER)
    }

    /// String-valued `x-` extensions with the prefix removed.
    pub fn metadata(&self) -> IndexMap<String, String> {
        self.extensions
            .iter()
            .filter_map(|(key, value)| {
                let key = key.strip_prefix("x-")?;
                Some((key.to_string(), value.as_str()?.to_string()))
            })
            .collect()
    }
}
