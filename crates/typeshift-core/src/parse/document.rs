use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::components::Components;

/// Top level of a TypeSchema, TypeAPI or JSON-Schema document.
///
/// Definitions and operations are kept raw so each entry converts (and
/// fails) on its own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "$import", default, skip_serializing_if = "IndexMap::is_empty")]
    pub imports: IndexMap<String, Value>,

    /// Older spelling of `$import`.
    #[serde(rename = "import", default, skip_serializing_if = "IndexMap::is_empty")]
    pub legacy_imports: IndexMap<String, Value>,

    #[serde(rename = "baseUrl", default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub operations: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, Value>,

    #[serde(rename = "$defs", default, skip_serializing_if = "IndexMap::is_empty")]
    pub defs: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Properties of a bare schema document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub root_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<Value>,
}

impl Document {
    /// Declared definitions, then `$defs`, then `components.schemas`.
    pub fn schema_entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.definitions
            .iter()
            .chain(self.defs.iter())
            .chain(
                self.components
                    .iter()
                    .flat_map(|components| components.schemas.iter()),
            )
    }

    /// `$import` entries followed by those under the older `import` key.
    pub fn import_entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.imports.iter().chain(self.legacy_imports.iter())
    }

    /// Name of the declared entry type, from `root` or `$ref`.
    pub fn root_name(&self) -> Option<&str> {
        self.root
            .as_ref()
            .and_then(Value::as_str)
            .or(self.root_ref.as_deref())
    }

    /// A bare schema body to convert into the root type, if the document has
    /// top-level `properties`.
    pub fn bare_root(&self) -> Option<Value> {
        let properties = self.properties.as_ref()?;
        let mut root = serde_json::Map::new();
        if let Some(description) = &self.description {
            root.insert("description".into(), Value::String(description.clone()));
        }
        root.insert("type".into(), Value::String("struct".into()));
        root.insert("properties".into(), serde_json::to_value(properties).ok()?);
        if !self.required.is_empty() {
            root.insert("required".into(), serde_json::to_value(&self.required).ok()?);
        }
        Some(Value::Object(root))
    }
}

/// An `$import` value: a URL string or a structured locator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportEntry {
    Url(String),
    Locator {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        document: Option<crate::model::DocumentRef>,
        #[serde(default)]
        version: Option<String>,
    },
}
