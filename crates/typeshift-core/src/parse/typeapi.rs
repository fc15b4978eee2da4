use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::Schema;

/// One entry of a TypeAPI `operations` map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Argument entries, converted one by one.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub arguments: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<BodyEntry>,

    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub return_entry: Option<BodyEntry>,

    #[serde(default, skip_serializing_if = "Throws::is_empty")]
    pub throws: Throws,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<u8>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// One argument of an operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArgumentEntry {
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(rename = "contentType", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// A payload, return or throw: a schema or a raw content type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(rename = "contentType", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// `throws` is written either as a list or as a map keyed by anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Throws {
    List(Vec<BodyEntry>),
    Map(IndexMap<String, BodyEntry>),
}

impl Default for Throws {
    fn default() -> Self {
        Throws::List(Vec::new())
    }
}

impl Throws {
    pub fn is_empty(&self) -> bool {
        match self {
            Throws::List(list) => list.is_empty(),
            Throws::Map(map) => map.is_empty(),
        }
    }

    pub fn entries(&self) -> Vec<&BodyEntry> {
        match self {
            Throws::List(list) => list.iter().collect(),
            Throws::Map(map) => map.values().collect(),
        }
    }
}
