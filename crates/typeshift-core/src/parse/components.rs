use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Components object holding reusable definitions.
///
/// Entries stay raw so that one malformed definition can be dropped without
/// rejecting the document; `$ref` targets are looked up through
/// [`LocalPointer`](super::ref_resolve::LocalPointer).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Value>,

    #[serde(
        rename = "securitySchemes",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub security_schemes: IndexMap<String, Value>,
}
