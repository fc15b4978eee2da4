use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::media_type::{Body, MediaType, select_body};

/// A request body definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

impl RequestBody {
    pub fn body(&self) -> Option<Body<'_>> {
        select_body(&self.content)
    }
}
