use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::schema::Schema;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A media type object. Only the schema matters for conversion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// What a request or response body carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Body<'a> {
    /// A JSON body described by a schema.
    Json(&'a Schema),
    /// A raw body, identified by its content type.
    Mime(&'a str),
}

/// Pick the body of a `content` map: the `application/json` schema when
/// present, otherwise the first declared content type.
pub fn select_body(content: &IndexMap<String, MediaType>) -> Option<Body<'_>> {
    if let Some(media) = content.get(JSON_CONTENT_TYPE) {
        return media.schema.as_ref().map(Body::Json);
    }
    content
        .keys()
        .next()
        .map(|content_type| Body::Mime(content_type.as_str()))
}
