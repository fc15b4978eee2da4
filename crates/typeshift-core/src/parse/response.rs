use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::media_type::{Body, MediaType, select_body};
use super::schema::Schema;

/// A response definition, covering both the OpenAPI 3 `content` map and the
/// Swagger 2 `schema` field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Response {
    pub fn body(&self) -> Option<Body<'_>> {
        match &self.schema {
            Some(schema) => Some(Body::Json(schema)),
            None => select_body(&self.content),
        }
    }
}

/// Status code class of a response key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success(u16),
    Error(u16),
    Other,
}

impl StatusClass {
    /// Classify a response key such as `200`, `404` or `default`.
    pub fn of(key: &str) -> Self {
        match key.parse::<u16>() {
            Ok(code @ 200..=299) => StatusClass::Success(code),
            Ok(code @ 400..=599) => StatusClass::Error(code),
            _ => StatusClass::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_status_codes() {
        assert_eq!(StatusClass::of("201"), StatusClass::Success(201));
        assert_eq!(StatusClass::of("404"), StatusClass::Error(404));
        assert_eq!(StatusClass::of("503"), StatusClass::Error(503));
        assert_eq!(StatusClass::of("302"), StatusClass::Other);
        assert_eq!(StatusClass::of("default"), StatusClass::Other);
    }

    #[test]
    fn swagger_schema_takes_precedence() {
        let response: Response = serde_json::from_str(
            r##"{"description":"ok","headers":{"X-Rate":3},"schema":{"$ref":"#/definitions/Pet"}}"##,
        )
        .unwrap();
        assert!(matches!(response.body(), Some(Body::Json(_))));
    }
}
