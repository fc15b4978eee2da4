use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::components::Components;
use super::security::SecurityRequirement;
use super::server::Server;

/// Top-level OpenAPI 3.x or Swagger 2.0 document.
///
/// Path items and definitions stay raw; each one is converted on its own.
/// Sections that play no part in conversion are not modelled, so their
/// contents can not reject the document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OpenApiSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    // Swagger 2.0 server description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(rename = "basePath", default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    #[serde(rename = "securityDefinitions", default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_definitions: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
}

impl OpenApiSpec {
    /// Swagger 2.0 has no `header` parameters in operation arguments and
    /// carries bodies as `in: body` parameters.
    pub fn is_swagger(&self) -> bool {
        self.openapi.is_none() && self.swagger.is_some()
    }

    /// Base URL from the first server, or Swagger's `host` + `basePath`.
    pub fn base_url(&self) -> Option<String> {
        if let Some(server) = self.servers.first() {
            return Some(server.expanded_url());
        }
        let host = self.host.as_deref()?;
        let scheme = self.schemes.first().map(String::as_str).unwrap_or("https");
        let base_path = self.base_path.as_deref().unwrap_or("");
        Some(format!("{scheme}://{host}{base_path}"))
    }

    /// Security scheme definitions of either version, in declaration order.
    pub fn security_schemes(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.components
            .iter()
            .flat_map(|c| c.security_schemes.iter())
            .chain(self.security_definitions.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_from_servers() {
        let spec: OpenApiSpec = serde_json::from_str(
            r#"{"openapi":"3.0.3","servers":[{"url":"https://api.example.com/v2"}]}"#,
        )
        .unwrap();
        assert!(!spec.is_swagger());
        assert_eq!(spec.base_url().as_deref(), Some("https://api.example.com/v2"));
    }

    #[test]
    fn base_url_from_swagger_host() {
        let spec: OpenApiSpec = serde_json::from_str(
            r#"{"swagger":"2.0","host":"petstore.io","basePath":"/v1","schemes":["http"]}"#,
        )
        .unwrap();
        assert!(spec.is_swagger());
        assert_eq!(spec.base_url().as_deref(), Some("http://petstore.io/v1"));
    }

    #[test]
    fn ignores_sections_it_does_not_convert() {
        let spec: OpenApiSpec = serde_json::from_str(
            r#"{
                "openapi": "3.1.0",
                "info": "Pet store",
                "servers": [{"url": "https://{env}.example.com", "description": 7,
                             "variables": {"env": {"default": "api", "enum": "api"}}}],
                "components": {"responses": [], "parameters": 1, "requestBodies": null}
            }"#,
        )
        .unwrap();
        assert_eq!(spec.base_url().as_deref(), Some("https://api.example.com"));
    }
}
