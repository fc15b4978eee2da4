use std::fmt;

use serde::{Deserialize, Serialize};

use super::is_false;

/// HTTP method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Case-insensitive lookup.
    pub fn parse(method: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(method))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualifier on a type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Homogeneous string-keyed dictionary of the referenced type.
    Map,
    /// Homogeneous list of the referenced type.
    Array,
    /// The reference is a raw content type such as `application/octet-stream`.
    Mime,
}

/// Where an argument is bound in the HTTP request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentLocation {
    Path,
    #[default]
    Query,
    Header,
    /// Legacy binding, folded into the operation payload on load.
    Body,
}

impl ArgumentLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgumentLocation::Path => "path",
            ArgumentLocation::Query => "query",
            ArgumentLocation::Header => "header",
            ArgumentLocation::Body => "body",
        }
    }
}

/// One path/query/header argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    pub name: String,
    #[serde(rename = "in", default)]
    pub location: ArgumentLocation,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_shape: Option<Shape>,
}

/// An error response of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Throw {
    pub code: u16,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_shape: Option<Shape>,
}

fn default_http_code() -> u16 {
    200
}

fn default_http_path() -> String {
    "/".to_string()
}

/// One API action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub http_method: HttpMethod,

    #[serde(default = "default_http_path")]
    pub http_path: String,

    #[serde(default = "default_http_code")]
    pub http_code: u16,

    #[serde(default)]
    pub arguments: Vec<Argument>,

    /// Body type name, or content type when `payload_shape` is `mime`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_shape: Option<Shape>,

    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_shape: Option<Shape>,

    #[serde(default)]
    pub throws: Vec<Throw>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<u8>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub authorization: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Operation {
    pub fn new(name: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            http_method: method,
            http_path: path.into(),
            http_code: default_http_code(),
            arguments: Vec::new(),
            payload: None,
            payload_shape: None,
            return_type: None,
            return_shape: None,
            throws: Vec::new(),
            stability: None,
            security: Vec::new(),
            authorization: false,
            tags: Vec::new(),
        }
    }

    pub fn arguments_in(&self, location: ArgumentLocation) -> impl Iterator<Item = &Argument> {
        self.arguments
            .iter()
            .filter(move |a| a.location == location)
    }
}
