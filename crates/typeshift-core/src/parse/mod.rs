//! Serde models of the external dialects.
//!
//! The models are lenient: collections whose entries are converted one by one
//! are kept as raw [`serde_json::Value`]s, so a single malformed entry never
//! rejects the whole document.

pub mod components;
pub mod document;
pub mod media_type;
pub mod operation;
pub mod parameter;
pub mod ref_resolve;
pub mod request_body;
pub mod response;
pub mod schema;
pub mod security;
pub mod server;
pub mod spec;
pub mod typeapi;

use serde::de::DeserializeOwned;

use crate::error::ImportError;
use document::Document;

/// Parse a TypeSchema/TypeAPI/JSON-Schema document from JSON.
pub fn document_from_json(input: &str) -> Result<Document, ImportError> {
    Ok(serde_json::from_str(input)?)
}

/// Parse YAML into a JSON value.
pub fn yaml_to_value(input: &str) -> Result<serde_json::Value, ImportError> {
    Ok(serde_yaml_ng::from_str(input)?)
}

/// Re-serialize YAML text as JSON text, keeping key order.
pub fn yaml_to_json_text(input: &str) -> Result<String, ImportError> {
    let value = yaml_to_value(input)?;
    Ok(serde_json::to_string(&value)?)
}

/// Deserialize one raw entry.
pub fn entry<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, serde_json::Error> {
    T::deserialize(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_keeps_key_order() {
        let json = yaml_to_json_text("b: 1\na:\n  z: true\n  y: [1, 2]\n").unwrap();
        assert_eq!(json, r#"{"b":1,"a":{"z":true,"y":[1,2]}}"#);
    }

    #[test]
    fn malformed_json_is_an_import_error() {
        let err = document_from_json("{not json").unwrap_err();
        assert!(matches!(err, ImportError::Json(_)));
    }

    #[test]
    fn malformed_yaml_is_an_import_error() {
        let err = yaml_to_json_text("a: [1, 2").unwrap_err();
        assert!(matches!(err, ImportError::Yaml(_)));
    }
}
