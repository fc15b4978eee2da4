use serde::{Deserialize, Serialize};

use super::schema::{Schema, TypeSet};

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
    /// Swagger 2.0 request body.
    Body,
    /// Swagger 2.0 form field.
    FormData,
}

/// An API parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    // Swagger 2.0 puts the type on the parameter itself.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<TypeSet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
}

impl Parameter {
    /// The parameter's schema, or one built from its inline Swagger 2.0 type.
    pub fn effective_schema(&self) -> Option<Schema> {
        if let Some(schema) = &self.schema {
            return Some(schema.clone());
        }
        let param_type = self.param_type.clone()?;
        Some(Schema {
            schema_type: Some(param_type),
            format: self.format.clone(),
            items: self.items.clone(),
            ..Schema::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::schema::SchemaType;

    #[test]
    fn swagger_parameter_uses_inline_type() {
        let param: Parameter =
            serde_json::from_str(r#"{"name":"limit","in":"query","type":"integer"}"#).unwrap();
        let schema = param.effective_schema().unwrap();
        assert_eq!(schema.primary_type(), Some(&SchemaType::Integer));
    }

    #[test]
    fn parameter_without_type_has_no_schema() {
        let param: Parameter =
            serde_json::from_str(r#"{"name":"session","in":"cookie"}"#).unwrap();
        assert_eq!(param.location, ParameterLocation::Cookie);
        assert!(param.effective_schema().is_none());
    }
}
