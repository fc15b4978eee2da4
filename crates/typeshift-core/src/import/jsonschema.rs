use std::sync::Arc;

use async_trait::async_trait;

use super::converter::SchemaConverter;
use super::typeschema::convert_document;
use super::{Imported, Importer};
use crate::error::ImportError;
use crate::naming::NamingService;
use crate::parse::{document_from_json, yaml_to_json_text};

/// Importer for plain JSON-Schema documents (`definitions`/`$defs`).
///
/// `$import` entries are not resolved.
pub struct JsonSchemaImporter {
    naming: Arc<dyn NamingService>,
}

impl JsonSchemaImporter {
    pub fn new(naming: Arc<dyn NamingService>) -> Self {
        Self { naming }
    }
}

#[async_trait]
impl Importer for JsonSchemaImporter {
    async fn import(&self, text: &str) -> Result<Imported, ImportError> {
        let document = document_from_json(text)?;
        let mut converter = SchemaConverter::new(self.naming.as_ref());
        let spec = convert_document(&document, Vec::new(), &mut converter);
        Ok(Imported {
            spec,
            diagnostics: converter.into_diagnostics(),
        })
    }
}

/// Runs a JSON importer on YAML input by re-serializing it as JSON first.
pub struct YamlAdapter {
    inner: Arc<dyn Importer>,
}

impl YamlAdapter {
    pub fn new(inner: Arc<dyn Importer>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Importer for YamlAdapter {
    async fn import(&self, text: &str) -> Result<Imported, ImportError> {
        let json = yaml_to_json_text(text)?;
        self.inner.import(&json).await
    }
}
