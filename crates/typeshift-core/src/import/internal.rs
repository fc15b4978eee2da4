use async_trait::async_trait;

use super::{Imported, Importer};
use crate::compat;
use crate::error::ImportError;
use crate::model::Specification;

/// Loads the serialized model itself, migrating older documents on the way.
pub struct InternalImporter;

#[async_trait]
impl Importer for InternalImporter {
    async fn import(&self, text: &str) -> Result<Imported, ImportError> {
        let spec: Specification = serde_json::from_str(text)?;
        Ok(Imported {
            spec: compat::normalize(spec),
            diagnostics: Vec::new(),
        })
    }
}
