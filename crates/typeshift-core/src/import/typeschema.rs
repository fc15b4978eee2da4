use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use super::converter::{SchemaConverter, normalize_ref};
use super::names::type_name;
use super::{Imported, Importer};
use crate::error::{ConversionError, ImportError};
use crate::model::{Include, Specification};
use crate::naming::NamingService;
use crate::parse::document::{Document, ImportEntry};
use crate::parse::{document_from_json, entry};
use crate::resolve::IncludeResolver;

/// Importer for TypeSchema documents, the dialect closest to the model.
pub struct TypeSchemaImporter {
    resolver: Arc<dyn IncludeResolver>,
    naming: Arc<dyn NamingService>,
}

impl TypeSchemaImporter {
    pub fn new(resolver: Arc<dyn IncludeResolver>, naming: Arc<dyn NamingService>) -> Self {
        Self { resolver, naming }
    }
}

#[async_trait]
impl Importer for TypeSchemaImporter {
    async fn import(&self, text: &str) -> Result<Imported, ImportError> {
        let document = document_from_json(text)?;
        let mut converter = SchemaConverter::new(self.naming.as_ref());
        let imports = resolve_imports(&document, self.resolver.as_ref(), &mut converter).await;
        let spec = convert_document(&document, imports, &mut converter);
        Ok(Imported {
            spec,
            diagnostics: converter.into_diagnostics(),
        })
    }
}

/// Build the includes of a document and resolve them one after another.
///
/// An include that can not be resolved keeps `types: None`; an entry that is
/// not a valid locator is dropped.
pub(crate) async fn resolve_imports(
    document: &Document,
    resolver: &dyn IncludeResolver,
    converter: &mut SchemaConverter<'_>,
) -> Vec<Include> {
    let mut imports = Vec::new();
    for (alias, raw) in document.import_entries() {
        let Some(mut include) = include_from_entry(alias, raw, converter) else {
            continue;
        };
        include.types = resolver.resolve_include_types(&include).await;
        if include.types.is_none() {
            debug!("include `{alias}` is not resolved");
        }
        imports.push(include);
    }
    imports
}

fn include_from_entry(
    alias: &str,
    raw: &Value,
    converter: &mut SchemaConverter<'_>,
) -> Option<Include> {
    match entry::<ImportEntry>(raw) {
        Ok(ImportEntry::Url(url)) => Some(Include::from_url(alias, url)),
        Ok(ImportEntry::Locator {
            url,
            document,
            version,
        }) => Some(Include {
            alias: alias.to_string(),
            url,
            document,
            version,
            types: None,
        }),
        Err(e) => {
            converter.record(
                format!("$import.{alias}"),
                ConversionError::InvalidArgument(e.to_string()),
            );
            None
        }
    }
}

/// Convert the type side of a document: definitions, `components.schemas`,
/// the bare-schema root, then every anonymous object found on the way.
pub(crate) fn convert_document(
    document: &Document,
    imports: Vec<Include>,
    converter: &mut SchemaConverter<'_>,
) -> Specification {
    let mut spec = Specification {
        imports,
        ..Specification::default()
    };

    for (name, raw) in document.schema_entries() {
        if let Some(ty) = converter.convert_entry(name, raw) {
            spec.types.push(ty);
        }
    }

    if let Some(root) = document.bare_root() {
        let name = document
            .title
            .as_deref()
            .map(type_name)
            .unwrap_or_else(|| "Root".to_string());
        if let Some(ty) = converter.convert_entry(&name, &root) {
            spec.types.push(ty);
            spec.root = Some(spec.types.len() - 1);
        }
    }

    converter.drain_anonymous(&mut spec.types);

    if let Some(root) = document.root_name() {
        let root = normalize_ref(root);
        match spec.find_type(&root) {
            Some((index, _)) => spec.root = Some(index),
            None => debug!("declared root `{root}` is not a known type"),
        }
    }

    spec
}
