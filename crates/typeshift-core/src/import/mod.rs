//! Dialect importers and the dispatcher that routes between them.

pub mod converter;
pub mod internal;
pub mod jsonschema;
pub mod names;
pub mod openapi;
pub mod raw;
pub mod typeapi;
pub mod typeschema;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;

use crate::config::NamingStrategy;
use crate::error::ImportError;
use crate::model::Specification;
use crate::naming::{DigestNaming, MAX_HASH_LENGTH, NamingService};
use crate::resolve::{DocumentFetcher, DocumentService, IncludeResolver, ReferenceResolver};

pub use converter::{Diagnostic, SchemaConverter};
pub use internal::InternalImporter;
pub use jsonschema::{JsonSchemaImporter, YamlAdapter};
pub use openapi::OpenApiImporter;
pub use raw::RawImporter;
pub use typeapi::TypeApiImporter;
pub use typeschema::TypeSchemaImporter;

/// The dialects every dispatcher understands out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Dialect {
    Internal,
    TypeApi,
    TypeSchema,
    OpenApiJson,
    OpenApiYaml,
    JsonSchemaJson,
    JsonSchemaYaml,
    RawJson,
    RawYaml,
}

impl Dialect {
    pub const ALL: [Dialect; 9] = [
        Dialect::Internal,
        Dialect::TypeApi,
        Dialect::TypeSchema,
        Dialect::OpenApiJson,
        Dialect::OpenApiYaml,
        Dialect::JsonSchemaJson,
        Dialect::JsonSchemaYaml,
        Dialect::RawJson,
        Dialect::RawYaml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Internal => "internal",
            Dialect::TypeApi => "typeapi",
            Dialect::TypeSchema => "typeschema",
            Dialect::OpenApiJson => "openapi-json",
            Dialect::OpenApiYaml => "openapi-yaml",
            Dialect::JsonSchemaJson => "jsonschema-json",
            Dialect::JsonSchemaYaml => "jsonschema-yaml",
            Dialect::RawJson => "raw-json",
            Dialect::RawYaml => "raw-yaml",
        }
    }

    /// Guess the dialect from a file name such as `petstore.openapi.yaml` or
    /// `schema.json`. Plain `.json`/`.yaml` files default to TypeAPI and
    /// OpenAPI respectively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?.to_ascii_lowercase();
        let (stem, extension) = file_name.rsplit_once('.')?;
        let yaml = match extension {
            "json" => false,
            "yaml" | "yml" => true,
            _ => return None,
        };
        let hint = |needle: &str| stem.ends_with(needle) || stem == needle.trim_start_matches('.');
        let dialect = if hint(".openapi") || hint(".swagger") {
            if yaml { Dialect::OpenApiYaml } else { Dialect::OpenApiJson }
        } else if hint(".schema") || hint(".jsonschema") {
            if yaml { Dialect::JsonSchemaYaml } else { Dialect::JsonSchemaJson }
        } else if hint(".sample") || hint(".raw") {
            if yaml { Dialect::RawYaml } else { Dialect::RawJson }
        } else if hint(".typeschema") {
            Dialect::TypeSchema
        } else if hint(".internal") {
            Dialect::Internal
        } else if yaml {
            Dialect::OpenApiYaml
        } else {
            Dialect::TypeApi
        };
        Some(dialect)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ImportError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == tag)
            .ok_or_else(|| ImportError::UnsupportedDialect(tag.to_string()))
    }
}

impl TryFrom<String> for Dialect {
    type Error = ImportError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

/// A specification plus the entries dropped while importing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Imported {
    pub spec: Specification,
    pub diagnostics: Vec<Diagnostic>,
}

/// One import strategy.
#[async_trait]
pub trait Importer: Send + Sync {
    /// Import a document, keeping the diagnostics of dropped entries.
    async fn import(&self, text: &str) -> Result<Imported, ImportError>;

    /// Import a document.
    async fn transform(&self, text: &str) -> Result<Specification, ImportError> {
        Ok(self.import(text).await?.spec)
    }
}

/// Knobs shared by the importers of one dispatcher.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub naming_strategy: NamingStrategy,
    /// Operation name → replacement, applied to OpenAPI operation names.
    pub aliases: IndexMap<String, String>,
    pub hash_length: usize,
    /// Dialect requested from the document service for `typehub:` includes.
    pub remote_format: Dialect,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            naming_strategy: NamingStrategy::default(),
            aliases: IndexMap::new(),
            hash_length: MAX_HASH_LENGTH,
            remote_format: Dialect::TypeApi,
        }
    }
}

/// Registry from dialect tag to importer.
pub struct ImportDispatcher {
    importers: HashMap<String, Arc<dyn Importer>>,
}

impl ImportDispatcher {
    /// Register the built-in importers, all sharing `resolver` and `naming`.
    pub fn new(
        resolver: Arc<dyn IncludeResolver>,
        naming: Arc<dyn NamingService>,
        options: ImportOptions,
    ) -> Self {
        let mut dispatcher = Self {
            importers: HashMap::new(),
        };

        let openapi = Arc::new(OpenApiImporter::new(naming.clone(), options.clone()));
        let jsonschema = Arc::new(JsonSchemaImporter::new(naming.clone()));
        let raw = Arc::new(RawImporter::new(naming.clone()));

        dispatcher.register(Dialect::Internal.as_str(), Arc::new(InternalImporter));
        dispatcher.register(
            Dialect::TypeApi.as_str(),
            Arc::new(TypeApiImporter::new(resolver.clone(), naming.clone())),
        );
        dispatcher.register(
            Dialect::TypeSchema.as_str(),
            Arc::new(TypeSchemaImporter::new(resolver, naming)),
        );
        dispatcher.register(Dialect::OpenApiJson.as_str(), openapi.clone());
        dispatcher.register(Dialect::OpenApiYaml.as_str(), Arc::new(YamlAdapter::new(openapi)));
        dispatcher.register(Dialect::JsonSchemaJson.as_str(), jsonschema.clone());
        dispatcher.register(
            Dialect::JsonSchemaYaml.as_str(),
            Arc::new(YamlAdapter::new(jsonschema)),
        );
        dispatcher.register(Dialect::RawJson.as_str(), raw.clone());
        dispatcher.register(Dialect::RawYaml.as_str(), Arc::new(YamlAdapter::new(raw)));

        dispatcher
    }

    /// Build a dispatcher whose reference resolver feeds remote documents back
    /// through the dispatcher itself.
    pub fn with_sources(
        fetcher: Arc<dyn DocumentFetcher>,
        service: Option<Arc<dyn DocumentService>>,
        options: ImportOptions,
    ) -> Arc<Self> {
        let naming: Arc<dyn NamingService> = Arc::new(DigestNaming::new(options.hash_length));
        Arc::new_cyclic(|pipeline| {
            let resolver = Arc::new(ReferenceResolver::new(
                fetcher,
                service,
                pipeline.clone(),
                options.remote_format,
            ));
            Self::new(resolver, naming, options)
        })
    }

    /// Add or replace the importer for `tag`.
    pub fn register(&mut self, tag: impl Into<String>, importer: Arc<dyn Importer>) {
        self.importers.insert(tag.into(), importer);
    }

    /// Registered tags, sorted.
    pub fn dialects(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.importers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    fn importer(&self, tag: &str) -> Result<&Arc<dyn Importer>, ImportError> {
        self.importers
            .get(tag)
            .ok_or_else(|| ImportError::UnsupportedDialect(tag.to_string()))
    }

    /// Import `text` with the importer registered for `tag`.
    pub async fn transform(&self, tag: &str, text: &str) -> Result<Specification, ImportError> {
        debug!("importing {} bytes as {tag}", text.len());
        self.importer(tag)?.transform(text).await
    }

    /// Like [`transform`](Self::transform), keeping diagnostics.
    pub async fn import(&self, tag: &str, text: &str) -> Result<Imported, ImportError> {
        debug!("importing {} bytes as {tag}", text.len());
        self.importer(tag)?.import(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::OfflineResolver;

    fn dispatcher() -> ImportDispatcher {
        ImportDispatcher::new(
            Arc::new(OfflineResolver),
            Arc::new(DigestNaming::default()),
            ImportOptions::default(),
        )
    }

    #[test]
    fn dialect_tags_round_trip() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.as_str().parse::<Dialect>().unwrap(), dialect);
        }
        assert!(matches!(
            "graphql".parse::<Dialect>(),
            Err(ImportError::UnsupportedDialect(tag)) if tag == "graphql"
        ));
    }

    #[test]
    fn dialect_from_path() {
        let guess = |p: &str| Dialect::from_path(Path::new(p));
        assert_eq!(guess("petstore.openapi.yaml"), Some(Dialect::OpenApiYaml));
        assert_eq!(guess("api/swagger.json"), Some(Dialect::OpenApiJson));
        assert_eq!(guess("person.schema.json"), Some(Dialect::JsonSchemaJson));
        assert_eq!(guess("data.sample.yml"), Some(Dialect::RawYaml));
        assert_eq!(guess("model.typeschema.json"), Some(Dialect::TypeSchema));
        assert_eq!(guess("spec.json"), Some(Dialect::TypeApi));
        assert_eq!(guess("notes.txt"), None);
    }

    #[test]
    fn registers_every_builtin_dialect() {
        let dispatcher = dispatcher();
        let mut expected: Vec<&str> = Dialect::ALL.iter().map(Dialect::as_str).collect();
        expected.sort_unstable();
        assert_eq!(dispatcher.dialects(), expected);
    }

    #[tokio::test]
    async fn unknown_tag_is_unsupported() {
        let err = dispatcher().transform("wsdl", "{}").await.unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedDialect(tag) if tag == "wsdl"));
    }

    #[tokio::test]
    async fn importer_errors_propagate_unchanged() {
        let err = dispatcher().transform("typeapi", "{").await.unwrap_err();
        assert!(matches!(err, ImportError::Json(_)));
    }

    struct Fixed;

    #[async_trait]
    impl Importer for Fixed {
        async fn import(&self, _text: &str) -> Result<Imported, ImportError> {
            Ok(Imported {
                spec: Specification {
                    base_url: Some("fixed".to_string()),
                    ..Specification::default()
                },
                diagnostics: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn custom_importers_can_be_registered() {
        let mut dispatcher = dispatcher();
        dispatcher.register("fixed", Arc::new(Fixed));
        let spec = dispatcher.transform("fixed", "").await.unwrap();
        assert_eq!(spec.base_url.as_deref(), Some("fixed"));
    }
}
