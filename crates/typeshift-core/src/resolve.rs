//! Resolution of `$import` includes into the types of the referenced document.

use std::io::ErrorKind;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use log::{debug, warn};
use url::Url;

use crate::error::FetchError;
use crate::import::{Dialect, ImportDispatcher};
use crate::model::{DocumentRef, Include, Type};

pub const TYPEHUB_SCHEME: &str = "typehub";

tokio::task_local! {
    /// Locators of the includes being resolved by the current import pass,
    /// outermost first.
    static INCLUDE_CHAIN: Vec<String>;
}

/// What importers consult for the types of an include.
///
/// `None` means "not resolved"; it is never an error.
#[async_trait]
pub trait IncludeResolver: Send + Sync {
    async fn resolve_include_types(&self, include: &Include) -> Option<Vec<Type>>;
}

/// Raw document retrieval. `Ok(None)` means the location has no content.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Option<String>, FetchError>;
}

/// Result of asking the document service for an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The exported document itself.
    Text(String),
    /// A link to download the exported document from.
    Href(String),
}

/// Remote document service hosting versioned specifications.
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn find_document(&self, user: &str, name: &str)
    -> Result<Option<DocumentRef>, FetchError>;

    async fn export(
        &self,
        user: &str,
        name: &str,
        version: &str,
        format: Dialect,
    ) -> Result<Option<ExportOutcome>, FetchError>;
}

/// Resolves nothing; every include stays unresolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineResolver;

#[async_trait]
impl IncludeResolver for OfflineResolver {
    async fn resolve_include_types(&self, include: &Include) -> Option<Vec<Type>> {
        debug!("offline, not resolving include `{}`", include.alias);
        None
    }
}

/// Reads `file:` URLs from disk. Other schemes have no content.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

#[async_trait]
impl DocumentFetcher for FileFetcher {
    async fn fetch(&self, url: &Url) -> Result<Option<String>, FetchError> {
        if url.scheme() != "file" {
            debug!("no network access, skipping {url}");
            return Ok(None);
        }
        let path = url
            .to_file_path()
            .map_err(|()| FetchError::InvalidUrl(url.to_string()))?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FetchError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

/// Fetches included documents and runs them through the import pipeline.
///
/// `typehub://<user>:<document>@<version>` locators go through the document
/// service and are imported as `remote_format`; `http`, `https` and `file`
/// URLs are fetched directly and imported as TypeSchema.
pub struct ReferenceResolver {
    fetcher: Arc<dyn DocumentFetcher>,
    service: Option<Arc<dyn DocumentService>>,
    pipeline: Weak<ImportDispatcher>,
    remote_format: Dialect,
}

impl ReferenceResolver {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        service: Option<Arc<dyn DocumentService>>,
        pipeline: Weak<ImportDispatcher>,
        remote_format: Dialect,
    ) -> Self {
        Self {
            fetcher,
            service,
            pipeline,
            remote_format,
        }
    }

    async fn load(&self, url: &Url) -> Result<Option<Vec<Type>>, FetchError> {
        let fetched = match url.scheme() {
            TYPEHUB_SCHEME => self
                .fetch_remote(url)
                .await?
                .map(|text| (text, self.remote_format)),
            "http" | "https" | "file" => self
                .fetcher
                .fetch(url)
                .await?
                .map(|text| (text, Dialect::TypeSchema)),
            _ => return Err(FetchError::InvalidUrl(url.to_string())),
        };
        let Some((text, dialect)) = fetched else {
            return Ok(None);
        };

        let Some(pipeline) = self.pipeline.upgrade() else {
            debug!("import pipeline is gone, leaving {url} unresolved");
            return Ok(None);
        };
        match pipeline.transform(dialect.as_str(), &text).await {
            Ok(spec) => Ok(Some(spec.types)),
            Err(e) => {
                warn!("failed to import {url} as {dialect}: {e}");
                Ok(None)
            }
        }
    }

    async fn fetch_remote(&self, url: &Url) -> Result<Option<String>, FetchError> {
        let Some(service) = &self.service else {
            debug!("no document service configured for {url}");
            return Ok(None);
        };

        let user = url.username();
        let name = url.password().unwrap_or_default();
        let version = url.host_str().unwrap_or_default();
        if user.is_empty() || name.is_empty() || version.is_empty() {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        if service.find_document(user, name).await?.is_none() {
            debug!("document {user}/{name} does not exist");
            return Ok(None);
        }
        match service.export(user, name, version, self.remote_format).await? {
            None => Ok(None),
            Some(ExportOutcome::Text(text)) => Ok(Some(text)),
            Some(ExportOutcome::Href(href)) => {
                let href = Url::parse(&href).map_err(|_| FetchError::InvalidUrl(href.clone()))?;
                self.fetcher.fetch(&href).await
            }
        }
    }
}

#[async_trait]
impl IncludeResolver for ReferenceResolver {
    async fn resolve_include_types(&self, include: &Include) -> Option<Vec<Type>> {
        let Some(locator) = include.locator() else {
            debug!("include `{}` has no locator", include.alias);
            return None;
        };
        let url = match Url::parse(&locator) {
            Ok(url) => url,
            Err(e) => {
                warn!("include `{}`: invalid url `{locator}`: {e}", include.alias);
                return None;
            }
        };

        // Only the includes above this one in the same pass count as a cycle.
        let mut chain = INCLUDE_CHAIN.try_with(Vec::clone).unwrap_or_default();
        if chain.contains(&locator) {
            warn!("include `{}`: {locator} includes itself", include.alias);
            return None;
        }
        chain.push(locator.clone());
        let loaded = INCLUDE_CHAIN.scope(chain, self.load(&url)).await;

        match loaded {
            Ok(types) => {
                if types.is_none() {
                    debug!("include `{}`: no content at {locator}", include.alias);
                }
                types
            }
            Err(e) => {
                warn!("include `{}`: {e}", include.alias);
                None
            }
        }
    }
}
