use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),
}

/// Failure to convert a single definition, property, operation or argument.
///
/// Importers catch these per entry and drop the offending entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("could not resolve reference: {0}")]
    UnresolvableReference(String),

    #[error("can not create a type from scalar schema `{0}`")]
    ScalarType(String),

    #[error("could not resolve type: {0}")]
    UnknownType(String),

    #[error("invalid argument `{0}`")]
    InvalidArgument(String),

    #[error("can only resolve local references, got `{0}`")]
    LocalReference(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("schema can not be serialized: {0}")]
    Unserializable(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("missing reference in {context}")]
    MissingReference { context: String },

    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid include url `{0}`")]
    InvalidUrl(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("document service error: {0}")]
    Service(String),
}
