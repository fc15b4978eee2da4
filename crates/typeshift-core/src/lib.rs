//! Bidirectional conversion between API and schema description dialects and a
//! single dialect-neutral [`Specification`](model::Specification).

pub mod compat;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod model;
pub mod naming;
pub mod parse;
pub mod resolve;

pub use error::{ConversionError, ExportError, FetchError, ImportError};
pub use import::{Dialect, ImportDispatcher, ImportOptions, Imported, Importer};
pub use model::Specification;
