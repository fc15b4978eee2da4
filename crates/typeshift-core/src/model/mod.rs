pub mod operations;
pub mod schemas;
pub mod security;
pub mod spec;

pub use operations::*;
pub use schemas::*;
pub use security::Security;
pub use spec::{DocumentRef, Include, Specification, UnresolvedReference};

/// Scalar keywords that every dialect understands without a declaration.
pub const SCALAR_TYPES: [&str; 5] = ["string", "integer", "number", "boolean", "any"];

/// The name a `$generic` marker resolves to.
pub const GENERIC_PARAMETER: &str = "T";

/// Whether `name` is one of the scalar keywords.
pub fn is_scalar(name: &str) -> bool {
    SCALAR_TYPES.contains(&name)
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
