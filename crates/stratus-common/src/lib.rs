//! Common types for Stratus: managed resource CRDs, attribute referencers,
//! errors, and telemetry

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod reference;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Annotation holding the name of a resource in Azure when it differs from
/// `metadata.name`
pub const EXTERNAL_NAME_ANNOTATION: &str = "stratus.dev/external-name";
