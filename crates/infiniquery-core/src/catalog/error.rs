//! Catalog loading and validation errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the schema catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Path of the catalog file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Catalog document is not valid JSON or has the wrong shape.
    #[error("invalid catalog document: {0}")]
    Json(#[from] serde_json::Error),

    /// The find keyword is missing or empty.
    #[error("catalog does not declare a find keyword")]
    MissingFindKeyword,

    /// Two entities share a display name.
    #[error("duplicate entity display name: {0}")]
    DuplicateEntity(String),

    /// Two attributes of one entity share a display name.
    #[error("duplicate attribute display name {attribute} on entity {entity}")]
    DuplicateAttribute {
        /// Owning entity display name.
        entity: String,
        /// Duplicated attribute display name.
        attribute: String,
    },

    /// A label path is missing or malformed.
    #[error("invalid label path for {entity}.{attribute}: {reason}")]
    InvalidLabelPath {
        /// Owning entity display name.
        entity: String,
        /// Attribute display name.
        attribute: String,
        /// What is wrong with the path.
        reason: String,
    },

    /// A custom value type has no registered literal parser.
    #[error("no literal parser registered for value type {value_type} on {entity}.{attribute}")]
    UnsupportedValueType {
        /// Owning entity display name.
        entity: String,
        /// Attribute display name.
        attribute: String,
        /// Declared value type tag.
        value_type: String,
    },

    /// The last reload failed; no catalog is being served.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
