//! Crate-level error type.

use crate::catalog::CatalogError;
use crate::executor::ExecutorError;
use crate::query::CompileError;
use crate::results::MaterializeError;
use crate::security::AccessDenied;
use thiserror::Error;

/// Errors returned by [`QueryService`](crate::QueryService) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller roles do not admit an entity or attribute.
    #[error("access denied: {0}")]
    Access(#[from] AccessDenied),

    /// Token sequence does not compile.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// Catalog is invalid or unavailable.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Store rejected the query.
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// Rows do not match the catalog.
    #[error("materialization error: {0}")]
    Materialize(#[from] MaterializeError),

    /// No entity with this display name.
    #[error("unknown entity {0:?}")]
    UnknownEntity(String),

    /// No queryable attribute with this display name.
    #[error("unknown attribute {attribute:?} on entity {entity}")]
    UnknownAttribute { entity: String, attribute: String },

    /// The operator alias does not resolve.
    #[error("unknown operator {0:?}")]
    UnknownOperator(String),
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, Error>;
