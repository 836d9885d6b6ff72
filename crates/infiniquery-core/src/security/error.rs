//! Access control errors.

use std::fmt;
use thiserror::Error;

/// What kind of catalog element access was denied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectKind {
    Entity,
    Attribute,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectKind::Entity => f.write_str("entity"),
            SubjectKind::Attribute => f.write_str("attribute"),
        }
    }
}

/// The caller's roles do not admit an entity or attribute.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("users with roles [{caller_roles}] are not allowed to access {subject_kind} {subject_alias}")]
pub struct AccessDenied {
    /// Kind of element.
    pub subject_kind: SubjectKind,
    /// Display name of the element.
    pub subject_alias: String,
    /// Caller roles, comma-separated.
    pub caller_roles: String,
}
