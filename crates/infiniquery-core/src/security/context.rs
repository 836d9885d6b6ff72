//! Caller identity passed to every operation.

use crate::value::Value;
use std::collections::{BTreeSet, HashMap};

/// The roles and scope attributes of the current caller.
#[derive(Debug, Clone, Default)]
pub struct CallerContext {
    /// Granted roles, upper-cased.
    pub roles: BTreeSet<String>,
    /// Values bound to `:name` placeholders of additional entity filters
    /// (e.g. tenant or user id).
    pub scope_attributes: HashMap<String, Value>,
}

impl CallerContext {
    /// Create a context holding the given roles.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            roles: roles
                .into_iter()
                .map(|r| r.as_ref().trim().to_uppercase())
                .filter(|r| !r.is_empty())
                .collect(),
            scope_attributes: HashMap::new(),
        }
    }

    /// Create a context from a comma-separated role list.
    pub fn from_role_list(roles: &str) -> Self {
        Self::new(roles.split(','))
    }

    /// Create a context without roles.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Bind a scope attribute.
    pub fn with_scope_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.scope_attributes.insert(name.into(), value.into());
        self
    }

    /// Get a scope attribute.
    pub fn scope_attribute(&self, name: &str) -> Option<&Value> {
        self.scope_attributes.get(name)
    }

    /// Roles as a comma-separated list for messages.
    pub fn role_list(&self) -> String {
        self.roles.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}
