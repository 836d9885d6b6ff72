//! Queryable entity definitions.

use super::attribute::EntityAttribute;
use super::types::{Purpose, RoleSet};

/// A record type exposed for querying.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryableEntity {
    /// Store-native type name, used in the `FROM` clause.
    pub type_id: String,
    /// User-facing name (unique within the catalog).
    pub display_name: String,
    /// Roles allowed to access this entity.
    pub roles: RoleSet,
    /// Store-native filter fragment appended to every query, with
    /// `:name` placeholders bound from the caller's scope attributes.
    pub additional_filter: Option<String>,
    attributes: Vec<EntityAttribute>,
}

impl QueryableEntity {
    /// Create a new unrestricted entity with no attributes.
    pub fn new(type_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            display_name: display_name.into(),
            roles: RoleSet::Unrestricted,
            additional_filter: None,
            attributes: Vec::new(),
        }
    }

    /// Restrict access to the given comma-separated roles.
    pub fn with_roles(mut self, roles: &str) -> Self {
        self.roles = RoleSet::parse(roles);
        for attr in &mut self.attributes {
            attr.bind_owner(&self.display_name, &self.roles);
        }
        self
    }

    /// Set the additional filter fragment.
    pub fn with_additional_filter(mut self, filter: impl Into<String>) -> Self {
        self.additional_filter = Some(filter.into());
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, mut attribute: EntityAttribute) -> Self {
        attribute.bind_owner(&self.display_name, &self.roles);
        self.attributes.push(attribute);
        self
    }

    /// Add multiple attributes.
    pub fn with_attributes(self, attributes: impl IntoIterator<Item = EntityAttribute>) -> Self {
        attributes
            .into_iter()
            .fold(self, |entity, attr| entity.with_attribute(attr))
    }

    /// All attributes in declaration order.
    pub fn attributes(&self) -> &[EntityAttribute] {
        &self.attributes
    }

    /// Attributes visible for a purpose, in declaration order.
    pub fn attributes_for(&self, purpose: Purpose) -> impl Iterator<Item = &EntityAttribute> {
        self.attributes
            .iter()
            .filter(move |a| a.is_visible_for(purpose))
    }

    /// Get an attribute by display name, if visible for the purpose.
    pub fn attribute(&self, display_name: &str, purpose: Purpose) -> Option<&EntityAttribute> {
        self.attributes_for(purpose)
            .find(|a| a.display_name == display_name)
    }
}
