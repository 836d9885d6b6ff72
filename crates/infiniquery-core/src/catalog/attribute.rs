//! Attribute definitions for queryable entities.

use super::types::{AttributeScope, Purpose, RoleSet, ValueType};
use crate::executor::{FieldValue, Record};

/// An attribute of a queryable entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityAttribute {
    /// Attribute name, resolvable on the underlying record type.
    pub attribute_name: String,
    /// User-facing name (unique within the owning entity).
    pub display_name: String,
    /// Declared value type.
    pub value_type: ValueType,
    /// Roles allowed to access this attribute.
    pub roles: RoleSet,
    /// Where this attribute is visible.
    pub scope: AttributeScope,
    /// Store-native query yielding reference values.
    pub possible_values_query: Option<String>,
    /// Attribute of a reference value used as its label.
    pub label_attribute: Option<String>,
    /// Explicit dotted label path, e.g. `department.name`.
    pub label_attribute_path: Option<String>,
    owner: Option<String>,
    effective_roles: RoleSet,
    accessor: AttributeAccessor,
}

impl EntityAttribute {
    /// Create a new attribute visible for queries and results.
    pub fn new(
        attribute_name: impl Into<String>,
        display_name: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        let attribute_name = attribute_name.into();
        Self {
            accessor: AttributeAccessor::new(&attribute_name, None),
            attribute_name,
            display_name: display_name.into(),
            value_type,
            roles: RoleSet::Unrestricted,
            scope: AttributeScope::Both,
            possible_values_query: None,
            label_attribute: None,
            label_attribute_path: None,
            owner: None,
            effective_roles: RoleSet::Unrestricted,
        }
    }

    /// Restrict access to the given comma-separated roles.
    pub fn with_roles(mut self, roles: &str) -> Self {
        self.roles = RoleSet::parse(roles);
        self.effective_roles = self.roles.clone();
        self
    }

    /// Set the visibility scope.
    pub fn with_scope(mut self, scope: AttributeScope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the query yielding reference values.
    pub fn with_possible_values_query(mut self, query: impl Into<String>) -> Self {
        self.possible_values_query = Some(query.into());
        self
    }

    /// Set the label attribute of reference values.
    pub fn with_label_attribute(mut self, label: impl Into<String>) -> Self {
        self.label_attribute = Some(label.into());
        self.rebuild_accessor();
        self
    }

    /// Set an explicit dotted label path.
    pub fn with_label_path(mut self, path: impl Into<String>) -> Self {
        self.label_attribute_path = Some(path.into());
        self.rebuild_accessor();
        self
    }

    /// Dotted path used to derive a label, if any.
    ///
    /// Defaults to `attribute_name.label_attribute` when only a label
    /// attribute is declared.
    pub fn label_path(&self) -> Option<String> {
        match (&self.label_attribute_path, &self.label_attribute) {
            (Some(path), _) if !path.is_empty() => Some(path.clone()),
            (_, Some(label)) => Some(format!("{}.{}", self.attribute_name, label)),
            _ => None,
        }
    }

    /// Label attribute, falling back to the last hop of the label path.
    pub fn label_attribute(&self) -> Option<String> {
        self.label_attribute.clone().or_else(|| {
            self.label_path()
                .and_then(|p| p.rsplit('.').next().map(str::to_string))
        })
    }

    /// Display name of the owning entity, once attached.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Roles admitted by both this attribute and its owning entity.
    pub fn effective_roles(&self) -> &RoleSet {
        &self.effective_roles
    }

    /// Check if this attribute is visible for the given purpose.
    pub fn is_visible_for(&self, purpose: Purpose) -> bool {
        self.scope.includes(purpose)
    }

    /// Getter for this attribute's value on a result row.
    pub fn accessor(&self) -> &AttributeAccessor {
        &self.accessor
    }

    /// Attach to the owning entity.
    pub(crate) fn bind_owner(&mut self, owner: &str, owner_roles: &RoleSet) {
        self.owner = Some(owner.to_string());
        self.effective_roles = self.roles.restricted_by(owner_roles);
    }

    fn rebuild_accessor(&mut self) {
        self.accessor = AttributeAccessor::new(&self.attribute_name, self.label_path().as_deref());
    }
}

/// Precompiled getter for an attribute value on a result row.
///
/// Holds the row field to read and the label hops to follow from there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeAccessor {
    field: String,
    label_hops: Option<Vec<String>>,
}

impl AttributeAccessor {
    fn new(attribute_name: &str, label_path: Option<&str>) -> Self {
        // The first hop of a label path is the attribute itself.
        let label_hops = label_path.map(|path| {
            path.split('.')
                .skip(1)
                .filter(|hop| !hop.is_empty())
                .map(str::to_string)
                .collect()
        });
        Self {
            field: attribute_name.to_string(),
            label_hops,
        }
    }

    /// Row field this accessor reads.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Remaining label hops, if a label path is declared.
    pub fn label_hops(&self) -> Option<&[String]> {
        self.label_hops.as_deref()
    }

    /// Read the raw attribute value from a row.
    pub fn read(&self, record: &dyn Record) -> Option<FieldValue> {
        record.field(&self.field)
    }
}
