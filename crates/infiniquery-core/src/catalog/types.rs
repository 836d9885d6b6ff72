//! Core type definitions for the catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Reserved role value meaning "no restriction".
pub const WILDCARD_ROLE: &str = "ALL";

/// Declared value type of an entity attribute.
///
/// The compiler picks the literal parser from this tag, and the operator and
/// control registries are keyed on its [`ValueKind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    /// UTF-8 text.
    Text,
    /// Boolean flag.
    Boolean,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Date and time with second precision.
    Timestamp,
    /// Calendar date.
    Date,
    /// To-one relationship to another record type.
    Reference(String),
    /// To-many relationship to another record type.
    Collection(String),
    /// Application-defined type, parsed by a registered literal parser.
    Custom(String),
}

/// Coarse classification of a [`ValueType`], used as a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Number,
    Boolean,
    Timestamp,
    Date,
    Relationship,
    Custom,
}

impl ValueType {
    /// Registry tag of this type.
    ///
    /// Custom types use their declared name as the tag.
    pub fn tag(&self) -> &str {
        match self {
            ValueType::Text => "text",
            ValueType::Boolean => "boolean",
            ValueType::Int16 => "int16",
            ValueType::Int32 => "int32",
            ValueType::Int64 => "int64",
            ValueType::Float32 => "float32",
            ValueType::Float64 => "float64",
            ValueType::Timestamp => "timestamp",
            ValueType::Date => "date",
            ValueType::Reference(_) => "reference",
            ValueType::Collection(_) => "collection",
            ValueType::Custom(name) => name,
        }
    }

    /// Classify this type.
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueType::Text => ValueKind::Text,
            ValueType::Boolean => ValueKind::Boolean,
            ValueType::Int16
            | ValueType::Int32
            | ValueType::Int64
            | ValueType::Float32
            | ValueType::Float64 => ValueKind::Number,
            ValueType::Timestamp => ValueKind::Timestamp,
            ValueType::Date => ValueKind::Date,
            ValueType::Reference(_) | ValueType::Collection(_) => ValueKind::Relationship,
            ValueType::Custom(_) => ValueKind::Custom,
        }
    }

    /// Check if reaching a label on this type requires a join.
    pub fn is_relationship(&self) -> bool {
        self.kind() == ValueKind::Relationship
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Reference(target) => write!(f, "reference<{}>", target),
            ValueType::Collection(target) => write!(f, "collection<{}>", target),
            other => f.write_str(other.tag()),
        }
    }
}

/// Purpose an attribute is looked up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Referenced from a logical query.
    Query,
    /// Projected into result records.
    Results,
}

/// Where an attribute is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttributeScope {
    /// Usable in filters only.
    #[serde(rename = "query-only")]
    QueryOnly,
    /// Shown in results only.
    #[serde(rename = "results-only")]
    ResultsOnly,
    /// Usable in filters and shown in results.
    #[default]
    #[serde(rename = "both")]
    Both,
}

impl AttributeScope {
    /// Check if an attribute with this scope is visible for the given purpose.
    pub fn includes(self, purpose: Purpose) -> bool {
        match (self, purpose) {
            (AttributeScope::Both, _) => true,
            (AttributeScope::QueryOnly, Purpose::Query) => true,
            (AttributeScope::ResultsOnly, Purpose::Results) => true,
            _ => false,
        }
    }
}

/// Roles allowed to access an entity or attribute.
///
/// Role names are stored upper-cased so comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoleSet {
    /// Anyone may access.
    #[default]
    Unrestricted,
    /// Only callers holding at least one of these roles may access.
    /// An empty set admits nobody.
    Restricted(BTreeSet<String>),
}

impl RoleSet {
    /// Build a role set from individual role names.
    ///
    /// No roles, or the wildcard role among them, yields [`RoleSet::Unrestricted`].
    pub fn from_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let roles: BTreeSet<String> = roles
            .into_iter()
            .map(|r| r.as_ref().trim().to_uppercase())
            .filter(|r| !r.is_empty())
            .collect();

        if roles.is_empty() || roles.contains(WILDCARD_ROLE) {
            RoleSet::Unrestricted
        } else {
            RoleSet::Restricted(roles)
        }
    }

    /// Parse a comma-separated role list, e.g. `"admin, hr"`.
    pub fn parse(roles: &str) -> Self {
        Self::from_roles(roles.split(','))
    }

    /// Check if this set places no restriction.
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, RoleSet::Unrestricted)
    }

    /// Check if a caller holding `caller_roles` (upper-cased) is admitted.
    pub fn admits(&self, caller_roles: &BTreeSet<String>) -> bool {
        match self {
            RoleSet::Unrestricted => true,
            RoleSet::Restricted(allowed) => !allowed.is_disjoint(caller_roles),
        }
    }

    /// Combine with the owner's role set.
    ///
    /// An unrestricted side defers to the other side; two restricted sets
    /// intersect.
    pub fn restricted_by(&self, owner: &RoleSet) -> RoleSet {
        match (self, owner) {
            (RoleSet::Unrestricted, other) | (other, RoleSet::Unrestricted) => other.clone(),
            (RoleSet::Restricted(own), RoleSet::Restricted(theirs)) => {
                RoleSet::Restricted(own.intersection(theirs).cloned().collect())
            }
        }
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleSet::Unrestricted => f.write_str(WILDCARD_ROLE),
            RoleSet::Restricted(roles) => {
                let joined: Vec<&str> = roles.iter().map(String::as_str).collect();
                f.write_str(&joined.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_uppercase()).collect()
    }

    #[test]
    fn test_value_type_kinds() {
        assert_eq!(ValueType::Text.kind(), ValueKind::Text);
        assert_eq!(ValueType::Float32.kind(), ValueKind::Number);
        assert_eq!(
            ValueType::Reference("Department".into()).kind(),
            ValueKind::Relationship
        );
        assert!(ValueType::Collection("Project".into()).is_relationship());
        assert!(!ValueType::Date.is_relationship());
        assert_eq!(ValueType::Custom("money".into()).tag(), "money");
    }

    #[test]
    fn test_value_type_json() {
        let t: ValueType = serde_json::from_str(r#""timestamp""#).unwrap();
        assert_eq!(t, ValueType::Timestamp);

        let t: ValueType = serde_json::from_str(r#"{"reference":"Department"}"#).unwrap();
        assert_eq!(t, ValueType::Reference("Department".into()));
    }

    #[test]
    fn test_scope_visibility() {
        assert!(AttributeScope::Both.includes(Purpose::Query));
        assert!(AttributeScope::Both.includes(Purpose::Results));
        assert!(AttributeScope::QueryOnly.includes(Purpose::Query));
        assert!(!AttributeScope::QueryOnly.includes(Purpose::Results));
        assert!(!AttributeScope::ResultsOnly.includes(Purpose::Query));

        let s: AttributeScope = serde_json::from_str(r#""results-only""#).unwrap();
        assert_eq!(s, AttributeScope::ResultsOnly);
    }

    #[test]
    fn test_role_set_parse() {
        assert!(RoleSet::parse("").is_unrestricted());
        assert!(RoleSet::parse(" , ").is_unrestricted());
        assert!(RoleSet::parse("admin, all").is_unrestricted());
        assert_eq!(
            RoleSet::parse("admin, Hr"),
            RoleSet::Restricted(roles(&["ADMIN", "HR"]))
        );
    }

    #[test]
    fn test_role_set_admits() {
        let set = RoleSet::parse("Admin");
        assert!(set.admits(&roles(&["admin"])));
        assert!(!set.admits(&roles(&["guest"])));
        assert!(!set.admits(&BTreeSet::new()));
        assert!(RoleSet::Unrestricted.admits(&BTreeSet::new()));
    }

    #[test]
    fn test_restricted_by_owner() {
        let attr = RoleSet::parse("ADMIN");
        assert_eq!(attr.restricted_by(&RoleSet::Unrestricted), attr);
        assert_eq!(RoleSet::Unrestricted.restricted_by(&attr), attr);

        let owner = RoleSet::parse("ADMIN, HR");
        assert_eq!(attr.restricted_by(&owner), RoleSet::parse("ADMIN"));

        let disjoint = RoleSet::parse("HR").restricted_by(&RoleSet::parse("ADMIN"));
        assert_eq!(disjoint, RoleSet::Restricted(BTreeSet::new()));
        assert!(!disjoint.admits(&roles(&["ADMIN", "HR"])));
    }
}
