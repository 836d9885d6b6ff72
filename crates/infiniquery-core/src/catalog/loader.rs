//! Catalog loading from JSON configuration.
//!
//! ```json
//! {
//!   "findKeyword": "find",
//!   "entities": [{
//!     "typeId": "Employee",
//!     "displayName": "Employee",
//!     "roles": "admin, hr",
//!     "attributes": [{
//!       "attributeName": "department",
//!       "displayName": "Department",
//!       "valueType": { "reference": "Department" },
//!       "possibleValuesQuery": "SELECT d FROM Department d",
//!       "possibleValueLabelAttribute": "name"
//!     }]
//!   }]
//! }
//! ```

use super::attribute::EntityAttribute;
use super::catalog::Catalog;
use super::entity::QueryableEntity;
use super::error::{CatalogError, CatalogResult};
use super::parser::ParserRegistry;
use super::types::{AttributeScope, ValueType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Something that can produce a fresh catalog snapshot.
pub trait CatalogSource: Send + Sync {
    /// Load and build a catalog.
    fn load(&self) -> CatalogResult<Catalog>;
}

/// A prebuilt catalog reloads as itself.
impl CatalogSource for Catalog {
    fn load(&self) -> CatalogResult<Catalog> {
        Ok(self.clone())
    }
}

/// Top-level catalog document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogConfig {
    #[serde(default)]
    pub find_keyword: String,
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

/// Entity entry of a catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityConfig {
    pub type_id: String,
    pub display_name: String,
    #[serde(default)]
    pub roles: Option<String>,
    #[serde(default)]
    pub additional_filter: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,
}

/// Attribute entry of a catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeConfig {
    pub attribute_name: String,
    pub display_name: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub roles: Option<String>,
    #[serde(default)]
    pub scope: AttributeScope,
    #[serde(default)]
    pub possible_values_query: Option<String>,
    #[serde(default)]
    pub possible_value_label_attribute: Option<String>,
    #[serde(default)]
    pub possible_value_label_attribute_path: Option<String>,
}

impl CatalogConfig {
    /// Build a catalog from this document using the given literal parsers.
    pub fn into_catalog(self, parsers: ParserRegistry) -> Catalog {
        let entities = self.entities.into_iter().map(EntityConfig::into_entity);
        Catalog::new(self.find_keyword)
            .with_parsers(parsers)
            .with_entities(entities)
    }
}

impl EntityConfig {
    fn into_entity(self) -> QueryableEntity {
        let mut entity = QueryableEntity::new(self.type_id, self.display_name)
            .with_attributes(self.attributes.into_iter().map(AttributeConfig::into_attribute));
        if let Some(roles) = self.roles {
            entity = entity.with_roles(&roles);
        }
        if let Some(filter) = self.additional_filter.filter(|f| !f.trim().is_empty()) {
            entity = entity.with_additional_filter(filter);
        }
        entity
    }
}

impl AttributeConfig {
    fn into_attribute(self) -> EntityAttribute {
        let mut attr = EntityAttribute::new(self.attribute_name, self.display_name, self.value_type)
            .with_scope(self.scope);
        if let Some(roles) = self.roles {
            attr = attr.with_roles(&roles);
        }
        if let Some(query) = self.possible_values_query.filter(|q| !q.trim().is_empty()) {
            attr = attr.with_possible_values_query(query);
        }
        if let Some(label) = self.possible_value_label_attribute.filter(|l| !l.is_empty()) {
            attr = attr.with_label_attribute(label);
        }
        if let Some(path) = self.possible_value_label_attribute_path.filter(|p| !p.is_empty()) {
            attr = attr.with_label_path(path);
        }
        attr
    }
}

impl Catalog {
    /// Parse and validate a catalog from a JSON document.
    pub fn from_json_str(json: &str, parsers: ParserRegistry) -> CatalogResult<Self> {
        let config: CatalogConfig = serde_json::from_str(json)?;
        let catalog = config.into_catalog(parsers);
        catalog.validate()?;
        Ok(catalog)
    }
}

/// Loads the catalog from a JSON file on every call.
#[derive(Debug, Clone)]
pub struct JsonCatalogSource {
    path: PathBuf,
    parsers: ParserRegistry,
}

impl JsonCatalogSource {
    /// Create a source reading the given file with the built-in parsers.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            parsers: ParserRegistry::with_builtins(),
        }
    }

    /// Use a custom parser registry.
    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    /// Path of the catalog file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonCatalogSource {
    fn load(&self) -> CatalogResult<Catalog> {
        debug!(path = %self.path.display(), "Reading catalog");
        let json = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        Catalog::from_json_str(&json, self.parsers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{Purpose, RoleSet};

    const DOC: &str = r#"{
        "findKeyword": "find",
        "entities": [{
            "typeId": "com.acme.Employee",
            "displayName": "Employee",
            "roles": "admin, hr",
            "additionalFilter": "x.tenant = :tenant",
            "attributes": [
                { "attributeName": "name", "displayName": "Name", "valueType": "text" },
                {
                    "attributeName": "salary",
                    "displayName": "Salary",
                    "valueType": "float64",
                    "roles": "admin",
                    "scope": "results-only"
                },
                {
                    "attributeName": "department",
                    "displayName": "Department",
                    "valueType": { "reference": "Department" },
                    "possibleValuesQuery": "SELECT d FROM Department d",
                    "possibleValueLabelAttribute": "name"
                }
            ]
        }]
    }"#;

    #[test]
    fn test_from_json_str() {
        let catalog = Catalog::from_json_str(DOC, ParserRegistry::default()).unwrap();
        assert_eq!(catalog.find_keyword, "find");

        let employee = catalog.entity("Employee").unwrap();
        assert_eq!(employee.type_id, "com.acme.Employee");
        assert_eq!(employee.roles, RoleSet::parse("ADMIN,HR"));
        assert_eq!(employee.additional_filter.as_deref(), Some("x.tenant = :tenant"));
        assert_eq!(employee.attributes().len(), 3);

        let salary = employee.attribute("Salary", Purpose::Results).unwrap();
        assert_eq!(salary.effective_roles(), &RoleSet::parse("ADMIN"));
        assert!(employee.attribute("Salary", Purpose::Query).is_none());

        let dept = employee.attribute("Department", Purpose::Query).unwrap();
        assert_eq!(dept.label_path().as_deref(), Some("department.name"));
    }

    #[test]
    fn test_missing_find_keyword() {
        let err = Catalog::from_json_str(r#"{ "entities": [] }"#, ParserRegistry::default()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingFindKeyword));
    }

    #[test]
    fn test_malformed_document() {
        let err = Catalog::from_json_str("{ not json", ParserRegistry::default()).unwrap_err();
        assert!(matches!(err, CatalogError::Json(_)));
    }

    #[test]
    fn test_json_source_missing_file() {
        let source = JsonCatalogSource::new("/nonexistent/catalog.json");
        assert!(matches!(source.load(), Err(CatalogError::Io { .. })));
    }
}
