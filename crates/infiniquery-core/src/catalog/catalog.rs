//! Catalog snapshots and the swappable catalog handle.

use super::entity::QueryableEntity;
use super::error::{CatalogError, CatalogResult};
use super::parser::ParserRegistry;
use super::types::ValueKind;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Immutable snapshot of the queryable schema.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Caller-facing alias of the find keyword.
    pub find_keyword: String,
    entities: Vec<QueryableEntity>,
    parsers: ParserRegistry,
}

impl Catalog {
    /// Create an empty catalog with the built-in literal parsers.
    pub fn new(find_keyword: impl Into<String>) -> Self {
        Self {
            find_keyword: find_keyword.into(),
            entities: Vec::new(),
            parsers: ParserRegistry::with_builtins(),
        }
    }

    /// Add an entity.
    pub fn with_entity(mut self, entity: QueryableEntity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add multiple entities.
    pub fn with_entities(mut self, entities: impl IntoIterator<Item = QueryableEntity>) -> Self {
        self.entities.extend(entities);
        self
    }

    /// Replace the literal parser registry.
    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    /// All entities in declaration order.
    pub fn entities(&self) -> &[QueryableEntity] {
        &self.entities
    }

    /// Get an entity by display name.
    pub fn entity(&self, display_name: &str) -> Option<&QueryableEntity> {
        self.entities.iter().find(|e| e.display_name == display_name)
    }

    /// Literal parsers for non-builtin value types.
    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    /// Check the catalog invariants.
    pub fn validate(&self) -> CatalogResult<()> {
        if self.find_keyword.trim().is_empty() {
            return Err(CatalogError::MissingFindKeyword);
        }

        let mut entity_names = HashSet::new();
        for entity in &self.entities {
            if !entity_names.insert(entity.display_name.as_str()) {
                return Err(CatalogError::DuplicateEntity(entity.display_name.clone()));
            }

            let mut attr_names = HashSet::new();
            for attr in entity.attributes() {
                if !attr_names.insert(attr.display_name.as_str()) {
                    return Err(CatalogError::DuplicateAttribute {
                        entity: entity.display_name.clone(),
                        attribute: attr.display_name.clone(),
                    });
                }

                let invalid_path = |reason: &str| CatalogError::InvalidLabelPath {
                    entity: entity.display_name.clone(),
                    attribute: attr.display_name.clone(),
                    reason: reason.to_string(),
                };

                let path = attr.label_path();
                if attr.possible_values_query.is_some() && path.is_none() {
                    return Err(invalid_path("a possible values query requires a label"));
                }

                if attr.value_type.is_relationship() {
                    let path = path.ok_or_else(|| invalid_path("relationship attributes need a label path"))?;
                    let hops: Vec<&str> = path.split('.').collect();
                    if hops.len() < 2 || hops.iter().any(|h| h.is_empty()) {
                        return Err(invalid_path("expected at least two non-empty hops"));
                    }
                    if hops[0] != attr.attribute_name {
                        return Err(invalid_path("path must start with the attribute name"));
                    }
                }

                let needs_parser = matches!(
                    attr.value_type.kind(),
                    ValueKind::Number | ValueKind::Boolean | ValueKind::Custom
                );
                if needs_parser && !self.parsers.contains(attr.value_type.tag()) {
                    return Err(CatalogError::UnsupportedValueType {
                        entity: entity.display_name.clone(),
                        attribute: attr.display_name.clone(),
                        value_type: attr.value_type.tag().to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

enum CatalogState {
    Ready(Arc<Catalog>),
    Failed(String),
}

/// Shared handle to the current catalog snapshot.
///
/// Readers take a cheap `Arc` snapshot; a reload swaps the whole snapshot
/// under the write lock, so concurrent readers never see a partial catalog.
pub struct SharedCatalog {
    state: RwLock<CatalogState>,
    version: AtomicU64,
}

impl SharedCatalog {
    /// Create a handle serving a validated catalog.
    pub fn new(catalog: Catalog) -> CatalogResult<Self> {
        catalog.validate()?;
        info!(
            entities = catalog.entities().len(),
            "Catalog loaded"
        );
        Ok(Self {
            state: RwLock::new(CatalogState::Ready(Arc::new(catalog))),
            version: AtomicU64::new(1),
        })
    }

    /// Get the current snapshot.
    pub fn snapshot(&self) -> CatalogResult<Arc<Catalog>> {
        match &*self.state.read() {
            CatalogState::Ready(catalog) => Ok(Arc::clone(catalog)),
            CatalogState::Failed(reason) => Err(CatalogError::Unavailable(reason.clone())),
        }
    }

    /// Validate and atomically install a new snapshot.
    ///
    /// Returns the new version number.
    pub fn replace(&self, catalog: Catalog) -> CatalogResult<u64> {
        catalog.validate()?;
        let entities = catalog.entities().len();
        let mut state = self.state.write();
        *state = CatalogState::Ready(Arc::new(catalog));
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        info!(version, entities, "Catalog replaced");
        Ok(version)
    }

    /// Stop serving the catalog until the next successful replace.
    pub fn mark_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(reason = %reason, "Catalog marked unavailable");
        *self.state.write() = CatalogState::Failed(reason);
    }

    /// Number of snapshots installed so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Check if a snapshot is currently served.
    pub fn is_available(&self) -> bool {
        matches!(&*self.state.read(), CatalogState::Ready(_))
    }
}

impl std::fmt::Debug for SharedCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCatalog")
            .field("version", &self.version())
            .field("available", &self.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::attribute::EntityAttribute;
    use crate::catalog::types::ValueType;
    use crate::value::Value;

    fn employee() -> QueryableEntity {
        QueryableEntity::new("Employee", "Employee")
            .with_attribute(EntityAttribute::new("name", "Name", ValueType::Text))
            .with_attribute(
                EntityAttribute::new(
                    "department",
                    "Department",
                    ValueType::Reference("Department".into()),
                )
                .with_label_attribute("name"),
            )
    }

    #[test]
    fn test_valid_catalog() {
        let catalog = Catalog::new("find").with_entity(employee());
        catalog.validate().unwrap();
        assert!(catalog.entity("Employee").is_some());
        assert!(catalog.entity("employee").is_none());
    }

    #[test]
    fn test_missing_find_keyword() {
        let catalog = Catalog::new("  ").with_entity(employee());
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::MissingFindKeyword)
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let catalog = Catalog::new("find")
            .with_entity(employee())
            .with_entity(QueryableEntity::new("Staff", "Employee"));
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::DuplicateEntity(name)) if name == "Employee"
        ));

        let entity = employee().with_attribute(EntityAttribute::new("fullName", "Name", ValueType::Text));
        let catalog = Catalog::new("find").with_entity(entity);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn test_relationship_label_path_rules() {
        let no_label = QueryableEntity::new("Employee", "Employee").with_attribute(EntityAttribute::new(
            "department",
            "Department",
            ValueType::Reference("Department".into()),
        ));
        assert!(matches!(
            Catalog::new("find").with_entity(no_label).validate(),
            Err(CatalogError::InvalidLabelPath { .. })
        ));

        let single_hop = QueryableEntity::new("Employee", "Employee").with_attribute(
            EntityAttribute::new("department", "Department", ValueType::Reference("Department".into()))
                .with_label_path("department"),
        );
        assert!(matches!(
            Catalog::new("find").with_entity(single_hop).validate(),
            Err(CatalogError::InvalidLabelPath { .. })
        ));

        let wrong_start = QueryableEntity::new("Employee", "Employee").with_attribute(
            EntityAttribute::new("department", "Department", ValueType::Reference("Department".into()))
                .with_label_path("division.name"),
        );
        assert!(matches!(
            Catalog::new("find").with_entity(wrong_start).validate(),
            Err(CatalogError::InvalidLabelPath { .. })
        ));
    }

    #[test]
    fn test_possible_values_need_label() {
        let entity = QueryableEntity::new("Employee", "Employee").with_attribute(
            EntityAttribute::new("title", "Title", ValueType::Text)
                .with_possible_values_query("SELECT t FROM Title t"),
        );
        assert!(matches!(
            Catalog::new("find").with_entity(entity).validate(),
            Err(CatalogError::InvalidLabelPath { .. })
        ));
    }

    #[test]
    fn test_custom_type_needs_parser() {
        let entity = QueryableEntity::new("Invoice", "Invoice")
            .with_attribute(EntityAttribute::new("total", "Total", ValueType::Custom("money".into())));

        let catalog = Catalog::new("find").with_entity(entity.clone());
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::UnsupportedValueType { value_type, .. }) if value_type == "money"
        ));

        let parsers = ParserRegistry::with_builtins().register("money", |s| {
            s.parse::<i64>().map(Value::Int64).map_err(|e| e.to_string())
        });
        Catalog::new("find")
            .with_entity(entity)
            .with_parsers(parsers)
            .validate()
            .unwrap();
    }

    #[test]
    fn test_shared_catalog_swap() {
        let shared = SharedCatalog::new(Catalog::new("find").with_entity(employee())).unwrap();
        assert_eq!(shared.version(), 1);

        let before = shared.snapshot().unwrap();
        let version = shared
            .replace(Catalog::new("search").with_entity(employee()))
            .unwrap();
        assert_eq!(version, 2);

        // Old snapshots stay valid for readers that hold them.
        assert_eq!(before.find_keyword, "find");
        assert_eq!(shared.snapshot().unwrap().find_keyword, "search");
    }

    #[test]
    fn test_shared_catalog_failure() {
        let shared = SharedCatalog::new(Catalog::new("find")).unwrap();
        shared.mark_failed("bad document");
        assert!(!shared.is_available());
        assert!(matches!(
            shared.snapshot(),
            Err(CatalogError::Unavailable(reason)) if reason == "bad document"
        ));

        shared.replace(Catalog::new("find")).unwrap();
        assert!(shared.snapshot().is_ok());
    }

    #[test]
    fn test_replace_rejects_invalid() {
        let shared = SharedCatalog::new(Catalog::new("find")).unwrap();
        assert!(shared.replace(Catalog::new("")).is_err());
        assert_eq!(shared.snapshot().unwrap().find_keyword, "find");
    }
}
