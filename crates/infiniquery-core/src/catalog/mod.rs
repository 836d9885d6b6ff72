//! Schema catalog for Infiniquery.
//!
//! The catalog describes the queryable entities, their attributes, and the
//! roles allowed to see them. Snapshots are immutable; a reload swaps in a
//! whole new snapshot through [`SharedCatalog`].

mod attribute;
mod catalog;
mod entity;
mod error;
mod loader;
mod parser;
mod types;

pub use attribute::{AttributeAccessor, EntityAttribute};
pub use catalog::{Catalog, SharedCatalog};
pub use entity::QueryableEntity;
pub use error::{CatalogError, CatalogResult};
pub use loader::{AttributeConfig, CatalogConfig, CatalogSource, EntityConfig, JsonCatalogSource};
pub use parser::{LiteralParser, ParserRegistry};
pub use types::{AttributeScope, Purpose, RoleSet, ValueKind, ValueType, WILDCARD_ROLE};
