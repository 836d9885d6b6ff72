//! Infiniquery Core - Role-aware query compilation and result materialization.
//!
//! Callers describe a filter as a sequence of logical tokens
//! (`find Employee having Department = Engineering`). This crate checks the
//! caller's roles against the schema catalog, compiles the tokens into a
//! parameterized store-native query, hands it to a [`QueryExecutor`], and
//! turns the returned rows into labeled result records.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod query;
pub mod registry;
pub mod results;
pub mod security;
pub mod service;
pub mod value;

pub use catalog::{
    AttributeScope, Catalog, CatalogError, CatalogSource, EntityAttribute, JsonCatalogSource,
    ParserRegistry, Purpose, QueryableEntity, RoleSet, SharedCatalog, ValueType,
};
pub use error::{Error, Result};
pub use executor::{ExecutorError, FieldValue, MapRecord, QueryExecutor, Record, Row};
pub use query::{CompileError, CompiledQuery, ExecutableQuery, LogicalItemKind, LogicalQueryItem, QueryCompiler};
pub use registry::{ConditionSeparatorKeyword, EntityAttributeOperator, OperatorArity, UserInputControlType};
pub use results::{AttributeOrder, MaterializeError, PossibleValuesView, QueryResultItem, QueryResultsView};
pub use security::{AccessDenied, AccessGate, CallerContext, SubjectKind};
pub use service::{QueryService, ServiceOptions};
pub use value::Value;
