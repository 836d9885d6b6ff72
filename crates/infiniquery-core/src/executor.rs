//! Query executor boundary.
//!
//! The store driver lives outside this crate. It receives compiled query
//! strings with positional parameters and hands back rows that expose
//! named-field access.

use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A raw row or nested record returned by the store.
pub trait Record: fmt::Debug + Send + Sync {
    /// Read a field by attribute name.
    fn field(&self, name: &str) -> Option<FieldValue>;
}

/// A field read from a [`Record`].
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Plain scalar value.
    Scalar(Value),
    /// To-one relationship.
    Record(Arc<dyn Record>),
    /// To-many relationship.
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Get the scalar value, if this is one.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FieldValue::Scalar(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::Scalar(value)
    }
}

/// A row as returned by the executor.
pub type Row = Arc<dyn Record>;

/// Error surfaced by the store boundary.
#[derive(Debug, Error)]
#[error("query execution failed: {message}")]
pub struct ExecutorError {
    /// Driver-provided message.
    pub message: String,
}

impl ExecutorError {
    /// Create a new executor error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Executes compiled queries against the data store.
pub trait QueryExecutor: Send + Sync {
    /// Execute a compiled query with positional parameters.
    fn execute(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, ExecutorError>;

    /// Execute a catalog-declared reference query (no parameters).
    fn execute_reference_query(&self, query: &str) -> Result<Vec<Row>, ExecutorError> {
        self.execute(query, &[])
    }
}

/// In-memory record keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct MapRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl MapRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar field.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .insert(name.into(), FieldValue::Scalar(value.into()));
        self
    }

    /// Set a null field.
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldValue::Scalar(Value::Null));
        self
    }

    /// Set a to-one relationship field.
    pub fn with_record(mut self, name: impl Into<String>, record: MapRecord) -> Self {
        self.fields
            .insert(name.into(), FieldValue::Record(Arc::new(record)));
        self
    }

    /// Set a to-many relationship field.
    pub fn with_list(mut self, name: impl Into<String>, records: impl IntoIterator<Item = MapRecord>) -> Self {
        let items = records
            .into_iter()
            .map(|r| FieldValue::Record(Arc::new(r)))
            .collect();
        self.fields.insert(name.into(), FieldValue::List(items));
        self
    }

    /// Wrap into a row.
    pub fn into_row(self) -> Row {
        Arc::new(self)
    }
}

impl Record for MapRecord {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.fields.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyExecutor;

    impl QueryExecutor for EmptyExecutor {
        fn execute(&self, _query: &str, params: &[Value]) -> Result<Vec<Row>, ExecutorError> {
            if params.is_empty() {
                Ok(vec![MapRecord::new().with_value("name", "ref").into_row()])
            } else {
                Err(ExecutorError::new("unexpected params"))
            }
        }
    }

    #[test]
    fn test_map_record_fields() {
        let record = MapRecord::new()
            .with_value("name", "Alice")
            .with_null("nickname")
            .with_record("department", MapRecord::new().with_value("name", "R&D"))
            .with_list("projects", vec![MapRecord::new(), MapRecord::new()]);

        assert_eq!(
            record.field("name").unwrap().as_scalar(),
            Some(&Value::from("Alice"))
        );
        assert_eq!(
            record.field("nickname").unwrap().as_scalar(),
            Some(&Value::Null)
        );
        assert!(matches!(record.field("department"), Some(FieldValue::Record(_))));
        assert!(matches!(record.field("projects"), Some(FieldValue::List(items)) if items.len() == 2));
        assert!(record.field("missing").is_none());
    }

    #[test]
    fn test_reference_query_defaults_to_execute() {
        let rows = EmptyExecutor.execute_reference_query("SELECT d FROM Department d").unwrap();
        assert_eq!(rows.len(), 1);

        let err = EmptyExecutor.execute("q", &[Value::Int32(1)]).unwrap_err();
        assert!(err.to_string().contains("unexpected params"));
    }
}
