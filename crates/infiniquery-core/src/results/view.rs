//! Result views handed back to callers.

use crate::registry::UserInputControlType;
use crate::value::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One result record: display-name/value pairs in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResultItem {
    values: Vec<(String, Value)>,
}

impl QueryResultItem {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing an existing one in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((name, value)),
        }
    }

    /// Get a value by display name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove a value by display name.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.values.iter().position(|(n, _)| n == name)?;
        Some(self.values.remove(index).1)
    }

    /// Display names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    /// Name/value pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Serialized as an ordered map of display strings.
impl Serialize for QueryResultItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, &value.to_string())?;
        }
        map.end()
    }
}

/// Materialized results of one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultsView {
    pub entity_name: String,
    pub items: Vec<QueryResultItem>,
}

/// Possible values and input hint for an attribute/operator pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PossibleValuesView {
    /// Input control to render, if the type has one.
    pub control: Option<UserInputControlType>,
    /// Reference value labels, if the attribute declares a query.
    pub values: Option<Vec<String>>,
}
