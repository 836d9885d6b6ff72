//! Literal parsers keyed by value-type tag.
//!
//! Text, temporal and relationship literals are handled by the compiler
//! directly. Every other value type must have a parser registered here;
//! a type without one fails at catalog load.

use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Parses a literal display string into a typed value.
pub type LiteralParser = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// Registry of literal parsers.
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<String, LiteralParser>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Create a registry with parsers for the built-in scalar types.
    pub fn with_builtins() -> Self {
        Self::empty()
            .register("boolean", |s| parse_bool(s).map(Value::Bool))
            .register("int16", |s| parse_number::<i16>(s).map(Value::Int16))
            .register("int32", |s| parse_number::<i32>(s).map(Value::Int32))
            .register("int64", |s| parse_number::<i64>(s).map(Value::Int64))
            .register("float32", |s| parse_number::<f32>(s).map(Value::Float32))
            .register("float64", |s| parse_number::<f64>(s).map(Value::Float64))
    }

    /// Register a parser for a value-type tag, replacing any existing one.
    pub fn register<F>(mut self, tag: impl Into<String>, parser: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.parsers.insert(tag.into(), Arc::new(parser));
        self
    }

    /// Get the parser for a tag.
    pub fn get(&self, tag: &str) -> Option<&LiteralParser> {
        self.parsers.get(tag)
    }

    /// Check if a parser is registered for a tag.
    pub fn contains(&self, tag: &str) -> bool {
        self.parsers.contains_key(tag)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("ParserRegistry").field("tags", &tags).finish()
    }
}

fn parse_number<T>(s: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    s.trim().parse::<T>().map_err(|e| e.to_string())
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected true or false, got {:?}", other)),
    }
}
