//! Type-driven parsing of attribute value literals.

use super::error::CompileError;
use crate::catalog::{EntityAttribute, ParserRegistry, ValueKind};
use crate::value::{Value, DATE_PATTERN, TIMESTAMP_PATTERN};
use chrono::{NaiveDate, NaiveDateTime};

/// A parsed literal: the placeholder fragment to emit and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLiteral {
    /// Placeholder fragment, with a leading space.
    pub fragment: String,
    /// Parameter values, one per placeholder.
    pub values: Vec<Value>,
}

impl ParsedLiteral {
    fn single(value: Value) -> Self {
        Self {
            fragment: " ?".to_string(),
            values: vec![value],
        }
    }

    fn list(values: Vec<Value>) -> Self {
        let placeholders = vec!["?"; values.len()].join(",");
        Self {
            fragment: format!(" ({})", placeholders),
            values,
        }
    }
}

/// Parse a literal against an attribute's declared value type.
///
/// Order matters: text first, then timestamp, date, relationship lists,
/// and only then the parser registry.
pub fn parse_literal(
    attribute: &EntityAttribute,
    literal: &str,
    parsers: &ParserRegistry,
) -> Result<ParsedLiteral, CompileError> {
    let value_type = &attribute.value_type;
    let malformed = |reason: String| CompileError::MalformedLiteral {
        attribute: attribute.display_name.clone(),
        value_type: value_type.to_string(),
        literal: literal.to_string(),
        reason,
    };

    match value_type.kind() {
        ValueKind::Text => Ok(ParsedLiteral::single(Value::String(literal.to_string()))),
        ValueKind::Timestamp => NaiveDateTime::parse_from_str(literal.trim(), TIMESTAMP_PATTERN)
            .map(|ts| ParsedLiteral::single(Value::Timestamp(ts)))
            .map_err(|e| malformed(e.to_string())),
        ValueKind::Date => NaiveDate::parse_from_str(literal.trim(), DATE_PATTERN)
            .map(|d| ParsedLiteral::single(Value::Date(d)))
            .map_err(|e| malformed(e.to_string())),
        ValueKind::Relationship => {
            let mut items: Vec<&str> = literal.split(',').collect();
            // Trailing empty items are dropped; a literal with no comma is one item.
            if items.len() > 1 {
                while items.last().is_some_and(|item| item.is_empty()) {
                    items.pop();
                }
            }
            if items.is_empty() {
                return Err(malformed("expected at least one value".to_string()));
            }
            Ok(ParsedLiteral::list(
                items.into_iter().map(|item| Value::String(item.to_string())).collect(),
            ))
        }
        ValueKind::Number | ValueKind::Boolean | ValueKind::Custom => {
            let parser = parsers
                .get(value_type.tag())
                .ok_or_else(|| CompileError::UnsupportedValueType {
                    attribute: attribute.display_name.clone(),
                    value_type: value_type.to_string(),
                })?;
            parser(literal).map(ParsedLiteral::single).map_err(malformed)
        }
    }
}
