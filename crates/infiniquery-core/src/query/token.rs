//! Logical query tokens and the executable query envelope.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a logical query token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalItemKind {
    #[serde(rename = "findKeyword")]
    FindKeyword,
    #[serde(rename = "havingKeyword")]
    HavingKeyword,
    #[serde(rename = "openBracket")]
    OpenBracket,
    #[serde(rename = "closeBracket")]
    CloseBracket,
    #[serde(rename = "entityName")]
    EntityName,
    #[serde(rename = "entityAttributeName")]
    AttributeName,
    #[serde(rename = "operatorKeyword")]
    OperatorKeyword,
    #[serde(rename = "entityAttributeValue")]
    AttributeValue,
    #[serde(rename = "conditionSeparatorKeyword")]
    ConditionSeparator,
}

impl fmt::Display for LogicalItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalItemKind::FindKeyword => "find keyword",
            LogicalItemKind::HavingKeyword => "having keyword",
            LogicalItemKind::OpenBracket => "open bracket",
            LogicalItemKind::CloseBracket => "close bracket",
            LogicalItemKind::EntityName => "entity name",
            LogicalItemKind::AttributeName => "attribute name",
            LogicalItemKind::OperatorKeyword => "operator",
            LogicalItemKind::AttributeValue => "attribute value",
            LogicalItemKind::ConditionSeparator => "condition separator",
        };
        f.write_str(name)
    }
}

/// One token of a logical query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalQueryItem {
    #[serde(rename = "type")]
    pub kind: LogicalItemKind,
    pub display_value: String,
}

impl LogicalQueryItem {
    /// Create a token.
    pub fn new(kind: LogicalItemKind, display_value: impl Into<String>) -> Self {
        Self {
            kind,
            display_value: display_value.into(),
        }
    }

    pub fn find(keyword: impl Into<String>) -> Self {
        Self::new(LogicalItemKind::FindKeyword, keyword)
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(LogicalItemKind::EntityName, name)
    }

    pub fn having() -> Self {
        Self::new(LogicalItemKind::HavingKeyword, "having")
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self::new(LogicalItemKind::AttributeName, name)
    }

    pub fn operator(alias: impl Into<String>) -> Self {
        Self::new(LogicalItemKind::OperatorKeyword, alias)
    }

    pub fn value(literal: impl Into<String>) -> Self {
        Self::new(LogicalItemKind::AttributeValue, literal)
    }

    pub fn separator(alias: impl Into<String>) -> Self {
        Self::new(LogicalItemKind::ConditionSeparator, alias)
    }

    pub fn open_bracket() -> Self {
        Self::new(LogicalItemKind::OpenBracket, "(")
    }

    pub fn close_bracket() -> Self {
        Self::new(LogicalItemKind::CloseBracket, ")")
    }
}

/// A compiled store-native query.
///
/// Placeholders in `query` pair left to right with `params`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub query: String,
    pub params: Vec<Value>,
}

/// A logical query and, once compiled, its store-native form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableQuery {
    pub tokens: Vec<LogicalQueryItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiled: Option<CompiledQuery>,
}

impl ExecutableQuery {
    /// Create an uncompiled query.
    pub fn new(tokens: Vec<LogicalQueryItem>) -> Self {
        Self {
            tokens,
            compiled: None,
        }
    }

    /// Check if the query has been compiled.
    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    /// Display name of the first entity token, if any.
    pub fn entity_name(&self) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| t.kind == LogicalItemKind::EntityName)
            .map(|t| t.display_value.as_str())
    }
}
