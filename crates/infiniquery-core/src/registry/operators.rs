//! Attribute operators and condition separators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an operator takes one value or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperatorArity {
    /// A single literal.
    SingleValue,
    /// A comma-separated list of literals.
    MultiValue,
}

/// Comparison operator between an attribute and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityAttributeOperator {
    Equals,
    Like,
    In,
    GreaterThan,
    LowerThan,
    GreaterThanOrEquals,
    LowerThanOrEquals,
    Before,
    After,
}

impl EntityAttributeOperator {
    /// All operators in declaration order.
    pub const ALL: [EntityAttributeOperator; 9] = [
        Self::Equals,
        Self::Like,
        Self::In,
        Self::GreaterThan,
        Self::LowerThan,
        Self::GreaterThanOrEquals,
        Self::LowerThanOrEquals,
        Self::Before,
        Self::After,
    ];

    /// Caller-facing alias.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::Like => "like",
            Self::In => "in",
            Self::GreaterThan => "greater than",
            Self::LowerThan => "lower than",
            Self::GreaterThanOrEquals => "greater than or equal to",
            Self::LowerThanOrEquals => "lower than or equal to",
            Self::Before => "before",
            Self::After => "after",
        }
    }

    /// Store-native operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::GreaterThan | Self::After => ">",
            Self::LowerThan | Self::Before => "<",
            Self::GreaterThanOrEquals => ">=",
            Self::LowerThanOrEquals => "<=",
        }
    }

    /// Number of values the operator takes.
    pub fn arity(self) -> OperatorArity {
        match self {
            Self::In => OperatorArity::MultiValue,
            _ => OperatorArity::SingleValue,
        }
    }

    /// Resolve an operator from its display alias or its symbol.
    ///
    /// Display aliases take precedence; among symbols the first declared
    /// operator wins (`>` resolves to `GreaterThan`, not `After`).
    pub fn resolve(alias: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.display_name() == alias)
            .or_else(|| Self::ALL.iter().copied().find(|op| op.symbol() == alias))
    }
}

impl fmt::Display for EntityAttributeOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Keyword joining two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionSeparatorKeyword {
    And,
    Or,
}

impl ConditionSeparatorKeyword {
    /// All separators in declaration order.
    pub const ALL: [ConditionSeparatorKeyword; 2] = [Self::And, Self::Or];

    /// Caller-facing alias.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Store-native keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Resolve a separator from its display alias or its keyword.
    pub fn resolve(alias: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.display_name() == alias || s.keyword() == alias)
    }
}

impl fmt::Display for ConditionSeparatorKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
