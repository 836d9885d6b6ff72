//! Compilation errors.

use thiserror::Error;

/// Error compiling a logical token sequence.
///
/// `position` is the zero-based index of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// No entity with this display name.
    #[error("unknown entity {name:?} at token {position}")]
    UnknownEntity { name: String, position: usize },

    /// No queryable attribute with this display name on the entity.
    #[error("unknown attribute {name:?} on entity {entity} at token {position}")]
    UnknownAttribute {
        entity: String,
        name: String,
        position: usize,
    },

    /// The operator alias does not resolve.
    #[error("unknown operator {alias:?} at token {position}")]
    UnknownOperator { alias: String, position: usize },

    /// The separator alias does not resolve.
    #[error("unknown condition separator {alias:?} at token {position}")]
    UnknownSeparator { alias: String, position: usize },

    /// No literal parser exists for the attribute's value type.
    #[error("unsupported value type {value_type} for attribute {attribute}")]
    UnsupportedValueType { attribute: String, value_type: String },

    /// The literal does not parse as the attribute's value type.
    #[error("cannot parse {literal:?} as {value_type} for attribute {attribute}: {reason}")]
    MalformedLiteral {
        attribute: String,
        value_type: String,
        literal: String,
        reason: String,
    },

    /// The token sequence has no entity name.
    #[error("query does not name an entity")]
    MissingEntityToken,

    /// A value token appears before any attribute token.
    #[error("value {literal:?} at token {position} does not follow an attribute")]
    MissingAttributeToken { literal: String, position: usize },

    /// The entity's additional filter needs a scope attribute the caller lacks.
    #[error("additional filter of entity {entity} needs scope attribute {name:?}")]
    MissingScopeAttribute { entity: String, name: String },

    /// A relationship attribute has no usable label path.
    #[error("attribute {attribute} has no usable label path")]
    InvalidLabelPath { attribute: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompileError::UnknownAttribute {
            entity: "Employee".to_string(),
            name: "Shoe Size".to_string(),
            position: 3,
        };
        assert_eq!(
            err.to_string(),
            "unknown attribute \"Shoe Size\" on entity Employee at token 3"
        );

        let err = CompileError::MalformedLiteral {
            attribute: "Hired".to_string(),
            value_type: "date".to_string(),
            literal: "2015-03-21".to_string(),
            reason: "input contains invalid characters".to_string(),
        };
        assert!(err.to_string().contains("2015-03-21"));
    }
}
