//! Process-wide lookup tables from value types to operators and input controls.

use super::operators::{EntityAttributeOperator, OperatorArity};
use crate::catalog::{ValueKind, ValueType};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Input control hint for a UI rendering a value prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserInputControlType {
    NumberInput,
    FreeTextInputSingleValue,
    FreeTextInputMultipleValues,
    DateInput,
    DateTimeInput,
    ReferenceDataInputSingleValue,
    ReferenceDataInputMultipleValues,
}

use EntityAttributeOperator as Op;

static OPERATORS_BY_KIND: Lazy<HashMap<ValueKind, &'static [EntityAttributeOperator]>> =
    Lazy::new(|| {
        let mut m: HashMap<ValueKind, &'static [EntityAttributeOperator]> = HashMap::new();
        m.insert(
            ValueKind::Number,
            &[
                Op::Equals,
                Op::GreaterThan,
                Op::LowerThan,
                Op::GreaterThanOrEquals,
                Op::LowerThanOrEquals,
            ],
        );
        m.insert(ValueKind::Text, &[Op::Equals, Op::Like, Op::In]);
        m.insert(ValueKind::Timestamp, &[Op::Before, Op::After, Op::Equals]);
        m.insert(ValueKind::Date, &[Op::Before, Op::After, Op::Equals]);
        m.insert(ValueKind::Relationship, &[Op::In]);
        m.insert(ValueKind::Boolean, &[Op::Equals]);
        m.insert(ValueKind::Custom, &[Op::Equals]);
        m
    });

static CONTROL_BY_KIND: Lazy<HashMap<ValueKind, UserInputControlType>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(ValueKind::Number, UserInputControlType::NumberInput);
    m.insert(ValueKind::Timestamp, UserInputControlType::DateTimeInput);
    m.insert(ValueKind::Date, UserInputControlType::DateInput);
    m
});

static CONTROL_BY_KIND_AND_ARITY: Lazy<HashMap<(ValueKind, OperatorArity), UserInputControlType>> =
    Lazy::new(|| {
        let mut m = HashMap::new();
        m.insert(
            (ValueKind::Text, OperatorArity::SingleValue),
            UserInputControlType::FreeTextInputSingleValue,
        );
        m.insert(
            (ValueKind::Text, OperatorArity::MultiValue),
            UserInputControlType::FreeTextInputMultipleValues,
        );
        m.insert(
            (ValueKind::Relationship, OperatorArity::SingleValue),
            UserInputControlType::ReferenceDataInputSingleValue,
        );
        m.insert(
            (ValueKind::Relationship, OperatorArity::MultiValue),
            UserInputControlType::ReferenceDataInputMultipleValues,
        );
        m
    });

/// Operators applicable to a value type, in presentation order.
pub fn applicable_operators(value_type: &ValueType) -> &'static [EntityAttributeOperator] {
    OPERATORS_BY_KIND
        .get(&value_type.kind())
        .copied()
        .unwrap_or(&[])
}

/// Input control hint for a value type used with an operator.
///
/// Types with a fixed control win over the (type, arity) table.
pub fn input_control(
    value_type: &ValueType,
    operator: EntityAttributeOperator,
) -> Option<UserInputControlType> {
    let kind = value_type.kind();
    CONTROL_BY_KIND
        .get(&kind)
        .or_else(|| CONTROL_BY_KIND_AND_ARITY.get(&(kind, operator.arity())))
        .copied()
}
