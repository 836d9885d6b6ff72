//! Operator and input-control registries.

mod controls;
mod operators;

pub use controls::{applicable_operators, input_control, UserInputControlType};
pub use operators::{ConditionSeparatorKeyword, EntityAttributeOperator, OperatorArity};
