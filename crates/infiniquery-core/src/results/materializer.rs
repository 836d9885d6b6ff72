//! Projection of raw rows into labeled result records.

use super::view::{QueryResultItem, QueryResultsView};
use crate::catalog::{EntityAttribute, Purpose, QueryableEntity};
use crate::executor::{FieldValue, Row};
use crate::security::{AccessGate, CallerContext};
use crate::value::Value;
use thiserror::Error;
use tracing::debug;

/// Separator between labels of a to-many attribute.
pub const LABEL_SEPARATOR: &str = "; ";

/// Order in which attributes are laid out in each result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeOrder {
    /// Declaration order.
    #[default]
    Declared,
    /// Reverse declaration order.
    Reverse,
}

/// A row does not have the shape the catalog declares.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaterializeError {
    /// A field the accessor or label path reads is absent.
    #[error("row of {entity} has no field {field} for attribute {attribute}")]
    MissingField {
        entity: String,
        attribute: String,
        field: String,
    },

    /// A value is a record where a scalar was expected, or the reverse.
    #[error("unexpected value shape for {entity}.{attribute}: {reason}")]
    UnexpectedRowShape {
        entity: String,
        attribute: String,
        reason: String,
    },
}

/// Build result records for `entity` from raw rows.
///
/// Attributes are included when visible for results and admitted for the
/// caller; everything else is silently left out.
pub fn materialize(
    rows: &[Row],
    entity: &QueryableEntity,
    caller: &CallerContext,
    order: AttributeOrder,
) -> Result<QueryResultsView, MaterializeError> {
    let mut visible: Vec<&EntityAttribute> = entity
        .attributes_for(Purpose::Results)
        .filter(|attr| AccessGate::check_attribute(attr, caller).is_ok())
        .collect();
    if order == AttributeOrder::Reverse {
        visible.reverse();
    }

    let items = rows
        .iter()
        .map(|row| {
            let mut item = QueryResultItem::new();
            for attr in &visible {
                let value = display_value(row, entity, attr)?;
                item.insert(attr.display_name.clone(), value);
            }
            Ok(item)
        })
        .collect::<Result<Vec<_>, MaterializeError>>()?;

    debug!(
        entity = %entity.display_name,
        rows = items.len(),
        attributes = visible.len(),
        "Materialized results"
    );

    Ok(QueryResultsView {
        entity_name: entity.display_name.clone(),
        items,
    })
}

fn display_value(row: &Row, entity: &QueryableEntity, attr: &EntityAttribute) -> Result<Value, MaterializeError> {
    let accessor = attr.accessor();
    let raw = accessor.read(&**row).ok_or_else(|| MaterializeError::MissingField {
        entity: entity.display_name.clone(),
        attribute: attr.display_name.clone(),
        field: accessor.field().to_string(),
    })?;

    let resolver = LabelResolver { entity, attr };
    match accessor.label_hops() {
        Some(hops) => resolver.resolve(&raw, hops),
        None => match raw {
            FieldValue::Scalar(value) => Ok(value),
            _ => Err(resolver.shape("relationship value without a label path")),
        },
    }
}

struct LabelResolver<'a> {
    entity: &'a QueryableEntity,
    attr: &'a EntityAttribute,
}

impl LabelResolver<'_> {
    /// Follow `hops` from `value`; to-many hops fan out and join the
    /// non-empty leaf labels.
    fn resolve(&self, value: &FieldValue, hops: &[String]) -> Result<Value, MaterializeError> {
        match value {
            FieldValue::Scalar(Value::Null) => Ok(Value::Null),
            FieldValue::Scalar(scalar) if hops.is_empty() => Ok(scalar.clone()),
            FieldValue::Scalar(_) => Err(self.shape("scalar value before the end of the label path")),
            FieldValue::Record(record) => {
                let (hop, rest) = hops
                    .split_first()
                    .ok_or_else(|| self.shape("label path ends on a record"))?;
                let next = record.field(hop).ok_or_else(|| MaterializeError::MissingField {
                    entity: self.entity.display_name.clone(),
                    attribute: self.attr.display_name.clone(),
                    field: hop.clone(),
                })?;
                self.resolve(&next, rest)
            }
            FieldValue::List(items) => {
                let mut labels = Vec::with_capacity(items.len());
                for item in items {
                    let label = self.resolve(item, hops)?.to_string();
                    if !label.is_empty() {
                        labels.push(label);
                    }
                }
                Ok(Value::String(labels.join(LABEL_SEPARATOR)))
            }
        }
    }

    fn shape(&self, reason: &str) -> MaterializeError {
        MaterializeError::UnexpectedRowShape {
            entity: self.entity.display_name.clone(),
            attribute: self.attr.display_name.clone(),
            reason: reason.to_string(),
        }
    }
}
