//! Compiler from logical tokens to a store-native query.
//!
//! The output has the shape
//!
//! ```text
//! SELECT DISTINCT x FROM Employee x LEFT JOIN x.department x1 WHERE x1.name = ?
//! ```
//!
//! The primary entity is always aliased `x`. Relationship attributes get a
//! fresh join chain (`x1`, `x2`, ...) spliced in right after the `FROM`
//! clause, wherever the attribute token appears in the filter.

use super::error::CompileError;
use super::literal::parse_literal;
use super::token::{CompiledQuery, LogicalItemKind, LogicalQueryItem};
use crate::catalog::{Catalog, EntityAttribute, Purpose, QueryableEntity};
use crate::registry::{ConditionSeparatorKeyword, EntityAttributeOperator};
use crate::security::CallerContext;
use crate::value::Value;
use tracing::debug;

/// Alias of the primary entity.
pub const ROOT_ALIAS: &str = "x";

/// Compiles token sequences against one catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct QueryCompiler<'a> {
    catalog: &'a Catalog,
}

/// Per-invocation compiler state.
struct CompileState<'a> {
    out: String,
    params: Vec<Value>,
    next_alias: usize,
    /// Where the next join chain is inserted.
    splice_at: usize,
    /// Start of the user filter, right after `WHERE`.
    filter_at: Option<usize>,
    entity: Option<&'a QueryableEntity>,
    attribute: Option<&'a EntityAttribute>,
}

impl<'a> QueryCompiler<'a> {
    /// Create a compiler for a catalog snapshot.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Compile a token sequence.
    ///
    /// The caller supplies the scope attributes bound into the entity's
    /// additional filter. Access checks are not performed here.
    pub fn compile(
        &self,
        tokens: &[LogicalQueryItem],
        caller: &CallerContext,
    ) -> Result<CompiledQuery, CompileError> {
        let mut state = CompileState {
            out: String::new(),
            params: Vec::new(),
            next_alias: 1,
            splice_at: 0,
            filter_at: None,
            entity: None,
            attribute: None,
        };

        for (position, token) in tokens.iter().enumerate() {
            debug!(position, kind = %token.kind, value = %token.display_value, "Compiling token");
            self.compile_token(&mut state, position, token)?;
        }

        let entity = state.entity.ok_or(CompileError::MissingEntityToken)?;
        if let Some(filter) = &entity.additional_filter {
            append_additional_filter(&mut state, entity, filter, caller)?;
        }

        debug!(query = %state.out, params = state.params.len(), "Compiled query");
        Ok(CompiledQuery {
            query: state.out,
            params: state.params,
        })
    }

    fn compile_token(
        &self,
        state: &mut CompileState<'a>,
        position: usize,
        token: &LogicalQueryItem,
    ) -> Result<(), CompileError> {
        let value = token.display_value.as_str();

        match token.kind {
            LogicalItemKind::FindKeyword => state.out.push_str("SELECT DISTINCT"),
            LogicalItemKind::EntityName => {
                let entity = self
                    .catalog
                    .entity(value)
                    .ok_or_else(|| CompileError::UnknownEntity {
                        name: value.to_string(),
                        position,
                    })?;
                state.out.push_str(&format!(
                    " {root} FROM {} {root}",
                    entity.type_id,
                    root = ROOT_ALIAS
                ));
                state.splice_at = state.out.len();
                state.entity = Some(entity);
            }
            LogicalItemKind::HavingKeyword => {
                state.out.push_str(" WHERE");
                state.filter_at = Some(state.out.len());
            }
            LogicalItemKind::OpenBracket => state.out.push_str(" ("),
            LogicalItemKind::CloseBracket => state.out.push_str(" )"),
            LogicalItemKind::AttributeName => {
                let entity = state.entity.ok_or(CompileError::MissingEntityToken)?;
                let attribute = entity
                    .attribute(value, Purpose::Query)
                    .ok_or_else(|| CompileError::UnknownAttribute {
                        entity: entity.display_name.clone(),
                        name: value.to_string(),
                        position,
                    })?;

                if attribute.value_type.is_relationship() {
                    emit_join_chain(state, attribute)?;
                } else {
                    state
                        .out
                        .push_str(&format!(" {}.{}", ROOT_ALIAS, attribute.attribute_name));
                }
                state.attribute = Some(attribute);
            }
            LogicalItemKind::OperatorKeyword => {
                let op = EntityAttributeOperator::resolve(value).ok_or_else(|| {
                    CompileError::UnknownOperator {
                        alias: value.to_string(),
                        position,
                    }
                })?;
                state.out.push(' ');
                state.out.push_str(op.symbol());
            }
            LogicalItemKind::AttributeValue => {
                let attribute = state
                    .attribute
                    .ok_or_else(|| CompileError::MissingAttributeToken {
                        literal: value.to_string(),
                        position,
                    })?;
                let parsed = parse_literal(attribute, value, self.catalog.parsers())?;
                state.out.push_str(&parsed.fragment);
                state.params.extend(parsed.values);
            }
            LogicalItemKind::ConditionSeparator => {
                let separator = ConditionSeparatorKeyword::resolve(value).ok_or_else(|| {
                    CompileError::UnknownSeparator {
                        alias: value.to_string(),
                        position,
                    }
                })?;
                state.out.push(' ');
                state.out.push_str(separator.keyword());
            }
        }

        Ok(())
    }
}

/// Emit one `LEFT JOIN` per label path hop except the last, splice them in
/// after the `FROM` clause and reference the label on the final alias.
fn emit_join_chain(state: &mut CompileState<'_>, attribute: &EntityAttribute) -> Result<(), CompileError> {
    let invalid = || CompileError::InvalidLabelPath {
        attribute: attribute.display_name.clone(),
    };
    let path = attribute.label_path().ok_or_else(invalid)?;
    let hops: Vec<&str> = path.split('.').collect();
    let (label, joins) = match hops.split_last() {
        Some((label, joins)) if !joins.is_empty() => (*label, joins),
        _ => return Err(invalid()),
    };

    let mut chain = String::new();
    let mut prev = ROOT_ALIAS.to_string();
    for hop in joins {
        let alias = format!("{}{}", ROOT_ALIAS, state.next_alias);
        state.next_alias += 1;
        chain.push_str(&format!(" LEFT JOIN {}.{} {}", prev, hop, alias));
        prev = alias;
    }

    state.out.insert_str(state.splice_at, &chain);
    state.splice_at += chain.len();
    if let Some(filter_at) = state.filter_at.as_mut() {
        *filter_at += chain.len();
    }

    state.out.push_str(&format!(" {}.{}", prev, label));
    Ok(())
}

/// Append the entity's additional filter, binding `:name` placeholders from
/// the caller's scope attributes.
fn append_additional_filter(
    state: &mut CompileState<'_>,
    entity: &QueryableEntity,
    filter: &str,
    caller: &CallerContext,
) -> Result<(), CompileError> {
    let (fragment, values) = bind_named_placeholders(filter, |name| {
        caller
            .scope_attribute(name)
            .cloned()
            .ok_or_else(|| CompileError::MissingScopeAttribute {
                entity: entity.display_name.clone(),
                name: name.to_string(),
            })
    })?;

    match state.filter_at {
        Some(filter_at) => {
            state.out.insert_str(filter_at, " (");
            state.out.push_str(&format!(" ) AND ( {} )", fragment));
        }
        None => state.out.push_str(&format!(" WHERE {}", fragment)),
    }
    state.params.extend(values);
    Ok(())
}

/// Replace each `:name` with `?`, resolving values in order of appearance.
///
/// Quoted spans are copied verbatim; `''` inside a quote is an escaped quote.
fn bind_named_placeholders<F>(filter: &str, mut resolve: F) -> Result<(String, Vec<Value>), CompileError>
where
    F: FnMut(&str) -> Result<Value, CompileError>,
{
    let mut out = String::with_capacity(filter.len());
    let mut values = Vec::new();
    let mut chars = filter.char_indices().peekable();
    let mut quoted = false;

    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            // An escaped quote toggles twice, so the state is unchanged.
            quoted = !quoted;
            out.push(c);
            continue;
        }

        let starts_name = !quoted
            && c == ':'
            && chars
                .peek()
                .is_some_and(|&(_, next)| next.is_ascii_alphabetic() || next == '_');
        if !starts_name {
            out.push(c);
            continue;
        }

        let start = i + 1;
        let mut end = start;
        while let Some(&(j, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        values.push(resolve(&filter[start..end])?);
        out.push('?');
    }

    Ok((out, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ValueType;
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        Catalog::new("find").with_entity(
            QueryableEntity::new("Employee", "Employee")
                .with_attribute(EntityAttribute::new("name", "Name", ValueType::Text))
                .with_attribute(EntityAttribute::new("age", "Age", ValueType::Int32))
                .with_attribute(
                    EntityAttribute::new("manager", "Manager City", ValueType::Reference("Employee".into()))
                        .with_label_path("manager.address.city"),
                ),
        )
    }

    fn compile(tokens: Vec<LogicalQueryItem>) -> Result<CompiledQuery, CompileError> {
        let catalog = catalog();
        QueryCompiler::new(&catalog).compile(&tokens, &CallerContext::anonymous())
    }

    #[test]
    fn test_entity_only() {
        let compiled = compile(vec![
            LogicalQueryItem::find("find"),
            LogicalQueryItem::entity("Employee"),
        ])
        .unwrap();
        assert_eq!(compiled.query, "SELECT DISTINCT x FROM Employee x");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_brackets_and_separators() {
        let compiled = compile(vec![
            LogicalQueryItem::find("find"),
            LogicalQueryItem::entity("Employee"),
            LogicalQueryItem::having(),
            LogicalQueryItem::open_bracket(),
            LogicalQueryItem::attribute("Age"),
            LogicalQueryItem::operator("greater than"),
            LogicalQueryItem::value("30"),
            LogicalQueryItem::separator("or"),
            LogicalQueryItem::attribute("Name"),
            LogicalQueryItem::operator("like"),
            LogicalQueryItem::value("A%"),
            LogicalQueryItem::close_bracket(),
        ])
        .unwrap();

        assert_eq!(
            compiled.query,
            "SELECT DISTINCT x FROM Employee x WHERE ( x.age > ? OR x.name LIKE ? )"
        );
        assert_eq!(compiled.params, vec![Value::Int32(30), Value::from("A%")]);
    }

    #[test]
    fn test_multi_hop_join() {
        let compiled = compile(vec![
            LogicalQueryItem::find("find"),
            LogicalQueryItem::entity("Employee"),
            LogicalQueryItem::having(),
            LogicalQueryItem::attribute("Manager City"),
            LogicalQueryItem::operator("in"),
            LogicalQueryItem::value("Oslo,Bergen"),
        ])
        .unwrap();

        assert_eq!(
            compiled.query,
            "SELECT DISTINCT x FROM Employee x LEFT JOIN x.manager x1 LEFT JOIN x1.address x2 WHERE x2.city IN (?,?)"
        );
        assert_eq!(compiled.params, vec![Value::from("Oslo"), Value::from("Bergen")]);
    }

    #[test]
    fn test_errors() {
        let err = compile(vec![LogicalQueryItem::find("find"), LogicalQueryItem::entity("Robot")]).unwrap_err();
        assert_eq!(
            err,
            CompileError::UnknownEntity {
                name: "Robot".into(),
                position: 1
            }
        );

        let err = compile(vec![LogicalQueryItem::find("find")]).unwrap_err();
        assert_eq!(err, CompileError::MissingEntityToken);

        let err = compile(vec![
            LogicalQueryItem::entity("Employee"),
            LogicalQueryItem::having(),
            LogicalQueryItem::value("x"),
        ])
        .unwrap_err();
        assert!(matches!(err, CompileError::MissingAttributeToken { position: 2, .. }));

        let err = compile(vec![
            LogicalQueryItem::entity("Employee"),
            LogicalQueryItem::having(),
            LogicalQueryItem::attribute("Age"),
            LogicalQueryItem::operator("roughly"),
        ])
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownOperator { .. }));

        let err = compile(vec![
            LogicalQueryItem::entity("Employee"),
            LogicalQueryItem::having(),
            LogicalQueryItem::attribute("Age"),
            LogicalQueryItem::operator("="),
            LogicalQueryItem::value("1"),
            LogicalQueryItem::separator("nor"),
        ])
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownSeparator { position: 5, .. }));
    }

    #[test]
    fn test_bind_named_placeholders() {
        let (fragment, values) = bind_named_placeholders("x.tenant = :tenant AND x.org <> :org_id", |name| {
            Ok(Value::from(name))
        })
        .unwrap();
        assert_eq!(fragment, "x.tenant = ? AND x.org <> ?");
        assert_eq!(values, vec![Value::from("tenant"), Value::from("org_id")]);

        let (fragment, values) = bind_named_placeholders("x.t = '10:30'", |_| Ok(Value::Null)).unwrap();
        assert_eq!(fragment, "x.t = '10:30'");
        assert!(values.is_empty());
    }

    #[test]
    fn test_named_placeholders_skip_quoted_text() {
        let filter = "x.kind <> 'type:internal' AND x.note = 'it''s :late' AND x.tenant = :tenant";
        let mut seen = Vec::new();
        let (fragment, values) = bind_named_placeholders(filter, |name| {
            seen.push(name.to_string());
            Ok(Value::Int64(7))
        })
        .unwrap();

        assert_eq!(
            fragment,
            "x.kind <> 'type:internal' AND x.note = 'it''s :late' AND x.tenant = ?"
        );
        assert_eq!(seen, vec!["tenant"]);
        assert_eq!(values, vec![Value::Int64(7)]);
        assert_eq!(fragment.matches('?').count(), values.len());
    }
}
