//! Role-based access checks for entities and attributes.

use super::context::CallerContext;
use super::error::{AccessDenied, SubjectKind};
use crate::catalog::{Catalog, EntityAttribute, Purpose, QueryableEntity};
use crate::query::{LogicalItemKind, LogicalQueryItem};
use tracing::warn;

/// Checks caller roles against catalog role sets.
///
/// Role matching is case-insensitive. An unrestricted role set admits
/// every caller, including one without roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl AccessGate {
    /// Check access to an entity.
    pub fn check_entity(entity: &QueryableEntity, caller: &CallerContext) -> Result<(), AccessDenied> {
        if entity.roles.admits(&caller.roles) {
            Ok(())
        } else {
            Err(Self::deny(SubjectKind::Entity, entity.display_name.clone(), caller))
        }
    }

    /// Check access to an attribute, including its owner's roles.
    pub fn check_attribute(attribute: &EntityAttribute, caller: &CallerContext) -> Result<(), AccessDenied> {
        if attribute.effective_roles().admits(&caller.roles) {
            Ok(())
        } else {
            let alias = match attribute.owner() {
                Some(owner) => format!("{}.{}", owner, attribute.display_name),
                None => attribute.display_name.clone(),
            };
            Err(Self::deny(SubjectKind::Attribute, alias, caller))
        }
    }

    /// Check every entity and attribute referenced by a token sequence.
    ///
    /// Stops at the first violation. Tokens that do not resolve against the
    /// catalog are left for the compiler to reject.
    pub fn check_tokens(
        tokens: &[LogicalQueryItem],
        catalog: &Catalog,
        caller: &CallerContext,
    ) -> Result<(), AccessDenied> {
        let mut current: Option<&QueryableEntity> = None;

        for token in tokens {
            match token.kind {
                LogicalItemKind::EntityName => {
                    current = catalog.entity(&token.display_value);
                    if let Some(entity) = current {
                        Self::check_entity(entity, caller)?;
                    }
                }
                LogicalItemKind::AttributeName => {
                    let attribute = current.and_then(|e| e.attribute(&token.display_value, Purpose::Query));
                    if let Some(attribute) = attribute {
                        Self::check_attribute(attribute, caller)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn deny(subject_kind: SubjectKind, subject_alias: String, caller: &CallerContext) -> AccessDenied {
        warn!(
            subject = %subject_alias,
            kind = %subject_kind,
            roles = %caller.role_list(),
            "Access denied"
        );
        AccessDenied {
            subject_kind,
            subject_alias,
            caller_roles: caller.role_list(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ValueType;

    fn catalog() -> Catalog {
        Catalog::new("find")
            .with_entity(
                QueryableEntity::new("Employee", "Employee")
                    .with_roles("admin, hr, guest")
                    .with_attribute(EntityAttribute::new("name", "Name", ValueType::Text))
                    .with_attribute(
                        EntityAttribute::new("salary", "Salary", ValueType::Float64).with_roles("admin"),
                    ),
            )
            .with_entity(QueryableEntity::new("Audit", "Audit").with_roles("admin"))
    }

    #[test]
    fn test_entity_access() {
        let catalog = catalog();
        let audit = catalog.entity("Audit").unwrap();

        assert!(AccessGate::check_entity(audit, &CallerContext::new(["Admin"])).is_ok());

        let err = AccessGate::check_entity(audit, &CallerContext::new(["guest"])).unwrap_err();
        assert_eq!(err.subject_kind, SubjectKind::Entity);
        assert_eq!(err.subject_alias, "Audit");
        assert_eq!(err.caller_roles, "GUEST");
    }

    #[test]
    fn test_unrestricted_admits_anonymous() {
        let entity = QueryableEntity::new("Public", "Public")
            .with_attribute(EntityAttribute::new("title", "Title", ValueType::Text));
        let caller = CallerContext::anonymous();

        assert!(AccessGate::check_entity(&entity, &caller).is_ok());
        assert!(AccessGate::check_attribute(&entity.attributes()[0], &caller).is_ok());
    }

    #[test]
    fn test_check_tokens_fails_fast() {
        let catalog = catalog();
        let tokens = vec![
            LogicalQueryItem::find("find"),
            LogicalQueryItem::entity("Employee"),
            LogicalQueryItem::having(),
            LogicalQueryItem::attribute("Name"),
            LogicalQueryItem::operator("="),
            LogicalQueryItem::value("Bob"),
            LogicalQueryItem::separator("and"),
            LogicalQueryItem::attribute("Salary"),
            LogicalQueryItem::operator(">"),
            LogicalQueryItem::value("100"),
        ];

        AccessGate::check_tokens(&tokens, &catalog, &CallerContext::new(["admin"])).unwrap();

        let err = AccessGate::check_tokens(&tokens, &catalog, &CallerContext::new(["guest"])).unwrap_err();
        assert_eq!(err.subject_kind, SubjectKind::Attribute);
        assert_eq!(err.subject_alias, "Employee.Salary");
    }

    #[test]
    fn test_check_tokens_skips_unknown() {
        let tokens = vec![
            LogicalQueryItem::entity("Nobody"),
            LogicalQueryItem::attribute("Whatever"),
        ];
        assert!(AccessGate::check_tokens(&tokens, &catalog(), &CallerContext::anonymous()).is_ok());
    }
}
