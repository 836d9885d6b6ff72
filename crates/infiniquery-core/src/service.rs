//! Caller-facing query service.
//!
//! `QueryService` ties the catalog, access gate, compiler, executor and
//! materializer together. Every operation works on one catalog snapshot,
//! so a concurrent reload never changes the catalog under a running call.

use crate::catalog::{Catalog, CatalogSource, EntityAttribute, Purpose, QueryableEntity, SharedCatalog};
use crate::error::{Error, Result};
use crate::executor::{FieldValue, QueryExecutor};
use crate::query::{CompiledQuery, ExecutableQuery, QueryCompiler};
use crate::registry::{applicable_operators, input_control, ConditionSeparatorKeyword, EntityAttributeOperator};
use crate::results::{materialize, AttributeOrder, MaterializeError, PossibleValuesView, QueryResultsView};
use crate::security::{AccessGate, CallerContext};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Service configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    /// Attribute order within result records.
    pub attribute_order: AttributeOrder,
}

impl ServiceOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the result attribute order.
    pub fn with_attribute_order(mut self, order: AttributeOrder) -> Self {
        self.attribute_order = order;
        self
    }
}

/// Entry point for listing, compiling and executing logical queries.
pub struct QueryService {
    catalog: SharedCatalog,
    source: Box<dyn CatalogSource>,
    /// Held across load and swap so reloads apply in call order.
    reload_lock: Mutex<()>,
    executor: Arc<dyn QueryExecutor>,
    options: ServiceOptions,
}

impl QueryService {
    /// Load the initial catalog from `source` and create the service.
    pub fn new(source: impl CatalogSource + 'static, executor: Arc<dyn QueryExecutor>) -> Result<Self> {
        let catalog = SharedCatalog::new(source.load()?)?;
        Ok(Self {
            catalog,
            source: Box::new(source),
            reload_lock: Mutex::new(()),
            executor,
            options: ServiceOptions::default(),
        })
    }

    /// Set service options.
    pub fn with_options(mut self, options: ServiceOptions) -> Self {
        self.options = options;
        self
    }

    /// Current catalog snapshot.
    pub fn catalog(&self) -> Result<Arc<Catalog>> {
        Ok(self.catalog.snapshot()?)
    }

    /// Caller-facing alias of the find keyword.
    pub fn find_keyword(&self) -> Result<String> {
        Ok(self.catalog()?.find_keyword.clone())
    }

    /// Display names of the entities the caller may query.
    pub fn entity_names(&self, caller: &CallerContext) -> Result<Vec<String>> {
        let catalog = self.catalog()?;
        Ok(catalog
            .entities()
            .iter()
            .filter(|e| AccessGate::check_entity(e, caller).is_ok())
            .map(|e| e.display_name.clone())
            .collect())
    }

    /// Display names of the query attributes of an entity the caller may use.
    pub fn attribute_names(&self, caller: &CallerContext, entity: &str) -> Result<Vec<String>> {
        let catalog = self.catalog()?;
        let entity = lookup_entity(&catalog, entity, caller)?;
        Ok(entity
            .attributes_for(Purpose::Query)
            .filter(|a| AccessGate::check_attribute(a, caller).is_ok())
            .map(|a| a.display_name.clone())
            .collect())
    }

    /// Display names of the operators applicable to an attribute.
    pub fn operator_names(&self, caller: &CallerContext, entity: &str, attribute: &str) -> Result<Vec<String>> {
        let catalog = self.catalog()?;
        let entity = lookup_entity(&catalog, entity, caller)?;
        let attribute = lookup_attribute(entity, attribute, caller)?;
        Ok(applicable_operators(&attribute.value_type)
            .iter()
            .map(|op| op.display_name().to_string())
            .collect())
    }

    /// Display names of the condition separators.
    pub fn condition_separator_names(&self) -> Vec<String> {
        ConditionSeparatorKeyword::ALL
            .iter()
            .map(|s| s.display_name().to_string())
            .collect()
    }

    /// Reference value labels and input hint for an attribute and operator.
    pub fn possible_values(
        &self,
        caller: &CallerContext,
        entity: &str,
        attribute: &str,
        operator: &str,
    ) -> Result<PossibleValuesView> {
        let catalog = self.catalog()?;
        let entity = lookup_entity(&catalog, entity, caller)?;
        let attribute = lookup_attribute(entity, attribute, caller)?;
        let operator = EntityAttributeOperator::resolve(operator)
            .ok_or_else(|| Error::UnknownOperator(operator.to_string()))?;

        let control = input_control(&attribute.value_type, operator);
        let values = match &attribute.possible_values_query {
            Some(query) => Some(self.reference_labels(entity, attribute, query)?),
            None => None,
        };

        Ok(PossibleValuesView { control, values })
    }

    /// Check access and compile a logical query.
    ///
    /// The compiled form is stored on `query` and also returned. Compiling
    /// again always starts from the tokens and replaces any earlier form; a
    /// failed compilation clears it.
    pub fn compile_query(&self, caller: &CallerContext, query: &mut ExecutableQuery) -> Result<CompiledQuery> {
        let catalog = self.catalog()?;
        self.compile_with(&catalog, caller, query)
    }

    /// Check access, compile, execute and materialize a logical query.
    pub fn execute_query(&self, caller: &CallerContext, query: &mut ExecutableQuery) -> Result<QueryResultsView> {
        let catalog = self.catalog()?;
        let compiled = self.compile_with(&catalog, caller, query)?;

        // Compilation succeeded, so the entity token resolves.
        let entity = query
            .entity_name()
            .and_then(|name| catalog.entity(name))
            .ok_or(crate::query::CompileError::MissingEntityToken)?;

        let rows = self.executor.execute(&compiled.query, &compiled.params)?;
        debug!(entity = %entity.display_name, rows = rows.len(), "Executed query");

        Ok(materialize(&rows, entity, caller, self.options.attribute_order)?)
    }

    /// Reload the catalog from its source.
    ///
    /// On failure the service stops serving until a reload succeeds.
    /// Concurrent reloads are serialized.
    pub fn reload_catalog(&self) -> Result<u64> {
        let _guard = self.reload_lock.lock();
        let loaded = self
            .source
            .load()
            .and_then(|catalog| self.catalog.replace(catalog));

        match loaded {
            Ok(version) => {
                info!(version, "Catalog reloaded");
                Ok(version)
            }
            Err(e) => {
                warn!(error = %e, "Catalog reload failed");
                self.catalog.mark_failed(e.to_string());
                Err(e.into())
            }
        }
    }

    fn compile_with(
        &self,
        catalog: &Catalog,
        caller: &CallerContext,
        query: &mut ExecutableQuery,
    ) -> Result<CompiledQuery> {
        query.compiled = None;
        AccessGate::check_tokens(&query.tokens, catalog, caller)?;
        let compiled = QueryCompiler::new(catalog).compile(&query.tokens, caller)?;
        query.compiled = Some(compiled.clone());
        Ok(compiled)
    }

    fn reference_labels(
        &self,
        entity: &QueryableEntity,
        attribute: &EntityAttribute,
        query: &str,
    ) -> Result<Vec<String>> {
        let label = attribute.label_attribute().unwrap_or_default();
        let rows = self.executor.execute_reference_query(query)?;

        let labels = rows
            .iter()
            .map(|row| match row.field(&label) {
                Some(FieldValue::Scalar(value)) => Ok(value.to_string()),
                Some(_) => Err(MaterializeError::UnexpectedRowShape {
                    entity: entity.display_name.clone(),
                    attribute: attribute.display_name.clone(),
                    reason: format!("reference label {} is not a scalar", label),
                }),
                None => Err(MaterializeError::MissingField {
                    entity: entity.display_name.clone(),
                    attribute: attribute.display_name.clone(),
                    field: label.clone(),
                }),
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(attribute = %attribute.display_name, values = labels.len(), "Loaded possible values");
        Ok(labels)
    }
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("catalog", &self.catalog)
            .field("options", &self.options)
            .finish()
    }
}

fn lookup_entity<'a>(catalog: &'a Catalog, name: &str, caller: &CallerContext) -> Result<&'a QueryableEntity> {
    let entity = catalog
        .entity(name)
        .ok_or_else(|| Error::UnknownEntity(name.to_string()))?;
    AccessGate::check_entity(entity, caller)?;
    Ok(entity)
}

fn lookup_attribute<'a>(
    entity: &'a QueryableEntity,
    name: &str,
    caller: &CallerContext,
) -> Result<&'a EntityAttribute> {
    let attribute = entity
        .attribute(name, Purpose::Query)
        .ok_or_else(|| Error::UnknownAttribute {
            entity: entity.display_name.clone(),
            attribute: name.to_string(),
        })?;
    AccessGate::check_attribute(attribute, caller)?;
    Ok(attribute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ValueType;
    use crate::executor::{ExecutorError, MapRecord, Row};
    use crate::registry::UserInputControlType;
    use crate::value::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DepartmentsExecutor;

    impl QueryExecutor for DepartmentsExecutor {
        fn execute(&self, _query: &str, _params: &[Value]) -> std::result::Result<Vec<Row>, ExecutorError> {
            Ok(vec![
                MapRecord::new().with_value("name", "R&D").into_row(),
                MapRecord::new().with_value("name", "Sales").into_row(),
            ])
        }
    }

    fn service() -> QueryService {
        let catalog = Catalog::new("find")
            .with_entity(
                QueryableEntity::new("Employee", "Employee")
                    .with_attribute(EntityAttribute::new("name", "Name", ValueType::Text))
                    .with_attribute(EntityAttribute::new("age", "Age", ValueType::Int32).with_roles("hr"))
                    .with_attribute(
                        EntityAttribute::new("department", "Department", ValueType::Reference("Department".into()))
                            .with_possible_values_query("SELECT d FROM Department d")
                            .with_label_attribute("name"),
                    ),
            )
            .with_entity(QueryableEntity::new("Payroll", "Payroll").with_roles("hr"));
        QueryService::new(catalog, Arc::new(DepartmentsExecutor)).unwrap()
    }

    #[test]
    fn test_listing_respects_roles() {
        let service = service();
        let guest = CallerContext::new(["guest"]);
        let hr = CallerContext::new(["HR"]);

        assert_eq!(service.find_keyword().unwrap(), "find");
        assert_eq!(service.entity_names(&guest).unwrap(), vec!["Employee"]);
        assert_eq!(service.entity_names(&hr).unwrap(), vec!["Employee", "Payroll"]);
        assert_eq!(
            service.attribute_names(&guest, "Employee").unwrap(),
            vec!["Name", "Department"]
        );
        assert!(matches!(
            service.attribute_names(&guest, "Payroll"),
            Err(Error::Access(_))
        ));
        assert!(matches!(
            service.attribute_names(&guest, "Robot"),
            Err(Error::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_operator_and_separator_names() {
        let service = service();
        let hr = CallerContext::new(["hr"]);

        assert_eq!(
            service.operator_names(&hr, "Employee", "Name").unwrap(),
            vec!["=", "like", "in"]
        );
        assert_eq!(
            service.operator_names(&hr, "Employee", "Age").unwrap(),
            vec!["=", "greater than", "lower than", "greater than or equal to", "lower than or equal to"]
        );
        assert_eq!(service.condition_separator_names(), vec!["and", "or"]);
    }

    #[test]
    fn test_possible_values() {
        let service = service();
        let caller = CallerContext::anonymous();

        let view = service
            .possible_values(&caller, "Employee", "Department", "in")
            .unwrap();
        assert_eq!(
            view.control,
            Some(UserInputControlType::ReferenceDataInputMultipleValues)
        );
        assert_eq!(view.values, Some(vec!["R&D".to_string(), "Sales".to_string()]));

        let view = service.possible_values(&caller, "Employee", "Name", "=").unwrap();
        assert_eq!(view.control, Some(UserInputControlType::FreeTextInputSingleValue));
        assert!(view.values.is_none());

        assert!(matches!(
            service.possible_values(&caller, "Employee", "Name", "~"),
            Err(Error::UnknownOperator(_))
        ));
        assert!(matches!(
            service.possible_values(&caller, "Employee", "Age", "="),
            Err(Error::Access(_))
        ));
    }

    /// Source that records how many loads overlap.
    struct OverlapSource {
        in_flight: Arc<AtomicUsize>,
        max_seen: Arc<AtomicUsize>,
    }

    impl CatalogSource for OverlapSource {
        fn load(&self) -> crate::catalog::CatalogResult<Catalog> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(10));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Catalog::new("find").with_entity(QueryableEntity::new("Employee", "Employee")))
        }
    }

    #[test]
    fn test_concurrent_reloads_are_serialized() {
        let max_seen = Arc::new(AtomicUsize::new(0));
        let source = OverlapSource {
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_seen: max_seen.clone(),
        };
        let service = QueryService::new(source, Arc::new(DepartmentsExecutor)).unwrap();
        max_seen.store(0, Ordering::SeqCst);

        let mut versions: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| service.reload_catalog().unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        versions.sort_unstable();

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(versions, vec![2, 3, 4, 5]);
        assert_eq!(service.find_keyword().unwrap(), "find");
    }
}
