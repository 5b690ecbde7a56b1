//! Test harness for driving a [`ProviderService`] without a host.
//!
//! # Example
//!
//! ```
//! use influxdbv2_provider::testing::{memory_provider, ProviderTester};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let (provider, _server) = memory_provider();
//! let tester = ProviderTester::new(provider);
//! tester.configure(json!({"host": "http://localhost:8086"})).await.unwrap();
//!
//! let state = tester
//!     .lifecycle_create("influxdbv2_organization", json!({"name": "firstorg"}))
//!     .await
//!     .unwrap();
//! assert_eq!(state["status"], "active");
//! # });
//! ```

use std::sync::Arc;

use crate::client::{InfluxClient, MemoryClient};
use crate::error::ProviderError;
use crate::provider::InfluxDbV2Provider;
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use serde_json::Value;

/// A provider whose client is an in-memory server, plus a handle to that
/// server for inspecting what the provider did.
pub fn memory_provider() -> (InfluxDbV2Provider, Arc<MemoryClient>) {
    let server = Arc::new(MemoryClient::new());
    let handle = Arc::clone(&server);
    let provider = InfluxDbV2Provider::with_client_factory(env!("CARGO_PKG_VERSION"), move |_| {
        Ok(Arc::clone(&handle) as Arc<dyn InfluxClient>)
    });
    (provider, server)
}

/// Wraps a `ProviderService` and exposes each call with test-friendly
/// signatures: diagnostics become `Err`, and lifecycle helpers chain
/// plan, apply and read the way the host does.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration.
    ///
    /// Returns `Ok(())` if validation passes (no error diagnostics).
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    ///
    /// Returns `Ok(())` if configuration succeeds.
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a resource creation (no prior state).
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    /// Plan a resource update.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    /// Plan a resource deletion.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Full plan operation with explicit config.
    pub async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, prior_state, proposed_state, config)
            .await
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    /// Validate a data source configuration.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Read data from a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Plan, create, then read back. Returns the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self.plan_create(resource_type, config).await?;
        let created_state = self
            .create(resource_type, plan_result.planned_state)
            .await?;
        self.read(resource_type, created_state).await
    }

    /// Plan, update, then read back. Returns the state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<Value, ProviderError> {
        let plan_result = self
            .plan_update(resource_type, prior_state.clone(), proposed_state)
            .await?;
        let updated_state = self
            .update(resource_type, prior_state, plan_result.planned_state)
            .await?;
        self.read(resource_type, updated_state).await
    }

    /// Plan the delete, then delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Create, update, then delete. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created_state = self.lifecycle_create(resource_type, initial_config).await?;
        let updated_state = self
            .lifecycle_update(resource_type, created_state.clone(), updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated_state.clone())
            .await?;

        Ok(updated_state)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// The operation failed with diagnostics.
    #[error("{}", render_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

fn render_diagnostics(diags: &[Diagnostic]) -> String {
    let mut out = format!("Operation failed with {} diagnostic(s):\n", diags.len());
    for diag in diags {
        out.push_str(&format!("  [{:?}] {}", diag.severity, diag.summary));
        if let Some(detail) = &diag.detail {
            out.push_str(&format!(": {}", detail));
        }
        if let Some(attr) = &diag.attribute {
            out.push_str(&format!(" (at {})", attr));
        }
        out.push('\n');
    }
    out
}

/// Check diagnostics and return an error if there are any errors.
fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a plan result indicates the resource will be created.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(
        !plan.requires_replace,
        "Expected plan to create, not replace"
    );
}

/// Assert that a plan result indicates no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan result indicates changes are needed.
///
/// # Panics
///
/// Panics if the plan has no changes.
pub fn assert_plan_has_changes(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes, but got no changes"
    );
}

/// Assert that a plan does not require resource replacement.
///
/// # Panics
///
/// Panics if the plan requires replacement.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

/// Assert that a plan has a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan does not have a change for the given path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        has_change,
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan does not have a change for a specific attribute path.
///
/// # Panics
///
/// Panics if the plan has a change for the given path.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    let has_change = plan.changes.iter().any(|c| c.path == path);
    assert!(
        !has_change,
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(has_errors(diagnostics), "Expected at least one error, but got none");
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| d.is_error() && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ORG: &str = "influxdbv2_organization";

    async fn configured() -> (ProviderTester<InfluxDbV2Provider>, Arc<MemoryClient>) {
        let (provider, server) = memory_provider();
        let tester = ProviderTester::new(provider);
        tester
            .configure(json!({"host": "http://localhost:8086", "api_key": "token"}))
            .await
            .unwrap();
        (tester, server)
    }

    #[tokio::test]
    async fn test_tester_schema_and_types() {
        let (tester, _) = configured().await;
        assert!(tester.schema().resources.contains_key(ORG));
        assert!(tester.resource_types().contains(&"influxdbv2_bucket".to_string()));
        assert_eq!(tester.data_source_types(), vec![ORG.to_string()]);
    }

    #[tokio::test]
    async fn test_tester_configure_reports_diagnostics() {
        let (provider, _) = memory_provider();
        let tester = ProviderTester::new(provider);
        let err = tester
            .configure(json!({"host": "${var.host}"}))
            .await
            .unwrap_err();
        match err {
            TestError::Diagnostics(diags) => {
                assert_error_contains(&diags, "Unknown InfluxDB API Host")
            },
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_tester_plan_create() {
        let (tester, _) = configured().await;
        let plan = tester
            .plan_create(ORG, json!({"name": "firstorg"}))
            .await
            .unwrap();

        assert_plan_creates(&plan);
        assert_plan_changes_attribute(&plan, "name");
        assert!(plan.planned_state["id"].is_null());
    }

    #[tokio::test]
    async fn test_tester_plan_update() {
        let (tester, _) = configured().await;
        let state = tester
            .lifecycle_create(ORG, json!({"name": "firstorg"}))
            .await
            .unwrap();

        let plan = tester
            .plan_update(ORG, state.clone(), json!({"name": "renamed"}))
            .await
            .unwrap();
        assert_plan_has_changes(&plan);
        assert_plan_changes_attribute(&plan, "name");
        assert_plan_does_not_change_attribute(&plan, "description");
        assert_plan_updates_in_place(&plan);
        assert_eq!(plan.planned_state["id"], state["id"]);

        let plan = tester
            .plan_update(ORG, state.clone(), json!({"name": "firstorg"}))
            .await
            .unwrap();
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud() {
        let (tester, server) = configured().await;
        let final_state = tester
            .lifecycle_crud(
                ORG,
                json!({"name": "initial"}),
                json!({"name": "updated", "description": "renamed"}),
            )
            .await
            .unwrap();

        assert_eq!(final_state["name"], "updated");
        assert_eq!(final_state["description"], "renamed");
        assert!(server.organizations().is_empty());
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_has_errors() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_has_errors(&diagnostics);
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("Missing InfluxDB API Host").with_attribute("host"),
            Diagnostic::error("Unknown InfluxDB API Key").with_detail("unresolved value"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("Missing InfluxDB API Host"));
        assert!(display.contains("Unknown InfluxDB API Key"));
        assert!(display.contains("(at host)"));
        assert!(display.contains("unresolved value"));
    }
}
