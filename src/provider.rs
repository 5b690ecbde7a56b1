//! The InfluxDB v2 provider.
//!
//! [`InfluxDbV2Provider`] owns the client handle built at configure time and
//! routes every call to the resource or data source registered under the
//! requested type name.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{info, instrument};

use crate::client::{ClientError, HttpClient, InfluxClient};
use crate::config::ProviderConfig;
use crate::data_sources::{self, DataSource};
use crate::error::ProviderError;
use crate::resources::{self, Resource};
use crate::schema::{Attribute, Diagnostic, ProviderSchema, Schema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult, ProviderMetadata};
use crate::validation;

/// Provider type name; every resource type name starts with it.
pub const TYPE_NAME: &str = "influxdbv2";

/// Builds the client handle from resolved configuration.
pub type ClientFactory =
    dyn Fn(&ProviderConfig) -> Result<Arc<dyn InfluxClient>, ClientError> + Send + Sync;

fn http_client(config: &ProviderConfig) -> Result<Arc<dyn InfluxClient>, ClientError> {
    let client = HttpClient::new(&config.host, config.api_key.clone())?;
    Ok(Arc::new(client))
}

/// Provider for InfluxDB v2 organizations and buckets.
pub struct InfluxDbV2Provider {
    version: String,
    factory: Box<ClientFactory>,
    client: RwLock<Option<Arc<dyn InfluxClient>>>,
    resources: BTreeMap<&'static str, Box<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Box<dyn DataSource>>,
}

impl std::fmt::Debug for InfluxDbV2Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxDbV2Provider")
            .field("version", &self.version)
            .field("configured", &self.is_configured())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl InfluxDbV2Provider {
    /// Create a provider that talks to the configured host over HTTP.
    pub fn new(version: impl Into<String>) -> Self {
        Self::with_client_factory(version, http_client)
    }

    /// Create a provider that builds its client with `factory` on configure.
    ///
    /// Tests use this to hand the provider a [`crate::client::MemoryClient`].
    pub fn with_client_factory<F>(version: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ProviderConfig) -> Result<Arc<dyn InfluxClient>, ClientError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            version: version.into(),
            factory: Box::new(factory),
            client: RwLock::new(None),
            resources: resources::all()
                .into_iter()
                .map(|r| (r.type_name(), r))
                .collect(),
            data_sources: data_sources::all()
                .into_iter()
                .map(|d| (d.type_name(), d))
                .collect(),
        }
    }

    /// True once configure has succeeded.
    pub fn is_configured(&self) -> bool {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    fn client(&self) -> Result<Arc<dyn InfluxClient>, ProviderError> {
        self.client
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or_else(|| {
                ProviderError::Configuration(
                    "provider is not configured, call configure before using resources"
                        .to_string(),
                )
            })
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| {
                ProviderError::UnknownResource(format!("Unknown resource type: {}", resource_type))
            })
    }

    fn data_source(&self, data_source_type: &str) -> Result<&dyn DataSource, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(|d| d.as_ref())
            .ok_or_else(|| {
                ProviderError::UnknownResource(format!(
                    "Unknown data source type: {}",
                    data_source_type
                ))
            })
    }

    fn provider_schema() -> Schema {
        Schema::v0()
            .with_description("Manage organizations and buckets of an InfluxDB v2 server.")
            .with_attribute(
                "host",
                Attribute::optional_string().with_description(
                    "URL of the InfluxDB server, e.g. http://localhost:8086. \
                     May also be provided via the INFLUXDBV2_HOST environment variable.",
                ),
            )
            .with_attribute(
                "api_key",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(
                        "API token for the InfluxDB server. \
                         May also be provided via the INFLUXDBV2_API_KEY environment variable.",
                    ),
            )
    }
}

#[async_trait::async_trait]
impl ProviderService for InfluxDbV2Provider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(Self::provider_schema());
        for (name, resource) in &self.resources {
            schema = schema.with_resource(*name, resource.schema());
        }
        for (name, data_source) in &self.data_sources {
            schema = schema.with_data_source(*name, data_source.schema());
        }
        schema
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            type_name: TYPE_NAME.to_string(),
            version: self.version.clone(),
            resources: self.resources.keys().map(|k| k.to_string()).collect(),
            data_sources: self.data_sources.keys().map(|k| k.to_string()).collect(),
        }
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validation::validate(&Self::provider_schema(), &config))
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config = match ProviderConfig::from_value(&config) {
            Ok(config) => config,
            Err(diagnostics) => return Ok(diagnostics),
        };

        let client = match (self.factory)(&config) {
            Ok(client) => client,
            Err(e) => {
                return Ok(vec![Diagnostic::error("Unable to Create InfluxDB API Client")
                    .with_detail(e.to_string())
                    .with_attribute("host")]);
            },
        };

        *self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(client);
        info!(host = %config.host, "configured InfluxDB client");
        Ok(vec![])
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.resource(resource_type)?.validate(&config))
    }

    #[instrument(skip(self, prior_state, proposed_state, _config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(resources::plan_change(
            &resource.schema(),
            prior_state.as_ref(),
            &proposed_state,
        ))
    }

    #[instrument(skip(self, planned_state))]
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client()?;
        resource.create(client.as_ref(), planned_state).await
    }

    #[instrument(skip(self, current_state))]
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client()?;
        resource.read(client.as_ref(), current_state).await
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client()?;
        resource
            .update(client.as_ref(), prior_state, planned_state)
            .await
    }

    #[instrument(skip(self, current_state))]
    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client()?;
        resource.delete(client.as_ref(), current_state).await
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let client = self.client()?;
        let state = resource.import(client.as_ref(), id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.data_source(data_source_type)?.validate(&config))
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let client = self.client()?;
        data_source.read(client.as_ref(), config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryClient;
    use serde_json::json;

    fn provider() -> InfluxDbV2Provider {
        let memory = Arc::new(MemoryClient::new());
        InfluxDbV2Provider::with_client_factory("test", move |_| {
            Ok(memory.clone() as Arc<dyn InfluxClient>)
        })
    }

    #[test]
    fn test_metadata() {
        let metadata = InfluxDbV2Provider::new("0.1.0").metadata();
        assert_eq!(metadata.type_name, "influxdbv2");
        assert_eq!(metadata.version, "0.1.0");
        assert_eq!(
            metadata.resources,
            vec!["influxdbv2_bucket", "influxdbv2_organization"]
        );
        assert_eq!(metadata.data_sources, vec!["influxdbv2_organization"]);
    }

    #[test]
    fn test_schema_marks_api_key_sensitive() {
        let schema = InfluxDbV2Provider::new("0.1.0").schema();
        assert!(schema.provider.block.attributes["api_key"].flags.sensitive);
        assert!(!schema.provider.block.attributes["host"].flags.sensitive);
        assert!(schema.resources["influxdbv2_bucket"]
            .block
            .blocks
            .contains_key("retention_rules"));
    }

    #[tokio::test]
    async fn test_calls_before_configure_fail() {
        let provider = provider();
        let err = provider
            .create("influxdbv2_organization", json!({"name": "firstorg"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let provider = provider();
        let err = provider
            .read("influxdbv2_user", json!({"id": "1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_configure_rejects_unknown_host() {
        let provider = InfluxDbV2Provider::new("0.1.0");
        let diagnostics = provider
            .configure(json!({"host": crate::config::UNKNOWN_VALUE, "api_key": "token"}))
            .await
            .unwrap();
        assert_eq!(diagnostics[0].summary, "Unknown InfluxDB API Host");
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_configure_rejects_bad_url() {
        let provider = InfluxDbV2Provider::new("0.1.0");
        let diagnostics = provider
            .configure(json!({"host": "localhost:8086", "api_key": "token"}))
            .await
            .unwrap();
        assert_eq!(diagnostics[0].summary, "Unable to Create InfluxDB API Client");
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn test_configure_then_stop() {
        let provider = provider();
        let diagnostics = provider
            .configure(json!({"host": "http://localhost:8086"}))
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
        assert!(provider.is_configured());

        provider.stop().await.unwrap();
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_debug_does_not_leak_client() {
        let debug = format!("{:?}", provider());
        assert!(debug.contains("configured: false"));
    }
}
