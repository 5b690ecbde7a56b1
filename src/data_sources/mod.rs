//! Read-only lookups.

pub mod organization;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::InfluxClient;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};
use crate::validation;

pub use organization::OrganizationDataSource;

/// A lookup of an existing remote entity.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// The full type name, e.g. `influxdbv2_organization`.
    fn type_name(&self) -> &'static str;

    /// Attribute declarations for this data source.
    fn schema(&self) -> Schema;

    /// Check a configuration against the schema.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Resolve the configuration into the full state.
    async fn read(&self, client: &dyn InfluxClient, config: Value)
        -> Result<Value, ProviderError>;
}

/// Every data source the provider serves.
pub fn all() -> Vec<Box<dyn DataSource>> {
    vec![Box::new(OrganizationDataSource)]
}
