//! `influxdbv2_organization` data source: look up an organization by name.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::DataSource;
use crate::client::InfluxClient;
use crate::error::ProviderError;
use crate::resources::organization::{OrganizationModel, TYPE_NAME};
use crate::resources::{decode, encode};
use crate::schema::{Attribute, Schema};

/// Resolves an organization by its unique name.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationDataSource;

#[async_trait]
impl DataSource for OrganizationDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Lookup an organization by name.")
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name of the organization."),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The organization ID."),
            )
            .with_attribute(
                "description",
                Attribute::computed_string()
                    .with_description("The description of the organization."),
            )
            .with_attribute(
                "status",
                Attribute::computed_string().with_description("The status of the organization."),
            )
            .with_attribute(
                "created_at",
                Attribute::computed_string().with_description("Organization creation date."),
            )
            .with_attribute(
                "updated_at",
                Attribute::computed_string().with_description("Last organization update date."),
            )
    }

    async fn read(&self, client: &dyn InfluxClient, config: Value) -> Result<Value, ProviderError> {
        let query: OrganizationModel = decode(config)?;
        if query.name.is_empty() {
            return Err(ProviderError::Validation(
                "organization name must not be empty".to_string(),
            ));
        }

        let org = client
            .find_organization_by_name(&query.name)
            .await
            .map_err(|e| {
                ProviderError::remote(format!("Unable to find organization {}", query.name), e)
            })?;
        if org.id.as_deref().map_or(true, str::is_empty) {
            return Err(ProviderError::NotFound(format!(
                "Unable to find organization {}",
                query.name
            )));
        }

        let model = OrganizationModel::from_remote(&org);
        debug!(id = ?model.id, name = %model.name, "read organization data source");
        encode(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MemoryClient, Organization, OrganizationsApi};
    use serde_json::json;

    #[tokio::test]
    async fn test_lookup_fills_status() {
        let client = MemoryClient::new();
        client
            .create_organization(&Organization {
                name: "firstorg".to_string(),
                description: Some("first".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let state = OrganizationDataSource
            .read(&client, json!({"name": "firstorg"}))
            .await
            .unwrap();

        assert_eq!(state["status"], "active");
        assert_eq!(state["description"], "first");
        assert!(!state["id"].as_str().unwrap().is_empty());
        assert!(state["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_lookup_of_unknown_name_fails() {
        let client = MemoryClient::new();
        let err = OrganizationDataSource
            .read(&client, json!({"name": "nonexistent"}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.message().starts_with("Unable to find organization nonexistent"));
    }

    #[test]
    fn test_validate_requires_name() {
        let diagnostics = OrganizationDataSource.validate(&json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("name"));
    }
}
