//! `influxdbv2_organization` resource.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{decode, encode, format_timestamp, non_empty, require_id, Resource};
use crate::client::{InfluxClient, Organization};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Type name exposed to the host.
pub const TYPE_NAME: &str = "influxdbv2_organization";

/// Organization state as stored by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationModel {
    /// Organization name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Server-assigned id.
    pub id: Option<String>,
    /// `active` or `inactive`.
    pub status: Option<String>,
    /// Creation time, RFC 3339.
    pub created_at: Option<String>,
    /// Last update time, RFC 3339.
    pub updated_at: Option<String>,
}

impl OrganizationModel {
    /// The record sent on create and update.
    pub fn to_remote(&self) -> Organization {
        Organization {
            id: self.id.clone(),
            name: self.name.clone(),
            description: non_empty(&self.description),
            ..Default::default()
        }
    }

    /// Overwrite every field from a server response.
    pub fn refresh(&mut self, org: &Organization) {
        self.id = org.id.clone();
        self.name = org.name.clone();
        self.description = org.description.clone();
        self.status = org.status.map(|s| s.to_string());
        self.created_at = format_timestamp(org.created_at);
        self.updated_at = format_timestamp(org.updated_at);
    }

    /// Build state from a server response.
    pub fn from_remote(org: &Organization) -> Self {
        let mut model = Self::default();
        model.refresh(org);
        model
    }
}

/// Fail with not-found when a lookup returned a record without an id.
fn ensure_found(org: Organization, name: &str, id: &str) -> Result<Organization, ProviderError> {
    match org.id.as_deref() {
        Some(found) if !found.is_empty() => Ok(org),
        _ => Err(ProviderError::NotFound(format!(
            "Could not read organization {} with ID {}: organization not found",
            name, id
        ))),
    }
}

/// Manages InfluxDB organizations.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationResource;

#[async_trait]
impl Resource for OrganizationResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Create and manage organizations.")
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name of the organization."),
            )
            .with_attribute(
                "description",
                Attribute::optional_string()
                    .with_description("The description of the organization."),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The organization ID."),
            )
            .with_attribute(
                "status",
                Attribute::computed_string()
                    .with_description("The status of the organization, active or inactive."),
            )
            .with_attribute(
                "created_at",
                Attribute::computed_string()
                    .with_description("Organization creation date, RFC 3339."),
            )
            .with_attribute(
                "updated_at",
                Attribute::computed_string()
                    .with_description("Last organization update date, RFC 3339."),
            )
    }

    async fn create(
        &self,
        client: &dyn InfluxClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let mut model: OrganizationModel = decode(planned)?;

        let created = client
            .create_organization(&model.to_remote())
            .await
            .map_err(|e| {
                ProviderError::remote(format!("Error creating organization {}", model.name), e)
            })?;

        model.refresh(&created);
        debug!(id = ?model.id, name = %model.name, "created organization");
        encode(&model)
    }

    async fn read(
        &self,
        client: &dyn InfluxClient,
        current: Value,
    ) -> Result<Value, ProviderError> {
        let mut model: OrganizationModel = decode(current)?;
        let id = require_id(&model.id, "organization")?.to_string();

        let org = client.find_organization_by_id(&id).await.map_err(|e| {
            ProviderError::remote(
                format!("Could not read organization {} with ID {}", model.name, id),
                e,
            )
        })?;
        let org = ensure_found(org, &model.name, &id)?;

        model.refresh(&org);
        encode(&model)
    }

    async fn update(
        &self,
        client: &dyn InfluxClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior: OrganizationModel = decode(prior)?;
        let mut model: OrganizationModel = decode(planned)?;
        let id = require_id(&model.id, "organization")
            .or_else(|_| require_id(&prior.id, "organization"))?
            .to_string();

        let existing = client.find_organization_by_id(&id).await.map_err(|e| {
            ProviderError::remote(format!("Organization with ID {} not found", id), e)
        })?;
        let mut org = ensure_found(existing, &prior.name, &id)?;
        org.name = model.name.clone();
        org.description = non_empty(&model.description);

        let updated = client.update_organization(&org).await.map_err(|e| {
            ProviderError::remote(
                format!("Could not update organization {} with ID {}", model.name, id),
                e,
            )
        })?;

        model.refresh(&updated);
        debug!(id = %id, name = %model.name, "updated organization");
        encode(&model)
    }

    async fn delete(
        &self,
        client: &dyn InfluxClient,
        current: Value,
    ) -> Result<(), ProviderError> {
        let model: OrganizationModel = decode(current)?;
        let id = require_id(&model.id, "organization")?;

        client.delete_organization_with_id(id).await.map_err(|e| {
            ProviderError::remote(
                format!("Could not delete organization {} with ID {}", model.name, id),
                e,
            )
        })?;

        debug!(id = %id, name = %model.name, "deleted organization");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MemoryClient, OrganizationStatus};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_from_remote_overwrites_every_field() {
        let org = Organization {
            id: Some("0000000000000001".to_string()),
            name: "firstorg".to_string(),
            description: Some("first".to_string()),
            status: Some(OrganizationStatus::Active),
            created_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()),
            updated_at: Some(Utc.with_ymd_and_hms(2024, 3, 2, 11, 30, 0).unwrap()),
        };
        let model = OrganizationModel::from_remote(&org);

        assert_eq!(model.id.as_deref(), Some("0000000000000001"));
        assert_eq!(model.status.as_deref(), Some("active"));
        assert_eq!(model.description.as_deref(), Some("first"));
        assert_eq!(model.created_at.as_deref(), Some("2024-03-01T10:00:00Z"));
        assert_eq!(model.updated_at.as_deref(), Some("2024-03-02T11:30:00Z"));
    }

    #[test]
    fn test_state_has_every_attribute() {
        let state = encode(&OrganizationModel {
            name: "firstorg".to_string(),
            ..Default::default()
        })
        .unwrap();
        let schema = OrganizationResource.schema();
        for name in schema.block.attributes.keys() {
            assert!(state.get(name).is_some(), "missing {}", name);
        }
    }

    #[tokio::test]
    async fn test_create_then_read() {
        let client = MemoryClient::new();
        let resource = OrganizationResource;

        let created = resource
            .create(&client, json!({"name": "firstorg", "description": null}))
            .await
            .unwrap();
        assert!(!created["id"].as_str().unwrap().is_empty());
        assert_eq!(created["status"], "active");

        let read = resource.read(&client, created.clone()).await.unwrap();
        assert_eq!(read["id"], created["id"]);
    }

    #[tokio::test]
    async fn test_read_without_id_is_rejected() {
        let client = MemoryClient::new();
        let err = OrganizationResource
            .read(&client, json!({"name": "firstorg"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let client = MemoryClient::new();
        let err = OrganizationResource
            .read(&client, json!({"name": "gone", "id": "00000000000000ff"}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err
            .message()
            .contains("Could not read organization gone with ID 00000000000000ff"));
    }

    #[tokio::test]
    async fn test_update_without_description_keeps_remote_value() {
        let client = MemoryClient::new();
        let resource = OrganizationResource;
        let created = resource
            .create(&client, json!({"name": "firstorg", "description": "first"}))
            .await
            .unwrap();

        let mut planned = created.clone();
        planned["description"] = Value::Null;
        let updated = resource.update(&client, created, planned).await.unwrap();
        assert_eq!(updated["description"], "first");
    }

    #[test]
    fn test_ensure_found_rejects_empty_id() {
        let err = ensure_found(Organization::default(), "firstorg", "0001").unwrap_err();
        assert!(err.is_not_found());
    }
}
