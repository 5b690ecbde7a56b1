//! Managed resources.
//!
//! Each entity kind implements [`Resource`] once; the provider looks the
//! implementation up by type name and hands it the shared client. State goes
//! in and out as `serde_json::Value` and is decoded into a typed model inside
//! each resource.

pub mod bucket;
pub mod organization;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::InfluxClient;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};
use crate::types::{AttributeChange, PlanResult};
use crate::validation;

pub use bucket::BucketResource;
pub use organization::OrganizationResource;

/// A remote entity under management.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The full type name, e.g. `influxdbv2_bucket`.
    fn type_name(&self) -> &'static str;

    /// Attribute declarations for this resource.
    fn schema(&self) -> Schema;

    /// Check a configuration against the schema and any domain rules.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Create the remote entity and return the resulting state.
    async fn create(&self, client: &dyn InfluxClient, planned: Value)
        -> Result<Value, ProviderError>;

    /// Refresh state from the remote entity.
    async fn read(&self, client: &dyn InfluxClient, current: Value)
        -> Result<Value, ProviderError>;

    /// Push planned changes and return the refreshed state.
    async fn update(
        &self,
        client: &dyn InfluxClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote entity.
    async fn delete(&self, client: &dyn InfluxClient, current: Value)
        -> Result<(), ProviderError>;

    /// Bring an existing entity under management. The id becomes the state's
    /// `id` and a read fills in the rest.
    async fn import(&self, client: &dyn InfluxClient, id: &str) -> Result<Value, ProviderError> {
        let mut state = Map::new();
        state.insert("id".to_string(), Value::String(id.to_string()));
        self.read(client, Value::Object(state)).await
    }
}

/// Every resource the provider serves.
pub fn all() -> Vec<Box<dyn Resource>> {
    vec![Box::new(OrganizationResource), Box::new(BucketResource)]
}

/// Describe the change from `prior` to `proposed` for a single instance.
///
/// Settable attributes are taken from the proposal. Computed attributes are
/// null on create and carried over from `prior` on update. A null proposal
/// plans a delete. Every change is applied in place.
pub fn plan_change(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    let prior = prior.filter(|p| !p.is_null());

    if proposed.is_null() {
        let changes = prior
            .map(|prior| {
                schema
                    .settable_names()
                    .into_iter()
                    .filter_map(|name| {
                        attribute(prior, name)
                            .map(|before| AttributeChange::removed(name, before.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        return PlanResult::with_changes(Value::Null, changes, false);
    }

    let mut planned = Map::new();
    let mut changes = Vec::new();

    for name in schema.settable_names() {
        let after = attribute(proposed, name);
        planned.insert(name.to_string(), after.cloned().unwrap_or(Value::Null));

        match (prior, after) {
            (None, Some(after)) => changes.push(AttributeChange::added(name, after.clone())),
            (None, None) => {},
            (Some(prior), after) => {
                let before = attribute(prior, name);
                if before != after {
                    changes.push(AttributeChange::new(name, before.cloned(), after.cloned()));
                }
            },
        }
    }

    for name in schema.computed_names() {
        let carried = prior
            .and_then(|prior| prior.get(name))
            .cloned()
            .unwrap_or(Value::Null);
        planned.insert(name.to_string(), carried);
    }

    PlanResult::with_changes(Value::Object(planned), changes, false)
}

/// A non-null attribute of a state object.
fn attribute<'a>(state: &'a Value, name: &str) -> Option<&'a Value> {
    state.get(name).filter(|v| !v.is_null())
}

/// Decode a state or configuration value into a resource model.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    Ok(serde_json::from_value(value)?)
}

/// Encode a resource model as state.
pub(crate) fn encode<T: Serialize>(model: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(model)?)
}

/// The id recorded in state, required by every call after create.
pub(crate) fn require_id<'a>(
    id: &'a Option<String>,
    entity: &str,
) -> Result<&'a str, ProviderError> {
    match id.as_deref() {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ProviderError::InvalidRequest(format!(
            "{} state has no id",
            entity
        ))),
    }
}

/// Render a server timestamp for state.
pub(crate) fn format_timestamp(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|ts| ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Treat an empty optional string the same as an absent one.
pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
