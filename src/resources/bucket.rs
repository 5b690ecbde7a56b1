//! `influxdbv2_bucket` resource.
//!
//! A bucket belongs to one organization and carries an ordered list of
//! retention rules. Updates push name, description and rules only; the
//! organization id and `rp` are fixed at creation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{decode, encode, format_timestamp, non_empty, require_id, Resource};
use crate::client::{Bucket, InfluxClient, RetentionRule, RetentionRuleType};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, Diagnostic, NestedBlock, Schema};
use crate::validation;

/// Type name exposed to the host.
pub const TYPE_NAME: &str = "influxdbv2_bucket";

/// One retention rule as stored in state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionRuleModel {
    /// Seconds to keep data. 0 keeps it forever.
    pub every_seconds: i64,
    /// Always `expire`.
    #[serde(default = "default_retention_type")]
    pub retention_type: String,
}

fn default_retention_type() -> String {
    RetentionRuleType::Expire.to_string()
}

/// Bucket state as stored by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketModel {
    /// Bucket name.
    pub name: String,
    /// Owning organization id.
    pub org_id: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Retention policy tag.
    pub rp: Option<String>,
    /// Ordered retention rules.
    pub retention_rules: Vec<RetentionRuleModel>,
    /// Server-assigned id.
    pub id: Option<String>,
    /// `implicit` or `explicit`.
    pub schema_type: Option<String>,
    /// Creation time, RFC 3339.
    pub created_at: Option<String>,
    /// Last update time, RFC 3339.
    pub updated_at: Option<String>,
}

/// Transcode state rules to API rules, keeping order.
pub fn rules_to_remote(
    rules: &[RetentionRuleModel],
) -> Result<Vec<RetentionRule>, ProviderError> {
    rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            let rule_type = rule.retention_type.parse::<RetentionRuleType>().map_err(|e| {
                ProviderError::Validation(format!("retention_rules.{}.retention_type: {}", i, e))
            })?;
            if rule.every_seconds < 0 {
                return Err(ProviderError::Validation(format!(
                    "retention_rules.{}.every_seconds must be >= 0, got {}",
                    i, rule.every_seconds
                )));
            }
            Ok(RetentionRule {
                rule_type,
                every_seconds: rule.every_seconds,
                shard_group_duration_seconds: None,
            })
        })
        .collect()
}

/// Transcode API rules to state rules, keeping order.
pub fn rules_from_remote(rules: &[RetentionRule]) -> Vec<RetentionRuleModel> {
    rules
        .iter()
        .map(|rule| RetentionRuleModel {
            every_seconds: rule.every_seconds,
            retention_type: rule.rule_type.to_string(),
        })
        .collect()
}

impl BucketModel {
    /// The record sent on create.
    pub fn to_remote(&self) -> Result<Bucket, ProviderError> {
        Ok(Bucket {
            id: self.id.clone(),
            name: self.name.clone(),
            description: non_empty(&self.description),
            org_id: non_empty(&self.org_id),
            rp: non_empty(&self.rp),
            retention_rules: rules_to_remote(&self.retention_rules)?,
            ..Default::default()
        })
    }

    /// Overwrite every field from a server response.
    pub fn refresh(&mut self, bucket: &Bucket) {
        self.id = bucket.id.clone();
        self.name = bucket.name.clone();
        self.org_id = bucket.org_id.clone();
        self.description = bucket.description.clone();
        self.rp = bucket.rp.clone();
        self.retention_rules = rules_from_remote(&bucket.retention_rules);
        self.schema_type = bucket.schema_type.map(|s| s.as_str().to_string());
        self.created_at = format_timestamp(bucket.created_at);
        self.updated_at = format_timestamp(bucket.updated_at);
    }
}

fn ensure_found(bucket: Bucket, name: &str, id: &str) -> Result<Bucket, ProviderError> {
    match bucket.id.as_deref() {
        Some(found) if !found.is_empty() => Ok(bucket),
        _ => Err(ProviderError::NotFound(format!(
            "Could not read bucket {} with ID {}: bucket not found",
            name, id
        ))),
    }
}

/// Manages InfluxDB buckets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketResource;

#[async_trait]
impl Resource for BucketResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let rule = Block::new()
            .with_description("Rules to expire or retain data.")
            .with_attribute(
                "every_seconds",
                Attribute::required_int64().with_description(
                    "The duration in seconds for how long data will be kept. 0 means infinite.",
                ),
            )
            .with_attribute(
                "retention_type",
                Attribute::required_string()
                    .with_description("The retention type. Only `expire` is supported."),
            );

        Schema::v0()
            .with_description("Create and manage buckets.")
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name of the bucket."),
            )
            .with_attribute(
                "org_id",
                Attribute::required_string()
                    .with_description("The organization ID the bucket belongs to."),
            )
            .with_attribute(
                "description",
                Attribute::optional_string().with_description("The description of the bucket."),
            )
            .with_attribute(
                "rp",
                Attribute::optional_string()
                    .with_description("The retention policy tag for the 1.x compatibility API."),
            )
            .with_block(
                "retention_rules",
                NestedBlock::list(rule).with_min_items(1),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The bucket ID."),
            )
            .with_attribute(
                "schema_type",
                Attribute::computed_string()
                    .with_description("The schema type of the bucket, implicit or explicit."),
            )
            .with_attribute(
                "created_at",
                Attribute::computed_string().with_description("Bucket creation date, RFC 3339."),
            )
            .with_attribute(
                "updated_at",
                Attribute::computed_string()
                    .with_description("Last bucket update date, RFC 3339."),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);

        let rules = config
            .get("retention_rules")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for (i, rule) in rules.iter().enumerate() {
            if let Some(seconds) = rule.get("every_seconds").and_then(Value::as_i64) {
                if seconds < 0 {
                    diagnostics.push(
                        Diagnostic::error("Invalid retention period")
                            .with_detail(format!("every_seconds must be >= 0, got {}", seconds))
                            .with_attribute(format!("retention_rules.{}.every_seconds", i)),
                    );
                }
            }
            if let Some(kind) = rule.get("retention_type").and_then(Value::as_str) {
                if let Err(e) = kind.parse::<RetentionRuleType>() {
                    diagnostics.push(
                        Diagnostic::error("Invalid retention type")
                            .with_detail(e)
                            .with_attribute(format!("retention_rules.{}.retention_type", i)),
                    );
                }
            }
        }

        diagnostics
    }

    async fn create(
        &self,
        client: &dyn InfluxClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let mut model: BucketModel = decode(planned)?;
        if non_empty(&model.org_id).is_none() {
            return Err(ProviderError::Validation(format!(
                "bucket {} requires an org_id",
                model.name
            )));
        }
        if model.retention_rules.is_empty() {
            return Err(ProviderError::Validation(format!(
                "bucket {} requires at least one retention rule",
                model.name
            )));
        }

        let created = client
            .create_bucket(&model.to_remote()?)
            .await
            .map_err(|e| {
                ProviderError::remote(format!("Error creating bucket {}", model.name), e)
            })?;

        model.refresh(&created);
        debug!(id = ?model.id, name = %model.name, "created bucket");
        encode(&model)
    }

    async fn read(
        &self,
        client: &dyn InfluxClient,
        current: Value,
    ) -> Result<Value, ProviderError> {
        let mut model: BucketModel = decode(current)?;
        let id = require_id(&model.id, "bucket")?.to_string();

        let bucket = client.find_bucket_by_id(&id).await.map_err(|e| {
            ProviderError::remote(
                format!("Could not read bucket {} with ID {}", model.name, id),
                e,
            )
        })?;
        let bucket = ensure_found(bucket, &model.name, &id)?;

        model.refresh(&bucket);
        encode(&model)
    }

    async fn update(
        &self,
        client: &dyn InfluxClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior: BucketModel = decode(prior)?;
        let mut model: BucketModel = decode(planned)?;
        let id = require_id(&model.id, "bucket")
            .or_else(|_| require_id(&prior.id, "bucket"))?
            .to_string();

        if model.org_id.is_some() && model.org_id != prior.org_id {
            warn!(
                id = %id,
                "org_id changed but is not sent on update, the bucket stays in its organization"
            );
        }

        let existing = client
            .find_bucket_by_id(&id)
            .await
            .map_err(|e| ProviderError::remote(format!("Bucket with ID {} not found", id), e))?;
        let mut bucket = ensure_found(existing, &prior.name, &id)?;
        bucket.name = model.name.clone();
        bucket.description = non_empty(&model.description);
        bucket.retention_rules = rules_to_remote(&model.retention_rules)?;

        let updated = client.update_bucket(&bucket).await.map_err(|e| {
            ProviderError::remote(
                format!("Could not update bucket {} with ID {}", model.name, id),
                e,
            )
        })?;

        model.refresh(&updated);
        debug!(id = %id, name = %model.name, "updated bucket");
        encode(&model)
    }

    async fn delete(
        &self,
        client: &dyn InfluxClient,
        current: Value,
    ) -> Result<(), ProviderError> {
        let model: BucketModel = decode(current)?;
        let id = require_id(&model.id, "bucket")?;

        client.delete_bucket_with_id(id).await.map_err(|e| {
            ProviderError::remote(
                format!("Could not delete bucket {} with ID {}", model.name, id),
                e,
            )
        })?;

        debug!(id = %id, name = %model.name, "deleted bucket");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MemoryClient, Organization, OrganizationsApi};
    use serde_json::json;

    async fn org_id(client: &MemoryClient) -> String {
        let org = client
            .create_organization(&Organization {
                name: "firstorg".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        org.id.unwrap()
    }

    fn rule(every_seconds: i64) -> RetentionRuleModel {
        RetentionRuleModel {
            every_seconds,
            retention_type: "expire".to_string(),
        }
    }

    #[test]
    fn test_rules_keep_order_both_ways() {
        let rules = vec![rule(2592000), rule(0), rule(3600)];
        let remote = rules_to_remote(&rules).unwrap();

        assert_eq!(
            remote.iter().map(|r| r.every_seconds).collect::<Vec<_>>(),
            vec![2592000, 0, 3600]
        );
        assert_eq!(rules_from_remote(&remote), rules);
    }

    #[test]
    fn test_rules_to_remote_rejects_bad_values() {
        let err = rules_to_remote(&[rule(-1)]).unwrap_err();
        assert!(err.message().contains("retention_rules.0.every_seconds"));

        let bad_type = RetentionRuleModel {
            every_seconds: 60,
            retention_type: "archive".to_string(),
        };
        let err = rules_to_remote(&[rule(60), bad_type]).unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(err.message().contains("retention_rules.1.retention_type"));
    }

    #[test]
    fn test_rule_type_defaults_to_expire() {
        let rule: RetentionRuleModel =
            serde_json::from_value(json!({"every_seconds": 60})).unwrap();
        assert_eq!(rule.retention_type, "expire");
    }

    #[test]
    fn test_validate_domain_rules() {
        let diagnostics = BucketResource.validate(&json!({
            "name": "new_bucket",
            "org_id": "0000000000000001",
            "retention_rules": [
                {"every_seconds": -5, "retention_type": "expire"},
                {"every_seconds": 60, "retention_type": "shrink"}
            ]
        }));
        let attributes: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert_eq!(
            attributes,
            vec!["retention_rules.0.every_seconds", "retention_rules.1.retention_type"]
        );
    }

    #[test]
    fn test_validate_requires_a_rule() {
        let diagnostics = BucketResource.validate(&json!({
            "name": "new_bucket",
            "org_id": "0000000000000001",
            "retention_rules": []
        }));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("retention_rules"));
    }

    #[tokio::test]
    async fn test_create_requires_org_and_rules() {
        let client = MemoryClient::new();

        let err = BucketResource
            .create(
                &client,
                json!({
                    "name": "b",
                    "retention_rules": [{"every_seconds": 0, "retention_type": "expire"}]
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));

        let err = BucketResource
            .create(&client, json!({"name": "b", "org_id": "0000000000000001"}))
            .await
            .unwrap_err();
        assert!(err.message().contains("at least one retention rule"));
    }

    #[tokio::test]
    async fn test_update_sends_planned_rules_only() {
        let client = MemoryClient::new();
        let org_id = org_id(&client).await;

        let created = BucketResource
            .create(
                &client,
                json!({
                    "name": "new_bucket",
                    "org_id": org_id,
                    "rp": "autogen",
                    "retention_rules": [{"every_seconds": 2592000, "retention_type": "expire"}]
                }),
            )
            .await
            .unwrap();

        let mut planned = created.clone();
        planned["retention_rules"] = json!([{"every_seconds": 3600, "retention_type": "expire"}]);
        planned["rp"] = json!("other");

        let updated = BucketResource
            .update(&client, created.clone(), planned)
            .await
            .unwrap();

        assert_eq!(
            updated["retention_rules"],
            json!([{"every_seconds": 3600, "retention_type": "expire"}])
        );
        assert_eq!(updated["rp"], "autogen");
        assert_eq!(updated["org_id"], created["org_id"]);
        assert_eq!(updated["id"], created["id"]);
        assert_eq!(updated["schema_type"], "implicit");
    }
}
