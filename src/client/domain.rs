//! Records exchanged with the InfluxDB v2 API.
//!
//! Field names follow the API's JSON (camelCase, `orgID`, `type`). Unknown
//! fields such as `links` and `labels` are ignored on decode.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organization status as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationStatus {
    /// The organization is usable.
    Active,
    /// The organization has been deactivated.
    Inactive,
}

impl OrganizationStatus {
    /// The wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for OrganizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An InfluxDB organization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Server-assigned id. `None` means the lookup found nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Organization name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Server-assigned status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrganizationStatus>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// How data in a bucket is expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionRuleType {
    /// Points older than `every_seconds` are dropped.
    #[default]
    Expire,
}

impl RetentionRuleType {
    /// The wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expire => "expire",
        }
    }
}

impl fmt::Display for RetentionRuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RetentionRuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expire" => Ok(Self::Expire),
            other => Err(format!(
                "unsupported retention type '{}', expected 'expire'",
                other
            )),
        }
    }
}

/// A single retention rule of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRule {
    /// Rule type. The API treats a missing type as `expire`.
    #[serde(rename = "type", default)]
    pub rule_type: RetentionRuleType,
    /// Duration in seconds data is kept. 0 means forever.
    pub every_seconds: i64,
    /// Shard group duration, chosen by the server when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_group_duration_seconds: Option<i64>,
}

impl RetentionRule {
    /// An `expire` rule keeping data for `every_seconds`.
    pub fn expire(every_seconds: i64) -> Self {
        Self {
            rule_type: RetentionRuleType::Expire,
            every_seconds,
            shard_group_duration_seconds: None,
        }
    }
}

/// Whether a bucket was created by a user or by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketType {
    /// User-created bucket.
    User,
    /// Internal bucket such as `_monitoring`.
    System,
}

/// Bucket schema enforcement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// Schema is inferred from written data.
    Implicit,
    /// Writes must match declared measurement schemas.
    Explicit,
}

impl SchemaType {
    /// The wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Implicit => "implicit",
            Self::Explicit => "explicit",
        }
    }
}

/// An InfluxDB bucket.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// Server-assigned id. `None` means the lookup found nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// User or system bucket.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bucket_type: Option<BucketType>,
    /// Bucket name, unique within its organization.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning organization id.
    #[serde(rename = "orgID", default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    /// Retention policy tag for the 1.x compatibility API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp: Option<String>,
    /// Schema mode, assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Ordered retention rules.
    #[serde(default)]
    pub retention_rules: Vec<RetentionRule>,
}
