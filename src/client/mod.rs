//! Client layer for the InfluxDB v2 HTTP API.
//!
//! Resources never talk HTTP directly. They go through the [`InfluxClient`]
//! handle the provider builds at configure time, which keeps the mapping code
//! independent of the transport and lets tests swap in
//! [`memory::MemoryClient`].
//!
//! The API surface mirrors the organizations and buckets services of the
//! InfluxDB v2 client SDK: create, find-by-id, find-by-name (organizations),
//! update and delete.

pub mod domain;
pub mod http;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use domain::{
    Bucket, BucketType, Organization, OrganizationStatus, RetentionRule, RetentionRuleType,
    SchemaType,
};
pub use http::HttpClient;
pub use memory::MemoryClient;

/// Errors returned by the client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be decoded.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server has no entity with the requested id or name.
    #[error("{0}")]
    NotFound(String),

    /// The entity clashes with an existing one (e.g. duplicate name).
    #[error("{0}")]
    Conflict(String),

    /// The token was missing, invalid, or lacks permission.
    #[error("{0}")]
    Unauthorized(String),

    /// The server rejected the request body.
    #[error("{0}")]
    Invalid(String),

    /// Any other non-success response.
    #[error("unexpected status {status} ({code}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// InfluxDB error code from the response body.
        code: String,
        /// Human-readable message from the response body.
        message: String,
    },

    /// The configured host is not a usable base URL.
    #[error("invalid host URL '{0}'")]
    InvalidUrl(String),
}

/// Organization operations.
#[async_trait]
pub trait OrganizationsApi: Send + Sync {
    /// Create an organization. Only `name` and `description` are sent.
    async fn create_organization(&self, org: &Organization) -> Result<Organization, ClientError>;

    /// Fetch an organization by id.
    async fn find_organization_by_id(&self, id: &str) -> Result<Organization, ClientError>;

    /// Fetch an organization by name. Fails with [`ClientError::NotFound`]
    /// when no organization has that name.
    async fn find_organization_by_name(&self, name: &str) -> Result<Organization, ClientError>;

    /// Push `name` and `description` of an existing organization.
    async fn update_organization(&self, org: &Organization) -> Result<Organization, ClientError>;

    /// Delete an organization by id.
    async fn delete_organization_with_id(&self, id: &str) -> Result<(), ClientError>;
}

/// Bucket operations.
#[async_trait]
pub trait BucketsApi: Send + Sync {
    /// Create a bucket. Sends org id, name, description, rp and retention rules.
    async fn create_bucket(&self, bucket: &Bucket) -> Result<Bucket, ClientError>;

    /// Fetch a bucket by id.
    async fn find_bucket_by_id(&self, id: &str) -> Result<Bucket, ClientError>;

    /// Push `name`, `description` and `retention_rules` of an existing bucket.
    ///
    /// Organization id, rp and schema type are not part of the update body.
    async fn update_bucket(&self, bucket: &Bucket) -> Result<Bucket, ClientError>;

    /// Delete a bucket by id.
    async fn delete_bucket_with_id(&self, id: &str) -> Result<(), ClientError>;
}

/// The full client handle shared by every resource and data source.
pub trait InfluxClient: OrganizationsApi + BucketsApi {}

impl<T: OrganizationsApi + BucketsApi> InfluxClient for T {}
