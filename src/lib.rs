//! InfluxDB v2 Provider
//!
//! An infrastructure provider that manages **organizations** and **buckets**
//! of an InfluxDB v2 server and looks organizations up by name.
//!
//! # Overview
//!
//! - **ProviderService trait**: the seam the orchestrating host drives, one
//!   call per lifecycle step, with state as `serde_json::Value`
//! - **[`InfluxDbV2Provider`]**: the implementation, dispatching by type name
//! - **Resources**: `influxdbv2_organization` and `influxdbv2_bucket`
//! - **Data sources**: `influxdbv2_organization` (lookup by name)
//! - **Client layer**: a `reqwest` client for the `/api/v2` REST API and an
//!   in-memory stand-in for tests
//! - **Logging**: `tracing` to stderr
//!
//! # Quick Start
//!
//! ```
//! use influxdbv2_provider::{InfluxDbV2Provider, ProviderService};
//!
//! let provider = InfluxDbV2Provider::new(env!("CARGO_PKG_VERSION"));
//! let metadata = provider.metadata();
//! assert_eq!(metadata.type_name, "influxdbv2");
//! assert!(metadata.resources.contains(&"influxdbv2_bucket".to_string()));
//! ```
//!
//! A host configures the provider once and then calls it for each resource:
//!
//! ```ignore
//! provider.configure(json!({
//!     "host": "http://localhost:8086",
//!     "api_key": std::env::var("INFLUXDBV2_API_KEY")?,
//! })).await?;
//!
//! let org = provider.create("influxdbv2_organization", json!({"name": "firstorg"})).await?;
//! let bucket = provider.create("influxdbv2_bucket", json!({
//!     "name": "new_bucket",
//!     "org_id": org["id"],
//!     "retention_rules": [{"every_seconds": 2592000, "retention_type": "expire"}],
//! })).await?;
//! ```
//!
//! # Configuration
//!
//! | attribute | environment fallback | notes |
//! |-----------|----------------------|-------|
//! | `host`    | `INFLUXDBV2_HOST`    | `http`/`https` URL, required |
//! | `api_key` | `INFLUXDBV2_API_KEY` | sensitive, sent as `Authorization: Token <key>` |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod service;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::InfluxDbV2Provider;
pub use schema::ProviderSchema;
pub use service::ProviderService;
pub use types::{AttributeChange, ImportedResource, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
