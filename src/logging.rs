//! Logging setup for the provider process.
//!
//! All output goes to **stderr**; stdout belongs to the host's plugin
//! handshake. Filtering follows `RUST_LOG`.
//!
//! # Examples
//!
//! ```bash
//! # Default
//! RUST_LOG=info ./influxdbv2-provider
//!
//! # Request-level detail for the API client only
//! RUST_LOG=influxdbv2_provider::client=debug ./influxdbv2-provider
//! ```
//!
//! The API key is never recorded: [`crate::config::ProviderConfig`] and
//! [`crate::client::HttpClient`] both redact it in their `Debug` output, and
//! instrumented functions skip the values that carry it.

use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter, Layer};

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

fn stderr_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn subscriber(default_level: &str) -> impl tracing::Subscriber + Send + Sync + 'static {
    Registry::default()
        .with(filter(default_level))
        .with(stderr_layer())
}

/// Initialize the global subscriber at the `info` level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_FILTER);
}

/// Initialize the global subscriber, using `default_level` when `RUST_LOG`
/// is not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    subscriber(default_level).init();
}

/// Try to initialize logging, returning false if a subscriber is already set.
///
/// Safe to call from every test.
pub fn try_init_logging() -> bool {
    subscriber(DEFAULT_FILTER).try_init().is_ok()
}
