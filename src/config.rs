//! Provider configuration.
//!
//! Values come from the provider block first and fall back to the
//! environment. The host must be known at configure time; the API key is
//! treated as sensitive and never appears in `Debug` output or logs.

use serde::Deserialize;

use crate::schema::Diagnostic;

/// Environment variable consulted when `host` is not set in the provider block.
pub const HOST_ENV: &str = "INFLUXDBV2_HOST";

/// Environment variable consulted when `api_key` is not set in the provider block.
pub const API_KEY_ENV: &str = "INFLUXDBV2_API_KEY";

/// Placeholder the host substitutes for values it cannot resolve yet.
pub const UNKNOWN_VALUE: &str = "74D93920-ED26-11E3-AC10-0800200C9A66";

/// Raw provider block as sent by the host.
#[derive(Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
}

/// Resolved connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL of the InfluxDB server.
    pub host: String,
    /// API token sent as `Authorization: Token <api_key>`.
    pub api_key: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("host", &self.host)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve the configuration from the provider block and the process environment.
    pub fn from_value(config: &serde_json::Value) -> Result<Self, Vec<Diagnostic>> {
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Resolve the configuration with a custom environment lookup.
    pub fn resolve<F>(config: &serde_json::Value, env: F) -> Result<Self, Vec<Diagnostic>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = if config.is_null() {
            RawConfig::default()
        } else {
            serde_json::from_value(config.clone()).map_err(|e| {
                vec![Diagnostic::error("Invalid provider configuration").with_detail(e.to_string())]
            })?
        };

        let mut diagnostics = Vec::new();

        let host = raw.host.filter(|h| !h.is_empty()).or_else(|| env(HOST_ENV));
        let host = match host {
            Some(h) if is_unresolved(&h) => {
                diagnostics.push(
                    Diagnostic::error("Unknown InfluxDB API Host")
                        .with_detail(
                            "The provider cannot create the InfluxDB API client as there is an \
                             unknown configuration value for the InfluxDB API host. Either apply \
                             the source of the value first, set the value statically in the \
                             configuration, or use the INFLUXDBV2_HOST environment variable.",
                        )
                        .with_attribute("host"),
                );
                None
            },
            Some(h) => Some(h),
            None => {
                diagnostics.push(
                    Diagnostic::error("Missing InfluxDB API Host")
                        .with_detail(
                            "Set the host in the provider configuration or use the \
                             INFLUXDBV2_HOST environment variable.",
                        )
                        .with_attribute("host"),
                );
                None
            },
        };

        let api_key = match raw.api_key.filter(|k| !k.is_empty()).or_else(|| env(API_KEY_ENV)) {
            Some(k) if is_unresolved(&k) => {
                diagnostics.push(
                    Diagnostic::error("Unknown InfluxDB API Key")
                        .with_detail(
                            "The provider cannot create the InfluxDB API client as there is an \
                             unknown configuration value for the InfluxDB API key.",
                        )
                        .with_attribute("api_key"),
                );
                String::new()
            },
            Some(k) => k,
            None => String::new(),
        };

        match host {
            Some(host) if diagnostics.is_empty() => Ok(Self { host, api_key }),
            _ => Err(diagnostics),
        }
    }
}

/// Returns true if the value is the host's unknown placeholder or an
/// expression that was never interpolated.
pub fn is_unresolved(value: &str) -> bool {
    value == UNKNOWN_VALUE || value.contains("${")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_from_block() {
        let config = ProviderConfig::resolve(
            &json!({"host": "http://localhost:8086", "api_key": "secret"}),
            no_env,
        )
        .unwrap();
        assert_eq!(config.host, "http://localhost:8086");
        assert_eq!(config.api_key, "secret");
    }

    #[test]
    fn test_resolve_falls_back_to_env() {
        let env = |name: &str| match name {
            HOST_ENV => Some("http://influx:8086".to_string()),
            API_KEY_ENV => Some("env-token".to_string()),
            _ => None,
        };
        let config = ProviderConfig::resolve(&json!({"host": null}), env).unwrap();
        assert_eq!(config.host, "http://influx:8086");
        assert_eq!(config.api_key, "env-token");
    }

    #[test]
    fn test_block_wins_over_env() {
        let env = |_: &str| Some("http://from-env:8086".to_string());
        let config =
            ProviderConfig::resolve(&json!({"host": "http://from-block:8086"}), env).unwrap();
        assert_eq!(config.host, "http://from-block:8086");
    }

    #[test]
    fn test_unknown_host_is_a_configuration_error() {
        let diagnostics =
            ProviderConfig::resolve(&json!({"host": UNKNOWN_VALUE}), no_env).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Unknown InfluxDB API Host");
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("host"));

        let diagnostics =
            ProviderConfig::resolve(&json!({"host": "${var.influx_host}"}), no_env).unwrap_err();
        assert_eq!(diagnostics[0].summary, "Unknown InfluxDB API Host");
    }

    #[test]
    fn test_missing_host() {
        let diagnostics = ProviderConfig::resolve(&json!({}), no_env).unwrap_err();
        assert_eq!(diagnostics[0].summary, "Missing InfluxDB API Host");

        let diagnostics = ProviderConfig::resolve(&serde_json::Value::Null, no_env).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let diagnostics = ProviderConfig::resolve(&json!({"host": 8086}), no_env).unwrap_err();
        assert_eq!(diagnostics[0].summary, "Invalid provider configuration");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ProviderConfig {
            host: "http://localhost:8086".to_string(),
            api_key: "super-secret-token".to_string(),
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}
