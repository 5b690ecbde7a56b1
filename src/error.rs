//! Error types for the InfluxDB v2 provider.

use std::fmt::Display;

use thiserror::Error;

use crate::client::ClientError;

/// Errors returned across the [`ProviderService`](crate::service::ProviderService) seam.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The remote API call failed.
    #[error("SDK error: {0}")]
    Sdk(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource already exists (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Permission denied (authentication/authorization failure).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Service temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Operation timed out.
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// Invalid request from the host (e.g. state without an id).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Sdk(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::AlreadyExists(msg) => msg,
            Self::PermissionDenied(msg) => msg,
            Self::Unavailable(msg) => msg,
            Self::DeadlineExceeded(msg) => msg,
            Self::Unimplemented(msg) => msg,
            Self::InvalidRequest(msg) => msg,
        }
    }

    /// Wrap a client failure with the operation and entity it happened on.
    ///
    /// The variant follows the kind of failure so the host can tell a missing
    /// entity from a rejected credential or an unreachable server.
    ///
    /// # Examples
    ///
    /// ```
    /// use influxdbv2_provider::client::ClientError;
    /// use influxdbv2_provider::ProviderError;
    ///
    /// let err = ProviderError::remote(
    ///     "Could not read organization with ID 0a1b",
    ///     ClientError::NotFound("organization not found".to_string()),
    /// );
    /// assert!(matches!(err, ProviderError::NotFound(_)));
    /// assert_eq!(
    ///     err.message(),
    ///     "Could not read organization with ID 0a1b: organization not found"
    /// );
    /// ```
    pub fn remote(context: impl Display, err: ClientError) -> Self {
        let msg = format!("{}: {}", context, err);
        match err {
            ClientError::NotFound(_) => Self::NotFound(msg),
            ClientError::Conflict(_) => Self::AlreadyExists(msg),
            ClientError::Unauthorized(_) => Self::PermissionDenied(msg),
            ClientError::Invalid(_) => Self::Validation(msg),
            ClientError::InvalidUrl(_) => Self::Configuration(msg),
            ClientError::Http(ref e) if e.is_timeout() => Self::DeadlineExceeded(msg),
            ClientError::Http(ref e) if e.is_connect() => Self::Unavailable(msg),
            ClientError::Http(_) | ClientError::Api { .. } => Self::Sdk(msg),
        }
    }

    /// Returns true if this error means the remote entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("resource-123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: resource-123");

        let err = ProviderError::Validation("invalid input".to_string());
        assert_eq!(format!("{}", err), "Validation error: invalid input");

        let err = ProviderError::UnknownResource("custom_resource".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: custom_resource");

        let err = ProviderError::AlreadyExists("bucket-123".to_string());
        assert_eq!(format!("{}", err), "Resource already exists: bucket-123");
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::NotFound("resource-123".to_string());
        assert_eq!(err.message(), "resource-123");

        let err = ProviderError::Configuration("invalid config".to_string());
        assert_eq!(err.message(), "invalid config");

        let err = ProviderError::InvalidRequest("bad request".to_string());
        assert_eq!(err.message(), "bad request");
    }

    #[test]
    fn test_remote_maps_client_error_kinds() {
        let err = ProviderError::remote(
            "Error creating organization",
            ClientError::Conflict("organization with name firstorg already exists".to_string()),
        );
        assert!(matches!(err, ProviderError::AlreadyExists(_)));
        assert!(err.message().starts_with("Error creating organization: "));

        let err = ProviderError::remote(
            "Error reading bucket",
            ClientError::Unauthorized("unauthorized access".to_string()),
        );
        assert!(matches!(err, ProviderError::PermissionDenied(_)));

        let err = ProviderError::remote(
            "Error creating bucket",
            ClientError::Invalid("retention rules are invalid".to_string()),
        );
        assert!(matches!(err, ProviderError::Validation(_)));

        let err = ProviderError::remote(
            "Error deleting bucket",
            ClientError::Api {
                status: 500,
                code: "internal error".to_string(),
                message: "boom".to_string(),
            },
        );
        assert!(matches!(err, ProviderError::Sdk(_)));
        assert!(err.message().contains("boom"));
    }

    #[test]
    fn test_is_not_found() {
        let err = ProviderError::remote(
            "Could not read organization firstorg with ID 0001",
            ClientError::NotFound("organization not found".to_string()),
        );
        assert!(err.is_not_found());
        assert!(!ProviderError::Sdk("x".to_string()).is_not_found());
    }
}
