//! Error types for Co-Pilot Board
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Co-Pilot Board operations
///
/// Fallible functions return [`Result`] (an `anyhow` alias) and attach one of
/// these variants. The HTTP layer downcasts to this type to choose a status
/// code, so the variant determines how a failure is reported to callers.
#[derive(Error, Debug)]
pub enum CoboardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request input failed validation (missing or malformed field)
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// The route exists but does not accept this HTTP method
    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    /// Completion provider errors (API calls, unexpected payloads)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Conversation store errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Co-Pilot Board operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = CoboardError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_validation_error_display_is_verbatim() {
        let error =
            CoboardError::Validation("Message and conversation_id are required".to_string());
        assert_eq!(error.to_string(), "Message and conversation_id are required");
    }

    #[test]
    fn test_not_found_error_display() {
        let error = CoboardError::NotFound("Conversation abc".to_string());
        assert_eq!(error.to_string(), "Conversation abc not found");
    }

    #[test]
    fn test_provider_error_display() {
        let error = CoboardError::Provider("API timeout".to_string());
        assert_eq!(error.to_string(), "Provider error: API timeout");
    }

    #[test]
    fn test_missing_credentials_error_display() {
        let error = CoboardError::MissingCredentials("openai".to_string());
        assert_eq!(error.to_string(), "Missing credentials for provider: openai");
    }

    #[test]
    fn test_storage_error_display() {
        let error = CoboardError::Storage("database connection failed".to_string());
        assert_eq!(
            error.to_string(),
            "Storage error: database connection failed"
        );
    }

    #[test]
    fn test_method_not_allowed_display() {
        let error = CoboardError::MethodNotAllowed("GET".to_string());
        assert_eq!(error.to_string(), "Method GET not allowed");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: CoboardError = json_error.into();
        assert!(matches!(error, CoboardError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: CoboardError = yaml_error.into();
        assert!(matches!(error, CoboardError::Yaml(_)));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = CoboardError::NotFound("Point 1".into()).into();
        let inner = err.downcast_ref::<CoboardError>().expect("downcast");
        assert!(matches!(inner, CoboardError::NotFound(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoboardError>();
    }
}
