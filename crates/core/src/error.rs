//! Error types for the FSC Q&A service.
//!
//! This module defines a unified error enum covering the three failure
//! classes the query path can produce (configuration, invalid input,
//! external service) plus the ambient I/O, serialization and template
//! errors.

use thiserror::Error;

/// Unified error type for the FSC Q&A service.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed configuration or store metadata.
    /// Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller supplied input the engine refuses before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failure reported by (or while talking to) the external RAG service
    #[error("Service error: {0}")]
    Service(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Page template registration or rendering errors
    #[error("Template error: {0}")]
    Template(String),
}

impl AppError {
    /// Whether the error was caused by the caller rather than the system.
    pub fn is_user_error(&self) -> bool {
        matches!(self, AppError::InvalidInput(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::Config("store_id missing".to_string());
        assert_eq!(err.to_string(), "Configuration error: store_id missing");

        let err = AppError::Service("rate limited".to_string());
        assert_eq!(err.to_string(), "Service error: rate limited");
    }

    #[test]
    fn test_user_error_classification() {
        assert!(AppError::InvalidInput("empty".to_string()).is_user_error());
        assert!(!AppError::Service("boom".to_string()).is_user_error());
        assert!(!AppError::Config("bad".to_string()).is_user_error());
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse_err.into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
