//! Core error types for studyplan-core.
//!
//! Three families of failure reach callers: client-side validation
//! (detected before any network call), remote-service failures (passed
//! through with the service's own wording), and calls made without an
//! authenticated identity.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studyplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Store and session failures
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Remote-service failures outside a store (auth calls)
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// OS credential store errors
    #[error("Credential store error: {0}")]
    Credentials(#[from] keyring::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Failure reported by the hosted backend.
///
/// `Display` is the service's message, unmodified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
    /// HTTP status when the failure came from a response.
    pub status: Option<u16>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

/// Errors returned by store and session operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// No identity is attached; nothing was sent to the backend.
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The backend answered with a row we could not read.
    #[error("Malformed row from backend: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

/// Client-side input validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please enter a task name")]
    TaskNameRequired,

    #[error("Please select a due date")]
    DueDateRequired,

    #[error("Invalid due date '{0}': expected YYYY-MM-DD")]
    InvalidDueDate(String),

    #[error("Day is required")]
    DayRequired,

    #[error("Invalid day '{0}': expected a weekday name such as Monday")]
    InvalidDay(String),

    #[error("Subject is required")]
    SubjectRequired,

    #[error("Subject cannot exceed {max} characters")]
    SubjectTooLong { max: usize },

    #[error("Study hours must be greater than 0")]
    HoursNotPositive,

    #[error("Hours cannot exceed {max} per subject")]
    HoursTooHigh { max: f64 },

    #[error("Please enter valid study hours (greater than 0)")]
    HoursNotANumber,

    #[error("Schedule ID is required")]
    ScheduleIdRequired,

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Could not locate or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(#[source] std::io::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_displays_message_verbatim() {
        let err = RemoteError::with_status("User already registered", 422);
        assert_eq!(err.to_string(), "User already registered");
        assert_eq!(err.status, Some(422));
    }

    #[test]
    fn client_error_wraps_remote_without_prefix() {
        let err: ClientError = RemoteError::new("JWT expired").into();
        assert_eq!(err.to_string(), "JWT expired");
    }

    #[test]
    fn not_authenticated_message() {
        assert_eq!(ClientError::NotAuthenticated.to_string(), "User not authenticated");
    }

    #[test]
    fn validation_messages_match_form_wording() {
        assert_eq!(ValidationError::DayRequired.to_string(), "Day is required");
        assert_eq!(ValidationError::SubjectRequired.to_string(), "Subject is required");
        assert_eq!(
            ValidationError::HoursNotPositive.to_string(),
            "Study hours must be greater than 0"
        );
        assert_eq!(
            ValidationError::HoursTooHigh { max: 24.0 }.to_string(),
            "Hours cannot exceed 24 per subject"
        );
    }
}
