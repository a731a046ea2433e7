//! Error types for the show client

use thiserror::Error;

/// Errors surfaced by show query handling
#[derive(Error, Debug)]
pub enum ShowError {
    /// Backing-store read failed
    #[error("Database operation failed: {operation}: {message}")]
    Database {
        /// The operation that failed (e.g. "PORT", "KEYS")
        operation: String,
        /// Error message
        message: String,
    },

    /// Interface selector matched nothing
    #[error("Invalid interface name {0}")]
    InterfaceNotFound(String),

    /// Option present but unusable
    #[error("Invalid option {option}: {message}")]
    InvalidOption {
        /// Option name
        option: String,
        /// Error message
        message: String,
    },

    /// Sampling period above the configured maximum
    #[error("period value must be <= {max}, got {period}")]
    PeriodTooLarge {
        /// Requested period in seconds
        period: u64,
        /// Configured maximum in seconds
        max: u64,
    },

    /// Path does not name a known show command
    #[error("Unknown show path: {0}")]
    UnknownPath(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Payload encoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request was cancelled by the caller
    #[error("Request cancelled")]
    Cancelled,

    /// Request ran past its deadline
    #[error("Request exceeded deadline of {0} seconds")]
    Timeout(u64),
}

impl ShowError {
    /// Creates a database error.
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid option error.
    pub fn invalid_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            message: message.into(),
        }
    }

    /// Status code the transport reports for this error.
    pub fn status_code(&self) -> &'static str {
        match self {
            ShowError::InterfaceNotFound(_) | ShowError::UnknownPath(_) => "NOT_FOUND",
            ShowError::InvalidOption { .. } | ShowError::PeriodTooLarge { .. } => {
                "INVALID_ARGUMENT"
            }
            ShowError::Database { .. } => "UNAVAILABLE",
            ShowError::Cancelled => "CANCELLED",
            ShowError::Timeout(_) => "DEADLINE_EXCEEDED",
            ShowError::Configuration(_) | ShowError::Serialization(_) | ShowError::Io(_) => {
                "INTERNAL"
            }
        }
    }
}

/// Result type for show client operations
pub type Result<T> = std::result::Result<T, ShowError>;
