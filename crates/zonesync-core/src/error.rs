//! Error types for the zonesync system
//!
//! The four reconciliation failures (lookup, conversion, diff, apply) each
//! get their own variant so callers can tell a zone that could not be
//! planned apart from a zone whose remote write failed.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the zonesync system
#[derive(Error, Debug)]
pub enum Error {
    /// Zone or zone configuration not found, or more than one match
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// A record cannot be mapped between canonical and provider form
    #[error("Conversion error for record {record}: {reason}")]
    Conversion {
        /// Name and kind of the offending record
        record: String,
        /// What went wrong
        reason: String,
    },

    /// Malformed or contradictory input records
    #[error("Diff error: {0}")]
    Diff(String),

    /// Remote transport failure or embedded application errors on update
    #[error("Apply error: {0}")]
    Apply(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (reading the desired state file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a conversion error
    pub fn conversion(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conversion {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// Create a diff error
    pub fn diff(msg: impl Into<String>) -> Self {
        Self::Diff(msg.into())
    }

    /// Create an apply error
    pub fn apply(msg: impl Into<String>) -> Self {
        Self::Apply(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error stops planning a zone (as opposed to applying it)
    pub fn is_planning_error(&self) -> bool {
        matches!(
            self,
            Self::Lookup(_) | Self::Conversion { .. } | Self::Diff(_) | Self::Config(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
