//! Error types for mailhook.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Top-level error type for the inbound pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Processor error: {0}")]
    Processor(#[from] ProcessorError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Adapter resolution and normalization errors.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("No adapter registered under '{name}'")]
    UnknownAdapter { name: String },

    #[error("Adapter {name} could not normalize payload: {reason}")]
    NormalizeFailed { name: String, reason: String },
}

/// Processor resolution and invocation errors.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("Processor class '{class}' is not registered")]
    UnknownClass { class: String },

    #[error("Processor class '{class}' could not be instantiated: {reason}")]
    ConstructFailed { class: String, reason: String },

    #[error("Processor '{class}' does not respond to '{method}'")]
    UnknownMethod { class: String, method: String },

    #[error("Processor '{class}#{method}' failed: {reason}")]
    Failed {
        class: String,
        method: String,
        reason: String,
    },
}

impl ProcessorError {
    /// Whether the configured class/method could not be resolved at all.
    pub fn is_resolution(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl Error {
    /// HTTP status this error surfaces as.
    ///
    /// Malformed inbound data is a client fault and an oversized body hits the
    /// configured limit. Everything else points at server configuration or
    /// the user's processor.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPayload(_) | Self::Adapter(AdapterError::NormalizeFailed { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Config(_)
            | Self::Adapter(AdapterError::UnknownAdapter { .. })
            | Self::Processor(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Inbound email rejected");
        } else {
            tracing::warn!(error = %self, "Inbound email rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type alias for mailhook.
pub type Result<T> = std::result::Result<T, Error>;
