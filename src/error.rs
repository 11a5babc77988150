use std::io;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

/// Custom error type for hookshot operations
#[derive(Debug, thiserror::Error)]
pub enum HookshotError {
    #[error("X-GitHub-Event header not set")]
    MissingEventHeader,

    #[error("Invalid Content-Type {0:?}")]
    InvalidContentType(String),

    #[error("Unable to validate payload hash")]
    SignatureMismatch,

    #[error("Unable to load JSON: {0}")]
    InvalidJson(String),

    #[error("Malformed push payload: {0}")]
    InvalidPayload(String),

    #[error("Event type {0} is not currently implemented")]
    NotImplemented(String),

    #[error("Registry query for pool '{pool}' failed: {message}")]
    Registry { pool: String, message: String },

    #[error("Pool '{0}' has no running instances")]
    EmptyPool(String),

    #[error("No available Jenkins masters in pool '{pool}' after {attempts} attempts")]
    PoolExhausted { pool: String, attempts: usize },

    #[error("Failed to create Jenkins job {job} on Jenkins host {instance}")]
    JobCreationFailed { job: String, instance: String },

    #[error("Failed to trigger Jenkins job {job} on Jenkins host {instance}")]
    TriggerFailed { job: String, instance: String },

    #[error("Event store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

impl HookshotError {
    /// HTTP status the webhook sender sees for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HookshotError::MissingEventHeader
            | HookshotError::InvalidContentType(_)
            | HookshotError::SignatureMismatch
            | HookshotError::InvalidJson(_)
            | HookshotError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            HookshotError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<redis::RedisError> for HookshotError {
    fn from(e: redis::RedisError) -> Self {
        HookshotError::Store(e.to_string())
    }
}

/// Renders `"{code}: {reason}"`; the detailed message only goes to the log.
impl IntoResponse for HookshotError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        let body = format!(
            "{}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );
        (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
    }
}

/// Helper type for Results that use HookshotError
pub type Result<T> = std::result::Result<T, HookshotError>;
