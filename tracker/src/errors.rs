//! Error types for the deployment tracker

use thiserror::Error;

/// Main error type for the deployment tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("API error: {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Nested deployment '{deployment}' exceeds maximum nesting depth of {max_depth}")]
    NestingTooDeep { deployment: String, max_depth: usize },

    #[error("Nested deployment '{0}' references one of its own ancestors")]
    NestedCycle(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Polling cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for TrackerError {
    fn from(err: anyhow::Error) -> Self {
        TrackerError::Internal(err.to_string())
    }
}
