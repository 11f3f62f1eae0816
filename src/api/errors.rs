//! Error types for the records API

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-success status. Carries the message
    /// the server attached, or a generic one.
    #[error("{message}")]
    Transport { status: Option<u16>, message: String },

    /// The requested identifier does not exist on the server
    #[error("{0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl ApiError {
    #[cfg(test)]
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
