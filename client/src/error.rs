use shared::{DirectionsError, ValidationError};
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid JSON from routing service: {0}")]
    Json(#[from] serde_json::Error),
    #[error("routing service error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Directions(#[from] DirectionsError),
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Message shown to the user when a request fails.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}
