//! Client-side error type

use thiserror::Error;

/// Message shown when a request never produced a usable response
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// Errors surfaced by the client auth library
#[derive(Debug, Error)]
pub enum ClientError {
    /// Form input rejected before any request was sent
    #[error("{0}")]
    Validation(String),

    /// The server answered with `success: false` or a non-OK status
    #[error("{0}")]
    Rejected(String),

    /// The request failed, timed out, or returned an unreadable body
    #[error("network error: {0}")]
    Network(String),

    /// Persisted token could not be read or written
    #[error("token storage error: {0}")]
    Storage(String),

    /// The store was disposed while the operation was pending
    #[error("auth store has been disposed")]
    Disposed,

    /// API base URL could not be parsed or joined
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl ClientError {
    /// Short human-readable message for the form that triggered the error
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(message) | ClientError::Rejected(message) => message.clone(),
            ClientError::Network(_) | ClientError::InvalidUrl(_) => {
                NETWORK_ERROR_MESSAGE.to_string()
            }
            ClientError::Storage(_) | ClientError::Disposed => {
                "Something went wrong. Please reload the page.".to_string()
            }
        }
    }
}
