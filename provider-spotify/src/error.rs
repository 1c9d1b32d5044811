//! Error types for the Spotify provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Spotify Web API errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpotifyError {
    /// 4xx other than 429. `message` comes from the `error.message` field of
    /// the response body when the body has one.
    #[error("Spotify API request failed (status {status} {status_text}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Request {
        status: u16,
        status_text: String,
        message: Option<String>,
    },

    /// 5xx or any other non-success status that is not a client error.
    #[error("Spotify API server error (status {status} {status_text})")]
    Server { status: u16, status_text: String },

    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SpotifyError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SpotifyError::Request { status, .. } | SpotifyError::Server { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Result type for Spotify operations
pub type Result<T> = std::result::Result<T, SpotifyError>;

impl From<BridgeError> for SpotifyError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Network(msg) => SpotifyError::Network(msg),
            BridgeError::Decode(msg) => SpotifyError::Parse(msg),
            BridgeError::Http {
                status,
                status_text,
                message,
            } if (400..500).contains(&status) => SpotifyError::Request {
                status,
                status_text,
                message,
            },
            BridgeError::Http {
                status,
                status_text,
                ..
            } => SpotifyError::Server {
                status,
                status_text,
            },
            other => SpotifyError::Network(other.to_string()),
        }
    }
}

impl From<SpotifyError> for BridgeError {
    fn from(error: SpotifyError) -> Self {
        match error {
            SpotifyError::Request {
                status,
                status_text,
                message,
            } => BridgeError::Http {
                status,
                status_text,
                message,
            },
            SpotifyError::Server {
                status,
                status_text,
            } => BridgeError::Http {
                status,
                status_text,
                message: None,
            },
            SpotifyError::Network(msg) => BridgeError::Network(msg),
            SpotifyError::Parse(msg) => BridgeError::Decode(msg),
            SpotifyError::InvalidInput(msg) => {
                BridgeError::OperationFailed(format!("Invalid input: {}", msg))
            }
        }
    }
}
