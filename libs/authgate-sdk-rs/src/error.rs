use authgate_types::{CodecError, ErrorCode};
use thiserror::Error;

/// SDK-specific errors.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected before any request was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The session could not be refreshed; the caller must sign in again
    #[error("Session refresh failed")]
    RefreshFailed,

    /// The server answered with a non-2xx status
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
    },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Transport failure from a custom [`crate::Transport`]
    #[error("Transport error: {0}")]
    Transport(String),

    /// Network error (only with `client` feature)
    #[cfg(feature = "client")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl SdkError {
    /// The wire error code this error corresponds to, when there is one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Config(_) => Some(ErrorCode::ConfigurationError),
            Self::InvalidInput(_) | Self::Codec(_) => Some(ErrorCode::InvalidInput),
            Self::RefreshFailed => Some(ErrorCode::RefreshFailed),
            Self::Api { code, .. } => *code,
            Self::Decode(_) | Self::Transport(_) => None,
            #[cfg(feature = "client")]
            Self::Network(_) => Some(ErrorCode::UpstreamUnavailable),
        }
    }
}
