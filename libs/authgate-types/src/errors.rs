use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes returned in authgate error bodies and carried by `AuthResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unauthenticated,
    TokenExpired,
    InvalidToken,
    ConfigurationError,
    VerificationFailed,
    PasswordUpdateFailed,
    UpstreamUnavailable,
    RefreshFailed,
    InvalidInput,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::VerificationFailed => "VERIFICATION_FAILED",
            Self::PasswordUpdateFailed => "PASSWORD_UPDATE_FAILED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::RefreshFailed => "REFRESH_FAILED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of the obfuscation codec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Key is not valid base64")]
    InvalidKey,

    #[error("Key must not be empty")]
    EmptyKey,

    #[error("Ciphertext is not valid base64")]
    InvalidCiphertext,

    #[error("Decoded data is not valid UTF-8")]
    InvalidUtf8,
}
