use authgate_types::{CodecError, ErrorCode};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Current password is incorrect")]
    VerificationFailed,

    #[error("Password update failed")]
    PasswordUpdateFailed { details: Value },

    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        details: Option<Value>,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Unauthenticated => ErrorCode::Unauthenticated,
            AppError::TokenExpired => ErrorCode::TokenExpired,
            AppError::InvalidToken(_) => ErrorCode::InvalidToken,
            AppError::Configuration(_) => ErrorCode::ConfigurationError,
            AppError::VerificationFailed => ErrorCode::VerificationFailed,
            AppError::PasswordUpdateFailed { .. } => ErrorCode::PasswordUpdateFailed,
            AppError::UpstreamUnavailable { .. } => ErrorCode::UpstreamUnavailable,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::UpstreamUnavailable {
            message: message.into(),
            details: None,
        }
    }
}

impl From<CodecError> for AppError {
    fn from(e: CodecError) -> Self {
        AppError::InvalidInput(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::upstream(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
