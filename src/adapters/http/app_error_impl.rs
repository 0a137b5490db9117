use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use authgate_types::{ErrorCode, ErrorResponse};
use serde_json::Value;

use crate::app_error::AppError;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::TokenExpired | AppError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::VerificationFailed | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_)
            | AppError::PasswordUpdateFailed { .. }
            | AppError::UpstreamUnavailable { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = %self, code = %self.code(), "Request failed");

        let status = self.status();
        let code = self.code();
        match self {
            AppError::Unauthenticated => error_resp(status, code, "Unauthorized".into(), None),
            AppError::TokenExpired => error_resp(status, code, "Session expired".into(), None),
            AppError::InvalidToken(_) => error_resp(status, code, "Invalid session".into(), None),
            AppError::VerificationFailed => {
                error_resp(status, code, "Current password is incorrect".into(), None)
            }
            AppError::InvalidInput(msg) => error_resp(status, code, msg, None),
            AppError::PasswordUpdateFailed { details } => {
                error_resp(status, code, "Password update failed".into(), Some(details))
            }
            AppError::Configuration(msg) => error_resp(status, code, msg, None),
            AppError::UpstreamUnavailable { message, details } => {
                error_resp(status, code, message, details)
            }
            AppError::Internal(_) => {
                error_resp(status, code, "Internal server error".into(), None)
            }
        }
    }
}

pub(crate) fn error_resp(
    status: StatusCode,
    code: ErrorCode,
    error: String,
    details: Option<Value>,
) -> Response {
    let body = ErrorResponse {
        error,
        code: Some(code),
        message: None,
        details,
    };
    (status, Json(body)).into_response()
}
