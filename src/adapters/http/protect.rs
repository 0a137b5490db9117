//! Request protection gate.

use std::fmt::Display;
use std::future::Future;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use authgate_types::{ErrorResponse, UserInfo};

use crate::{
    adapters::http::{
        app_state::AppState,
        cookies::{finish, read_session},
    },
    application::ports::audit::{AuditEvent, AuditLevel},
};

/// Verified caller handed to a protected handler.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub user_info: UserInfo,
}

/// Run `handler` only for authenticated requests.
///
/// Unauthenticated requests get 401 `{"error":"Unauthorized"}` and the
/// handler never runs. A handler error becomes 500 with its text in
/// `message`. A session rotated by the verifier is written back on every
/// outcome.
pub async fn protect<F, Fut, E>(
    state: &AppState,
    jar: &CookieJar,
    route: &str,
    handler: F,
) -> Response
where
    F: FnOnce(Identity) -> Fut,
    Fut: Future<Output = Result<Response, E>>,
    E: Display,
{
    let mut slot = read_session(state, jar);
    let result = state.session_use_cases.verify(&mut slot, route).await;

    let response = if result.is_authenticated {
        let identity = Identity {
            user_id: result.user_id,
            user_info: result.user_info,
        };
        let user_id = identity.user_id.clone();
        match handler(identity).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(route, user_id, error = %e, "Protected handler failed");
                state.audit.record(
                    AuditEvent::new(AuditLevel::Error, "handler_error", route)
                        .user(user_id)
                        .result("error")
                        .field("error", e.to_string()),
                );
                internal_error(e.to_string())
            }
        }
    } else {
        tracing::warn!(route, user_id = %result.user_id, "Unauthorized request");
        state.audit.record(
            AuditEvent::new(AuditLevel::Warn, "unauthorized_request", route)
                .user(result.user_id)
                .result("unauthorized"),
        );
        unauthorized()
    };

    finish(state, &slot, response)
}

pub fn unauthorized() -> Response {
    let body = ErrorResponse {
        error: "Unauthorized".into(),
        code: None,
        message: None,
        details: None,
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

pub fn internal_error(message: String) -> Response {
    let body = ErrorResponse {
        error: "Internal server error".into(),
        code: None,
        message: Some(message),
        details: None,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
