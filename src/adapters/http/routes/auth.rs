use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use authgate_types::{
    ChangePasswordRequest, ChangePasswordResponse, EncryptionKeyResponse, ErrorCode,
    ErrorResponse, RefreshResponse, StatusResponse, decode, generate_key,
};
use serde::{Deserialize, Serialize};

use super::found;
use crate::{
    adapters::http::{
        app_state::AppState,
        cookies::{
            KEY_ESCROW_COOKIE, KEY_ESCROW_TTL, SESSION_COOKIE, SIGN_IN_COOKIE, SIGN_IN_TTL,
            append_cookie, finish, read_sealed, read_session, removal_cookie, sealed_cookie,
            session_cookie,
        },
        protect::{Identity, protect},
    },
    app_error::{AppError, AppResult},
    application::ports::audit::{AuditEvent, AuditLevel},
    domain::entities::session::{PendingSignIn, SessionSlot},
};

/// Obfuscation key bound to the user it was issued to.
#[derive(Serialize, Deserialize)]
struct KeyEscrow {
    user_id: String,
    key: String,
}

#[derive(Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(status))
        .route("/refresh", post(refresh))
        .route("/encryption-key", get(encryption_key))
        .route("/change-password", post(change_password))
        .route("/signin", get(signin))
        .route("/signout", get(signout))
        .route("/reset-password", get(reset_password))
}

async fn status(State(app_state): State<AppState>, jar: CookieJar) -> Response {
    let mut slot = read_session(&app_state, &jar);
    let response = match app_state.session_use_cases.status(&mut slot).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Error checking authentication status");
            let body = StatusResponse {
                is_authenticated: false,
                claims: None,
                error: Some("Failed to check authentication status".into()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    };
    finish(&app_state, &slot, response)
}

async fn refresh(State(app_state): State<AppState>, jar: CookieJar) -> Response {
    let mut slot = read_session(&app_state, &jar);
    let response = match app_state.session_use_cases.refresh(&mut slot).await {
        Ok(_) => Json(RefreshResponse { success: true }).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Error refreshing token");
            let body = ErrorResponse {
                error: "Failed to refresh token".into(),
                code: Some(ErrorCode::RefreshFailed),
                message: None,
                details: None,
            };
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    };
    finish(&app_state, &slot, response)
}

async fn encryption_key(State(app_state): State<AppState>, jar: CookieJar) -> Response {
    let app = &app_state;
    protect(app, &jar, "auth/encryption-key", move |identity| async move {
        let key = generate_key();
        let escrow = KeyEscrow {
            user_id: identity.user_id.clone(),
            key: key.clone(),
        };
        let mut headers = HeaderMap::new();
        append_cookie(
            &mut headers,
            sealed_cookie(app, KEY_ESCROW_COOKIE, &escrow, KEY_ESCROW_TTL)?,
        )?;

        app.audit.record(
            AuditEvent::new(AuditLevel::Info, "encryption_key_generation", "auth/encryption-key")
                .user(identity.user_id)
                .result("success"),
        );
        Ok::<_, AppError>((headers, Json(EncryptionKeyResponse { encryption_key: key })).into_response())
    })
    .await
}

async fn change_password(
    State(app_state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Response {
    let app = &app_state;
    let jar_ref = &jar;
    protect(app, jar_ref, "auth/change-password", move |identity| async move {
        // The escrowed key is single-use, whatever the outcome.
        let mut headers = HeaderMap::new();
        append_cookie(&mut headers, removal_cookie(app, KEY_ESCROW_COOKIE))?;

        let response = match apply_password_change(app, jar_ref, &identity, payload).await {
            Ok(()) => (
                headers,
                Json(ChangePasswordResponse {
                    success: true,
                    message: "Password updated successfully".into(),
                }),
            )
                .into_response(),
            Err(e) => (headers, e).into_response(),
        };
        Ok::<_, AppError>(response)
    })
    .await
}

async fn apply_password_change(
    app: &AppState,
    jar: &CookieJar,
    identity: &Identity,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> AppResult<()> {
    let Json(request) =
        payload.map_err(|e| AppError::InvalidInput(format!("Invalid request body: {e}")))?;

    let (current, new) = if request.encrypted {
        let escrow: KeyEscrow = read_sealed(app, jar, KEY_ESCROW_COOKIE)
            .filter(|escrow: &KeyEscrow| escrow.user_id == identity.user_id)
            .ok_or_else(|| {
                AppError::InvalidInput("Encryption key missing or expired, request a new one".into())
            })?;
        (
            decode(&request.current_password, &escrow.key)?,
            decode(&request.new_password, &escrow.key)?,
        )
    } else {
        (request.current_password, request.new_password)
    };

    app.password_use_cases
        .change_password(&identity.user_id, &current, &new)
        .await
}

async fn signin(State(app_state): State<AppState>) -> AppResult<Response> {
    let request = app_state.session_accessor.begin_sign_in()?;

    let mut headers = HeaderMap::new();
    append_cookie(
        &mut headers,
        sealed_cookie(&app_state, SIGN_IN_COOKIE, &request.pending, SIGN_IN_TTL)?,
    )?;
    found(&request.authorization_url, headers)
}

/// Redirect target of the identity provider after sign-in.
pub async fn callback(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> AppResult<Response> {
    let pending: PendingSignIn = read_sealed(&app_state, &jar, SIGN_IN_COOKIE)
        .ok_or_else(|| AppError::InvalidInput("No sign-in in progress".into()))?;

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Identity provider returned an error");
        return Err(AppError::InvalidInput(format!("Sign-in failed: {error}")));
    }
    if params.state.as_deref() != Some(pending.state.as_str()) {
        return Err(AppError::InvalidInput("Sign-in state mismatch".into()));
    }
    let code = params
        .code
        .ok_or_else(|| AppError::InvalidInput("Missing authorization code".into()))?;

    let tokens = app_state
        .session_accessor
        .complete_sign_in(&code, &pending.code_verifier)
        .await?;
    let slot = SessionSlot::with_tokens(tokens);

    let context = app_state.session_accessor.get_context(&slot).await?;
    if let Some(claims) = &context.claims {
        tracing::info!(user_id = %claims.sub, "Signed in");
        app_state.audit.record(
            AuditEvent::new(AuditLevel::Info, "sign_in", "callback")
                .user(claims.sub.clone())
                .result("success"),
        );
    }

    let mut headers = HeaderMap::new();
    append_cookie(&mut headers, removal_cookie(&app_state, SIGN_IN_COOKIE))?;
    if let Some(cookie) = session_cookie(&app_state, &slot)? {
        append_cookie(&mut headers, cookie)?;
    }
    found("/", headers)
}

async fn signout(State(app_state): State<AppState>, jar: CookieJar) -> AppResult<Response> {
    let slot = read_session(&app_state, &jar);
    let location = app_state.session_accessor.sign_out_url(slot.id_token());

    let mut headers = HeaderMap::new();
    append_cookie(&mut headers, removal_cookie(&app_state, SESSION_COOKIE))?;
    app_state
        .audit
        .record(AuditEvent::new(AuditLevel::Info, "sign_out", "auth/signout").result("success"));
    found(&location, headers)
}

async fn reset_password(State(app_state): State<AppState>) -> AppResult<Response> {
    found(&app_state.config.idp.url("/reset-password"), HeaderMap::new())
}
