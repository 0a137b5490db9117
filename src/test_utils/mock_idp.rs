//! Local stand-in for the identity provider.
//!
//! Serves the token endpoint (all three grants) and the management user
//! endpoints on 127.0.0.1, so the real HTTP adapters can be exercised.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use secrecy::SecretString;
use serde_json::{Value, json};

use crate::infra::config::IdpConfig;

const SIGNING_KEY: &[u8] = b"mock-idp-signing-key";

/// HS256-signed token over arbitrary claims.
pub fn sign_id_token(claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .unwrap()
}

#[derive(Default)]
struct MockIdpState {
    token_requests: Mutex<HashMap<String, usize>>,
    last_client_credentials: Mutex<Option<HashMap<String, String>>>,
    passwords: Mutex<HashMap<String, String>>,
    update_failure: Mutex<Option<Value>>,
}

pub struct MockIdp {
    pub base_url: String,
    state: Arc<MockIdpState>,
}

impl MockIdp {
    pub const APP_ID: &'static str = "test-app";
    pub const APP_SECRET: &'static str = "test-app-secret";
    pub const M2M_APP_ID: &'static str = "test-m2m";
    pub const M2M_APP_SECRET: &'static str = "test-m2m-secret";
    pub const USER_ID: &'static str = "u_mock";
    pub const AUTH_CODE: &'static str = "good-code";
    pub const REFRESH_TOKEN: &'static str = "rt-valid";
    pub const ROTATED_REFRESH_TOKEN: &'static str = "rt-rotated";
    const MANAGEMENT_TOKEN: &'static str = "m2m-access-token";

    pub async fn start() -> Self {
        let state = Arc::new(MockIdpState::default());
        let app = Router::new()
            .route("/oidc/token", post(token))
            .route("/api/users/{id}", get(get_user))
            .route("/api/users/{id}/password", patch(update_password))
            .route("/api/users/{id}/password/verify", post(verify_password))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/"),
            state,
        }
    }

    pub fn idp_config(&self) -> IdpConfig {
        IdpConfig {
            endpoint: self.base_url.parse().unwrap(),
            app_id: Self::APP_ID.into(),
            app_secret: SecretString::new(Self::APP_SECRET.into()),
            m2m_app_id: Some(Self::M2M_APP_ID.into()),
            m2m_app_secret: Some(SecretString::new(Self::M2M_APP_SECRET.into())),
            management_resource: "https://default.logto.app/api".into(),
            management_scope: "all".into(),
        }
    }

    pub fn set_password(&self, user_id: &str, password: &str) {
        self.state
            .passwords
            .lock()
            .unwrap()
            .insert(user_id.to_string(), password.to_string());
    }

    pub fn password_of(&self, user_id: &str) -> Option<String> {
        self.state.passwords.lock().unwrap().get(user_id).cloned()
    }

    pub fn reject_updates(&self, details: Value) {
        *self.state.update_failure.lock().unwrap() = Some(details);
    }

    /// Token endpoint hits for one `grant_type`.
    pub fn token_requests(&self, grant_type: &str) -> usize {
        self.state
            .token_requests
            .lock()
            .unwrap()
            .get(grant_type)
            .copied()
            .unwrap_or(0)
    }

    pub fn last_client_credentials_form(&self) -> Option<HashMap<String, String>> {
        self.state.last_client_credentials.lock().unwrap().clone()
    }
}

fn user_tokens(refresh_token: &str) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "id_token": sign_id_token(&json!({
            "sub": MockIdp::USER_ID,
            "iat": now,
            "exp": now + 3600,
            "aud": MockIdp::APP_ID,
            "username": "mock-user",
            "email": "mock@example.com",
        })),
        "access_token": "user-access-token",
        "refresh_token": refresh_token,
        "token_type": "Bearer",
        "expires_in": 3600,
    })
}

fn oauth_error(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

async fn token(
    State(state): State<Arc<MockIdpState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let grant_type = form.get("grant_type").cloned().unwrap_or_default();
    *state
        .token_requests
        .lock()
        .unwrap()
        .entry(grant_type.clone())
        .or_default() += 1;

    let field = |name: &str| form.get(name).map(String::as_str);

    match grant_type.as_str() {
        "client_credentials" => {
            *state.last_client_credentials.lock().unwrap() = Some(form.clone());
            if field("client_id") != Some(MockIdp::M2M_APP_ID)
                || field("client_secret") != Some(MockIdp::M2M_APP_SECRET)
            {
                return oauth_error(StatusCode::UNAUTHORIZED, "invalid_client");
            }
            Json(json!({
                "access_token": MockIdp::MANAGEMENT_TOKEN,
                "token_type": "Bearer",
                "expires_in": 3600,
            }))
            .into_response()
        }
        "refresh_token" => {
            if field("client_id") != Some(MockIdp::APP_ID)
                || field("refresh_token") != Some(MockIdp::REFRESH_TOKEN)
            {
                return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant");
            }
            Json(user_tokens(MockIdp::ROTATED_REFRESH_TOKEN)).into_response()
        }
        "authorization_code" => {
            if field("code") != Some(MockIdp::AUTH_CODE) || field("code_verifier").is_none() {
                return oauth_error(StatusCode::BAD_REQUEST, "invalid_grant");
            }
            Json(user_tokens(MockIdp::REFRESH_TOKEN)).into_response()
        }
        _ => oauth_error(StatusCode::BAD_REQUEST, "unsupported_grant_type"),
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", MockIdp::MANAGEMENT_TOKEN))
}

async fn verify_password(
    State(state): State<Arc<MockIdpState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let stored = state.passwords.lock().unwrap().get(&id).cloned();
    if stored.is_some() && stored.as_deref() == body["password"].as_str() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "code": "session.invalid_credentials" })),
        )
            .into_response()
    }
}

async fn update_password(
    State(state): State<Arc<MockIdpState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(details) = state.update_failure.lock().unwrap().clone() {
        return (StatusCode::BAD_REQUEST, Json(details)).into_response();
    }
    let Some(password) = body["password"].as_str() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    state
        .passwords
        .lock()
        .unwrap()
        .insert(id.clone(), password.to_string());
    Json(json!({ "id": id })).into_response()
}

async fn get_user(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id != MockIdp::USER_ID {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": "entity.not_found" })),
        )
            .into_response();
    }
    Json(json!({
        "id": id,
        "username": "mock-user",
        "primaryEmail": "mock@example.com",
        "name": "Mock User",
        "avatar": null,
        "profile": { "nickname": "mocky" },
    }))
    .into_response()
}
