//! In-memory implementations of the application ports.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use authgate_types::SessionClaims;
use serde_json::{Value, json};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        audit::{AuditEvent, AuditSink},
        management::ManagementApi,
        session::SessionAccessor,
    },
    domain::entities::session::{
        AuthContext, PendingSignIn, SessionSlot, SessionTokens, SignInRequest,
    },
};

/// Claims for `sub` expiring at `exp`.
pub fn test_claims(sub: &str, exp: i64) -> SessionClaims {
    SessionClaims {
        sub: sub.to_string(),
        exp: Some(exp),
        username: Some(format!("{sub}-name")),
        email: Some(format!("{sub}@example.com")),
        ..Default::default()
    }
}

/// Tokens carrying `id_token` and a refresh token.
pub fn test_tokens(id_token: &str) -> SessionTokens {
    SessionTokens {
        id_token: id_token.to_string(),
        access_token: Some(format!("{id_token}-access")),
        refresh_token: Some(format!("{id_token}-refresh")),
        expires_at: None,
    }
}

// ============================================================================
// InMemorySessionAccessor
// ============================================================================

/// Session accessor keyed by ID token.
///
/// Unknown tokens read as anonymous. A refresh needs a refresh token in the
/// slot and a target configured with `with_refresh_to`.
#[derive(Default)]
pub struct InMemorySessionAccessor {
    sessions: Mutex<HashMap<String, SessionClaims>>,
    refresh_to: Mutex<Option<(String, SessionClaims)>>,
    /// Authorization codes accepted by `complete_sign_in`
    codes: Mutex<HashMap<String, SessionTokens>>,
    failing: bool,
    refresh_calls: AtomicUsize,
}

impl InMemorySessionAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(self, id_token: &str, claims: SessionClaims) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .insert(id_token.to_string(), claims);
        self
    }

    pub fn with_refresh_to(self, id_token: &str, claims: SessionClaims) -> Self {
        *self.refresh_to.lock().unwrap() = Some((id_token.to_string(), claims));
        self
    }

    /// Accept `code` at the callback and issue `tokens` for it.
    pub fn with_code(self, code: &str, tokens: SessionTokens) -> Self {
        self.codes.lock().unwrap().insert(code.to_string(), tokens);
        self
    }

    /// Every call fails as if the provider were unreachable.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn unavailable(&self) -> AppResult<()> {
        if self.failing {
            return Err(AppError::upstream("identity provider unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionAccessor for InMemorySessionAccessor {
    async fn get_context(&self, slot: &SessionSlot) -> AppResult<AuthContext> {
        self.unavailable()?;
        let Some(id_token) = slot.id_token() else {
            return Ok(AuthContext::anonymous());
        };
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(id_token)
            .cloned()
            .map(AuthContext::authenticated)
            .unwrap_or_default())
    }

    async fn refresh(&self, slot: &mut SessionSlot) -> AppResult<AuthContext> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.unavailable()?;
        if slot.refresh_token().is_none() {
            return Err(AppError::Unauthenticated);
        }

        let target = self.refresh_to.lock().unwrap().clone();
        let Some((id_token, claims)) = target else {
            return Err(AppError::upstream("refresh rejected"));
        };

        self.sessions
            .lock()
            .unwrap()
            .insert(id_token.clone(), claims.clone());
        slot.rotate(test_tokens(&id_token));
        Ok(AuthContext::authenticated(claims))
    }

    fn begin_sign_in(&self) -> AppResult<SignInRequest> {
        self.unavailable()?;
        Ok(SignInRequest {
            authorization_url: "https://idp.test/oidc/auth?state=test-state".to_string(),
            pending: PendingSignIn {
                state: "test-state".to_string(),
                code_verifier: "test-verifier".to_string(),
            },
        })
    }

    async fn complete_sign_in(&self, code: &str, _code_verifier: &str) -> AppResult<SessionTokens> {
        self.unavailable()?;
        self.codes
            .lock()
            .unwrap()
            .get(code)
            .cloned()
            .ok_or_else(|| AppError::upstream("invalid_grant"))
    }

    fn sign_out_url(&self, id_token_hint: Option<&str>) -> String {
        match id_token_hint {
            Some(hint) => format!("https://idp.test/oidc/session/end?id_token_hint={hint}"),
            None => "https://idp.test/oidc/session/end".to_string(),
        }
    }
}

// ============================================================================
// InMemoryManagementApi
// ============================================================================

#[derive(Default)]
pub struct InMemoryManagementApi {
    passwords: Mutex<HashMap<String, String>>,
    users: Mutex<HashMap<String, Value>>,
    update_failure: Option<Value>,
    unconfigured: bool,
    verify_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl InMemoryManagementApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(self, user_id: &str, password: &str) -> Self {
        self.passwords
            .lock()
            .unwrap()
            .insert(user_id.to_string(), password.to_string());
        self
    }

    pub fn with_user(self, user_id: &str, record: Value) -> Self {
        self.users
            .lock()
            .unwrap()
            .insert(user_id.to_string(), record);
        self
    }

    /// Updates fail with these provider details.
    pub fn failing_updates(mut self, details: Value) -> Self {
        self.update_failure = Some(details);
        self
    }

    /// Behave like a bridge without machine-to-machine credentials.
    pub fn unconfigured(mut self) -> Self {
        self.unconfigured = true;
        self
    }

    pub fn password_of(&self, user_id: &str) -> Option<String> {
        self.passwords.lock().unwrap().get(user_id).cloned()
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn configured(&self) -> AppResult<()> {
        if self.unconfigured {
            return Err(AppError::Configuration(
                "management API credentials are not configured".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ManagementApi for InMemoryManagementApi {
    async fn verify_password(&self, user_id: &str, password: &str) -> AppResult<bool> {
        self.configured()?;
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.password_of(user_id).as_deref() == Some(password))
    }

    async fn update_password(&self, user_id: &str, password: &str) -> AppResult<()> {
        self.configured()?;
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(details) = &self.update_failure {
            return Err(AppError::PasswordUpdateFailed {
                details: details.clone(),
            });
        }
        self.passwords
            .lock()
            .unwrap()
            .insert(user_id.to_string(), password.to_string());
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> AppResult<Value> {
        self.configured()?;
        self.users
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .ok_or_else(|| AppError::UpstreamUnavailable {
                message: "user not found".into(),
                details: Some(json!({ "code": "entity.not_found" })),
            })
    }
}

// ============================================================================
// RecordingAuditSink
// ============================================================================

/// Keeps every record in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_named(&self, name: &str) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event == name)
            .collect()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}
