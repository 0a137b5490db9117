//! Session verification with proactive refresh.

use std::sync::Arc;

use authgate_types::{AuthResult, ErrorCode, StatusResponse};
use chrono::Utc;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        audit::{AuditEvent, AuditLevel, AuditSink},
        session::SessionAccessor,
    },
    domain::entities::session::{AuthContext, SessionSlot},
};

/// Sessions expiring within this many seconds are refreshed ahead of time.
pub const DEFAULT_REFRESH_WINDOW_SECS: i64 = 1800;

/// Branch taken by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyDecision {
    Anonymous,
    InvalidToken,
    Expired,
    Authenticated,
    Refreshed,
    RefreshFailed,
    Error,
}

impl VerifyDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyDecision::Anonymous => "anonymous",
            VerifyDecision::InvalidToken => "invalid_token",
            VerifyDecision::Expired => "expired",
            VerifyDecision::Authenticated => "authenticated",
            VerifyDecision::Refreshed => "refreshed",
            VerifyDecision::RefreshFailed => "refresh_failed",
            VerifyDecision::Error => "error",
        }
    }

    fn audit_level(&self) -> AuditLevel {
        match self {
            VerifyDecision::Anonymous => AuditLevel::Debug,
            VerifyDecision::Authenticated | VerifyDecision::Refreshed => AuditLevel::Info,
            VerifyDecision::InvalidToken
            | VerifyDecision::Expired
            | VerifyDecision::RefreshFailed => AuditLevel::Warn,
            VerifyDecision::Error => AuditLevel::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Verification {
    pub result: AuthResult,
    /// Latest context seen: the refreshed one when a refresh succeeded.
    pub context: Option<AuthContext>,
    pub decision: VerifyDecision,
}

impl Verification {
    fn new(result: AuthResult, context: Option<AuthContext>, decision: VerifyDecision) -> Self {
        Self {
            result,
            context,
            decision,
        }
    }

    fn exp(&self) -> Option<i64> {
        self.context
            .as_ref()
            .and_then(|c| c.claims.as_ref())
            .and_then(|c| c.exp)
    }
}

#[derive(Clone)]
pub struct SessionUseCases {
    accessor: Arc<dyn SessionAccessor>,
    audit: Arc<dyn AuditSink>,
    refresh_window_secs: i64,
}

impl SessionUseCases {
    pub fn new(
        accessor: Arc<dyn SessionAccessor>,
        audit: Arc<dyn AuditSink>,
        refresh_window_secs: i64,
    ) -> Self {
        Self {
            accessor,
            audit,
            refresh_window_secs,
        }
    }

    /// Verify the session behind `slot`. Never fails: accessor errors come
    /// back as an `"error"` result.
    pub async fn verify(&self, slot: &mut SessionSlot, route: &str) -> AuthResult {
        self.verify_with_context(slot, route).await.result
    }

    #[instrument(skip(self, slot))]
    pub async fn verify_with_context(&self, slot: &mut SessionSlot, route: &str) -> Verification {
        self.verify_at(slot, route, Utc::now().timestamp()).await
    }

    pub async fn verify_at(&self, slot: &mut SessionSlot, route: &str, now: i64) -> Verification {
        let verification = self.decide(slot, now).await;
        self.report(&verification, route, now);
        verification
    }

    async fn decide(&self, slot: &mut SessionSlot, now: i64) -> Verification {
        let context = match self.accessor.get_context(slot).await {
            Ok(context) => context,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read session context");
                return Verification::new(AuthResult::error(e.code()), None, VerifyDecision::Error);
            }
        };

        let claims = match (context.is_authenticated, &context.claims) {
            (true, Some(claims)) => claims.clone(),
            _ => {
                return Verification::new(
                    AuthResult::anonymous(),
                    Some(context),
                    VerifyDecision::Anonymous,
                );
            }
        };

        let Some(exp) = claims.exp else {
            return Verification::new(
                AuthResult::error(ErrorCode::InvalidToken),
                Some(context),
                VerifyDecision::InvalidToken,
            );
        };

        if exp < now {
            return Verification::new(AuthResult::expired(), Some(context), VerifyDecision::Expired);
        }

        if exp - now >= self.refresh_window_secs {
            return Verification::new(
                AuthResult::authenticated(&claims),
                Some(context),
                VerifyDecision::Authenticated,
            );
        }

        match self.accessor.refresh(slot).await {
            Ok(refreshed) => {
                if let (true, Some(new_claims)) = (refreshed.is_authenticated, &refreshed.claims) {
                    let result = AuthResult::authenticated(new_claims);
                    return Verification::new(result, Some(refreshed), VerifyDecision::Refreshed);
                }
                tracing::warn!(user_id = %claims.sub, "Refresh returned no session");
            }
            Err(e) => {
                tracing::warn!(user_id = %claims.sub, error = %e, "Proactive refresh failed");
            }
        }

        // The current token is still valid.
        Verification::new(
            AuthResult::authenticated(&claims),
            Some(context),
            VerifyDecision::RefreshFailed,
        )
    }

    fn report(&self, verification: &Verification, route: &str, now: i64) {
        let decision = verification.decision;
        let user_id = verification.result.user_id.as_str();
        let exp = verification.exp();

        tracing::info!(
            route,
            user_id,
            decision = decision.as_str(),
            exp = ?exp,
            "Session verified"
        );

        let mut event = AuditEvent::diagnostic(decision.audit_level(), "session_verification", route)
            .user(user_id)
            .result(decision.as_str());
        if let Some(exp) = exp {
            event = event.field("exp", exp).field("timeToExpire", exp - now);
        }
        self.audit.record(event);
    }

    /// Body of `GET /auth/status`. Runs the verifier, so sessions close to
    /// expiry are refreshed here too.
    pub async fn status(&self, slot: &mut SessionSlot) -> AppResult<StatusResponse> {
        let verification = self.verify_with_context(slot, "auth/status").await;
        if verification.decision == VerifyDecision::Error {
            return Err(AppError::Internal(
                "Failed to check authentication status".into(),
            ));
        }

        let is_authenticated = verification.result.is_authenticated;
        let claims = if is_authenticated {
            verification.context.and_then(|c| c.claims)
        } else {
            None
        };

        Ok(StatusResponse {
            is_authenticated,
            claims,
            error: None,
        })
    }

    /// Forced refresh for `POST /auth/refresh`.
    ///
    /// Uses the refresh token when the session has one; otherwise succeeds
    /// only if the current session is still valid.
    #[instrument(skip(self, slot))]
    pub async fn refresh(&self, slot: &mut SessionSlot) -> AppResult<AuthContext> {
        let context = if slot.refresh_token().is_some() {
            self.accessor.refresh(slot).await?
        } else {
            let context = self.accessor.get_context(slot).await?;
            let now = Utc::now().timestamp();
            let valid = context
                .claims
                .as_ref()
                .and_then(|c| c.exp)
                .is_some_and(|exp| exp >= now);
            if !valid {
                return Err(AppError::Unauthenticated);
            }
            context
        };

        let Some(claims) = context.claims.as_ref().filter(|_| context.is_authenticated) else {
            return Err(AppError::Unauthenticated);
        };

        self.audit.record(
            AuditEvent::new(AuditLevel::Info, "session_refresh", "auth/refresh")
                .user(claims.sub.clone())
                .result("success"),
        );
        Ok(context)
    }
}
