use authgate_types::SessionClaims;
use serde::{Deserialize, Serialize};

/// Tokens obtained from the identity provider for one browser session.
///
/// Serialized and sealed into the session cookie; never stored server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub id_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Access token expiry (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Per-request view of the session cookie.
///
/// `rotated` is set when the tokens were replaced during the request, so the
/// response has to carry a fresh cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSlot {
    pub tokens: Option<SessionTokens>,
    pub rotated: bool,
}

impl SessionSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: SessionTokens) -> Self {
        Self {
            tokens: Some(tokens),
            rotated: false,
        }
    }

    /// Replace the tokens and mark the slot for rewriting.
    pub fn rotate(&mut self, tokens: SessionTokens) {
        self.tokens = Some(tokens);
        self.rotated = true;
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.as_ref().and_then(|t| t.refresh_token.as_deref())
    }

    pub fn id_token(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.id_token.as_str())
    }
}

/// What the session accessor knows about the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthContext {
    pub is_authenticated: bool,
    pub claims: Option<SessionClaims>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(claims: SessionClaims) -> Self {
        Self {
            is_authenticated: true,
            claims: Some(claims),
        }
    }
}

/// Pending sign-in, kept in a short-lived sealed cookie between
/// `/api/auth/signin` and `/api/callback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSignIn {
    pub state: String,
    pub code_verifier: String,
}

/// Where to send the browser to start signing in, plus what the callback
/// must check.
#[derive(Debug, Clone)]
pub struct SignInRequest {
    pub authorization_url: String,
    pub pending: PendingSignIn,
}
