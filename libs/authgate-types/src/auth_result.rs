use serde::{Deserialize, Serialize};

use crate::{ErrorCode, SessionClaims};

/// `user_id` tag for requests without a session.
pub const ANONYMOUS_USER_ID: &str = "anonymous";
/// `user_id` tag for sessions whose token is past `exp`.
pub const EXPIRED_USER_ID: &str = "expired";
/// `user_id` tag for sessions that could not be verified.
pub const ERROR_USER_ID: &str = "error";

/// Display information about the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl UserInfo {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            username: None,
            email: None,
            picture: None,
        }
    }

    /// Builds display info from ID token claims.
    ///
    /// The display name prefers `username`, then `name`, then `"unnamed"`.
    pub fn from_claims(claims: &SessionClaims) -> Self {
        let name = claims
            .username
            .clone()
            .or_else(|| claims.name.clone())
            .unwrap_or_else(|| "unnamed".to_string());

        Self {
            name,
            username: claims.username.clone(),
            email: claims.email.clone(),
            picture: claims.picture.clone(),
        }
    }
}

/// Normalized outcome of verifying a request's session.
///
/// Always fully populated so callers can render an identity even when the
/// caller is anonymous, expired or failed verification. `user_id` carries
/// either the subject ID or one of the `anonymous` / `expired` / `error` tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub is_authenticated: bool,
    pub user_id: String,
    pub user_info: UserInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
}

impl AuthResult {
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            user_id: ANONYMOUS_USER_ID.to_string(),
            user_info: UserInfo::named("guest"),
            error: None,
        }
    }

    pub fn expired() -> Self {
        Self {
            is_authenticated: false,
            user_id: EXPIRED_USER_ID.to_string(),
            user_info: UserInfo::named("session expired"),
            error: Some(ErrorCode::TokenExpired),
        }
    }

    pub fn error(code: ErrorCode) -> Self {
        Self {
            is_authenticated: false,
            user_id: ERROR_USER_ID.to_string(),
            user_info: UserInfo::named("verification error"),
            error: Some(code),
        }
    }

    pub fn authenticated(claims: &SessionClaims) -> Self {
        Self {
            is_authenticated: true,
            user_id: claims.sub.clone(),
            user_info: UserInfo::from_claims(claims),
            error: None,
        }
    }
}
