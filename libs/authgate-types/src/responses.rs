use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ErrorCode, SessionClaims};

/// Body of `GET /api/auth/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_authenticated: bool,

    #[serde(default)]
    pub claims: Option<SessionClaims>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of a successful `POST /api/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub success: bool,
}

/// Body of `GET /api/auth/encryption-key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionKeyResponse {
    /// Base64 of 32 random bytes, valid for a single password change.
    pub encryption_key: String,
}

/// Body of `POST /api/auth/change-password`.
///
/// When `encrypted` is set, both passwords are base64 ciphertext produced by
/// [`crate::encode`] with the key most recently issued to this session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,

    #[serde(default)]
    pub new_password: String,

    #[serde(default)]
    pub encrypted: bool,
}

/// Body of a successful `POST /api/auth/change-password`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordResponse {
    pub success: bool,
    pub message: String,
}

/// Error body shared by every authgate route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error
    pub error: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,

    /// Extra detail, e.g. the message of a failed protected handler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Upstream payload, e.g. the identity provider's rejection of a password update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}
