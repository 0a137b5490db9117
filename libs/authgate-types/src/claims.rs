use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims carried by the identity provider's ID token.
///
/// Only the fields the gateway reasons about are typed; everything else the
/// provider sends is preserved in `extra` so `/auth/status` can echo it back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID at the identity provider)
    pub sub: String,

    /// Token expiration (Unix timestamp). Absent on malformed tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Token issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    /// Any other claims, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionClaims {
    /// Seconds left until `exp`, relative to `now`. `None` when `exp` is missing.
    pub fn seconds_until_expiry(&self, now: i64) -> Option<i64> {
        self.exp.map(|exp| exp - now)
    }
}
