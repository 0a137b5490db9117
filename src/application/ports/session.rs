use async_trait::async_trait;

use crate::{
    app_error::AppResult,
    domain::entities::session::{AuthContext, SessionSlot, SessionTokens, SignInRequest},
};

/// Reads and renews sessions issued by the identity provider.
#[async_trait]
pub trait SessionAccessor: Send + Sync {
    /// Authentication context of the current session. A slot without tokens
    /// is anonymous, not an error.
    async fn get_context(&self, slot: &SessionSlot) -> AppResult<AuthContext>;

    /// Exchange the refresh token for new tokens. On success the slot is
    /// rotated and the context of the new ID token is returned.
    async fn refresh(&self, slot: &mut SessionSlot) -> AppResult<AuthContext>;

    /// Start an authorization-code sign-in.
    fn begin_sign_in(&self) -> AppResult<SignInRequest>;

    /// Redeem the authorization code returned to the callback.
    async fn complete_sign_in(&self, code: &str, code_verifier: &str) -> AppResult<SessionTokens>;

    /// Where to send the browser to end the provider session.
    fn sign_out_url(&self, id_token_hint: Option<&str>) -> String;
}
