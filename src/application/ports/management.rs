use async_trait::async_trait;
use serde_json::Value;

use crate::app_error::AppResult;

/// Privileged user operations on the identity provider.
///
/// Every call authenticates with its own freshly issued management token.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// `Ok(false)` when the provider rejects the password. Token and network
    /// failures are errors.
    async fn verify_password(&self, user_id: &str, password: &str) -> AppResult<bool>;

    async fn update_password(&self, user_id: &str, password: &str) -> AppResult<()>;

    /// Full user record as the provider returns it.
    async fn get_user(&self, user_id: &str) -> AppResult<Value>;
}
