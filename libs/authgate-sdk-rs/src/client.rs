//! Typed client for the authgate `/api` routes.

use std::sync::Arc;
use std::time::Duration;

use authgate_types::{
    ChangePasswordRequest, ChangePasswordResponse, EncryptionKeyResponse, ErrorResponse,
    MIN_PASSWORD_LENGTH, StatusResponse, encode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::coordinator::{RefreshCoordinator, STATUS_PATH};
use crate::error::SdkError;
use crate::state::RefreshStateHandle;
use crate::transport::{ApiRequest, ApiResponse, Transport};

const CHANGE_PASSWORD_PATH: &str = "/api/auth/change-password";
const DEFAULT_REFRESH_WINDOW_SECS: u64 = 1800;
const DEFAULT_REFRESH_WAIT_MS: u64 = 1000;

/// Configuration for the authgate client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the authgate server (e.g., "https://app.example.com")
    pub base_url: String,

    /// Refresh ahead of time when the session expires within this many
    /// seconds (default: 1800)
    pub refresh_window_seconds: Option<u64>,

    /// How long a request waits for someone else's refresh (default: 1000)
    pub refresh_wait_ms: Option<u64>,

    /// Probe `/api/auth/status` before each request
    pub proactive_refresh: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_window_seconds: None,
            refresh_wait_ms: None,
            proactive_refresh: true,
        }
    }

    fn validate(&self) -> Result<(), SdkError> {
        if self.base_url.is_empty() {
            return Err(SdkError::Config("base_url is required".into()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(SdkError::Config(
                "base_url must start with http:// or https://".into(),
            ));
        }
        if self.refresh_wait_ms == Some(0) {
            return Err(SdkError::Config("refresh_wait_ms must be positive".into()));
        }
        Ok(())
    }
}

/// authgate client.
///
/// All requests go through one [`RefreshCoordinator`], so concurrent calls
/// made through the same client share a single session refresh.
pub struct AuthgateClient {
    coordinator: RefreshCoordinator,
}

impl AuthgateClient {
    /// Create a client backed by reqwest.
    ///
    /// # Returns
    /// A configured `AuthgateClient` or an error if configuration is invalid.
    #[cfg(feature = "client")]
    pub fn new(config: ClientConfig) -> Result<Self, SdkError> {
        config.validate()?;
        let transport = crate::transport::HttpTransport::new(&config.base_url)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, SdkError> {
        config.validate()?;

        let window = config
            .refresh_window_seconds
            .unwrap_or(DEFAULT_REFRESH_WINDOW_SECS);
        let wait = config.refresh_wait_ms.unwrap_or(DEFAULT_REFRESH_WAIT_MS);

        let coordinator = RefreshCoordinator::new(
            transport,
            RefreshStateHandle::new(),
            Duration::from_millis(wait),
            i64::try_from(window).unwrap_or(i64::MAX),
            config.proactive_refresh,
        );

        Ok(Self { coordinator })
    }

    /// Register the callback run when the session cannot be refreshed,
    /// typically a redirect to `/api/auth/signin`.
    pub fn on_unauthorized(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.coordinator = self.coordinator.with_unauthorized_handler(Arc::new(handler));
        self
    }

    pub fn refresh_state(&self) -> RefreshStateHandle {
        self.coordinator.state().clone()
    }

    /// Current session status. Does not run the proactive probe.
    pub async fn status(&self) -> Result<StatusResponse, SdkError> {
        let response = self
            .coordinator
            .execute_without_probe(ApiRequest::get(STATUS_PATH))
            .await?;
        let status: StatusResponse = parse(response)?;
        self.coordinator
            .state()
            .set_authenticated(status.is_authenticated);
        Ok(status)
    }

    /// Fetch a fresh single-use obfuscation key.
    pub async fn encryption_key(&self) -> Result<String, SdkError> {
        let response = self
            .coordinator
            .execute(ApiRequest::get("/api/auth/encryption-key"))
            .await?;
        let body: EncryptionKeyResponse = parse(response)?;
        Ok(body.encryption_key)
    }

    /// Change the signed-in user's password.
    ///
    /// Inputs are checked locally first; nothing is sent for a password that
    /// the server would reject anyway. Both passwords are obfuscated with a
    /// key fetched for each submission.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<ChangePasswordResponse, SdkError> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(SdkError::InvalidInput(
                "Current password and new password are required".into(),
            ));
        }
        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SdkError::InvalidInput(format!(
                "New password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }

        // A submission rejected with 401 is re-sent after the session
        // refresh, under a newly fetched key.
        let mut response = self.submit_password_change(current_password, new_password).await?;
        if response.is_unauthorized() {
            self.coordinator.recover_session().await?;
            response = self.submit_password_change(current_password, new_password).await?;
        }
        parse(response)
    }

    async fn submit_password_change(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<ApiResponse, SdkError> {
        let key = self.encryption_key().await?;
        let body = ChangePasswordRequest {
            current_password: encode(current_password, &key)?,
            new_password: encode(new_password, &key)?,
            encrypted: true,
        };
        self.coordinator
            .execute_once(ApiRequest::post(
                CHANGE_PASSWORD_PATH,
                serde_json::to_value(&body)?,
            ))
            .await
    }

    /// Identity plus the provider's profile record.
    pub async fn profile(&self) -> Result<Value, SdkError> {
        let response = self
            .coordinator
            .execute(ApiRequest::get("/api/user/profile"))
            .await?;
        parse(response)
    }
}

fn parse<T: DeserializeOwned>(response: ApiResponse) -> Result<T, SdkError> {
    if response.is_success() {
        return Ok(serde_json::from_value(response.body)?);
    }

    let status = response.status;
    match serde_json::from_value::<ErrorResponse>(response.body) {
        Ok(error) => Err(SdkError::Api {
            status,
            code: error.code,
            message: error.message.unwrap_or(error.error),
        }),
        Err(_) => Err(SdkError::Api {
            status,
            code: None,
            message: format!("Request failed with status {status}"),
        }),
    }
}
