use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::error::InfraError;
use crate::application::use_cases::session::DEFAULT_REFRESH_WINDOW_SECS;

/// Minimum length of `COOKIE_SECRET`.
const MIN_COOKIE_SECRET_LEN: usize = 32;

/// Identity provider settings.
pub struct IdpConfig {
    /// Base URL of the provider (e.g., "https://auth.example.com/")
    pub endpoint: Url,
    pub app_id: String,
    pub app_secret: SecretString,
    /// Machine-to-machine credentials for the management API. Optional: when
    /// absent only password changes and profile lookups fail.
    pub m2m_app_id: Option<String>,
    pub m2m_app_secret: Option<SecretString>,
    pub management_resource: String,
    pub management_scope: String,
}

impl IdpConfig {
    /// `path` appended to the endpoint without doubling the slash.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.as_str().trim_end_matches('/'), path)
    }
}

/// Audit sink settings.
pub struct AuditConfig {
    pub enabled: bool,
    pub host: Option<Url>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Index name; `%{+YYYY.MM.dd}` is replaced with the current date.
    pub index: String,
}

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    /// Public origin of this app; the OIDC redirect URI is derived from it.
    pub app_base_url: Url,
    pub cookie_secret: SecretString,
    pub cookie_secure: bool,
    pub refresh_window_secs: i64,
    pub idp: IdpConfig,
    pub audit: AuditConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid {
                    var: "CORS_ORIGIN",
                    reason: "not a valid header value",
                })?;

        let app_base_url: Url = get_env("APP_BASE_URL");
        let cookie_secret = SecretString::new(get_env::<String>("COOKIE_SECRET").into());
        if cookie_secret.expose_secret().len() < MIN_COOKIE_SECRET_LEN {
            return Err(InfraError::ConfigInvalid {
                var: "COOKIE_SECRET",
                reason: "must be at least 32 characters",
            });
        }
        let cookie_secure: bool = get_env_default("COOKIE_SECURE", true);
        let refresh_window_secs: i64 =
            get_env_default("SESSION_REFRESH_WINDOW_SECS", DEFAULT_REFRESH_WINDOW_SECS);

        let idp = IdpConfig {
            endpoint: get_env("IDP_ENDPOINT"),
            app_id: get_env("IDP_APP_ID"),
            app_secret: SecretString::new(get_env::<String>("IDP_APP_SECRET").into()),
            m2m_app_id: optional_env("IDP_M2M_APP_ID"),
            m2m_app_secret: optional_env("IDP_M2M_APP_SECRET")
                .map(|s| SecretString::new(s.into())),
            management_resource: get_env_default(
                "IDP_MANAGEMENT_RESOURCE",
                "https://default.logto.app/api".to_string(),
            ),
            management_scope: get_env_default("IDP_MANAGEMENT_SCOPE", "all".to_string()),
        };

        let audit = AuditConfig {
            enabled: get_env_default("ENABLE_AUDIT_LOG", false),
            host: optional_env("AUDIT_LOG_HOST")
                .map(|h| h.parse())
                .transpose()
                .map_err(|_| InfraError::ConfigInvalid {
                    var: "AUDIT_LOG_HOST",
                    reason: "not a valid URL",
                })?,
            username: optional_env("AUDIT_LOG_USERNAME"),
            password: optional_env("AUDIT_LOG_PASSWORD").map(|s| SecretString::new(s.into())),
            index: get_env_default("AUDIT_LOG_INDEX", "authgate-%{+YYYY.MM.dd}".to_string()),
        };

        Ok(Self {
            bind_addr,
            cors_origin,
            app_base_url,
            cookie_secret,
            cookie_secure,
            refresh_window_secs,
            idp,
            audit,
        })
    }

    /// Redirect URI registered with the provider.
    pub fn callback_url(&self) -> String {
        format!(
            "{}/api/callback",
            self.app_base_url.as_str().trim_end_matches('/')
        )
    }
}

/// Unset and empty variables both count as absent.
fn optional_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}
