//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` wires the real use cases to the in-memory mocks.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum_extra::extract::cookie::Cookie;
use secrecy::SecretString;

use crate::{
    adapters::http::{app_state::AppState, cookies::SESSION_COOKIE},
    application::use_cases::session::DEFAULT_REFRESH_WINDOW_SECS,
    domain::entities::session::SessionTokens,
    infra::{
        config::{AppConfig, AuditConfig, IdpConfig},
        crypto::SessionSealer,
    },
    test_utils::{InMemoryManagementApi, InMemorySessionAccessor, RecordingAuditSink},
    use_cases::{password::PasswordUseCases, session::SessionUseCases},
};

const TEST_COOKIE_SECRET: &str = "test-cookie-secret-0123456789abcdef";

pub fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        app_base_url: "http://localhost:3000".parse().unwrap(),
        cookie_secret: SecretString::new(TEST_COOKIE_SECRET.into()),
        cookie_secure: false,
        refresh_window_secs: DEFAULT_REFRESH_WINDOW_SECS,
        idp: IdpConfig {
            endpoint: "https://idp.test/".parse().unwrap(),
            app_id: "test-app".into(),
            app_secret: SecretString::new("test-app-secret".into()),
            m2m_app_id: None,
            m2m_app_secret: None,
            management_resource: "https://default.logto.app/api".into(),
            management_scope: "all".into(),
        },
        audit: AuditConfig {
            enabled: false,
            host: None,
            username: None,
            password: None,
            index: "authgate-%{+YYYY.MM.dd}".into(),
        },
    }
}

/// Session cookie carrying `tokens`, sealed for `state`.
pub fn session_cookie_for(state: &AppState, tokens: &SessionTokens) -> Cookie<'static> {
    let sealed = state.sealer.seal(SESSION_COOKIE, tokens).unwrap();
    Cookie::new(SESSION_COOKIE, sealed)
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let accessor = Arc::new(InMemorySessionAccessor::new().with_session("id-1", claims));
/// let app_state = TestAppStateBuilder::new()
///     .with_session_accessor(accessor.clone())
///     .build();
/// ```
pub struct TestAppStateBuilder {
    accessor: Arc<InMemorySessionAccessor>,
    management: Arc<InMemoryManagementApi>,
    audit: Arc<RecordingAuditSink>,
    config: AppConfig,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            accessor: Arc::new(InMemorySessionAccessor::new()),
            management: Arc::new(InMemoryManagementApi::new()),
            audit: Arc::new(RecordingAuditSink::new()),
            config: test_config(),
        }
    }

    pub fn with_session_accessor(mut self, accessor: Arc<InMemorySessionAccessor>) -> Self {
        self.accessor = accessor;
        self
    }

    pub fn with_management(mut self, management: Arc<InMemoryManagementApi>) -> Self {
        self.management = management;
        self
    }

    /// The recording sink the built state reports to.
    pub fn audit(&self) -> Arc<RecordingAuditSink> {
        self.audit.clone()
    }

    pub fn build(self) -> AppState {
        let sealer = SessionSealer::from_secret(&self.config.cookie_secret)
            .expect("Test cookie secret should be valid");

        let session_use_cases = SessionUseCases::new(
            self.accessor.clone(),
            self.audit.clone(),
            self.config.refresh_window_secs,
        );
        let password_use_cases =
            PasswordUseCases::new(self.management.clone(), self.audit.clone());

        AppState {
            config: Arc::new(self.config),
            session_use_cases: Arc::new(session_use_cases),
            password_use_cases: Arc::new(password_use_cases),
            session_accessor: self.accessor,
            management: self.management,
            audit: self.audit,
            sealer,
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
