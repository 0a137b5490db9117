use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    application::ports::{audit::AuditSink, management::ManagementApi, session::SessionAccessor},
    infra::{config::AppConfig, crypto::SessionSealer},
    use_cases::{password::PasswordUseCases, session::SessionUseCases},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session_use_cases: Arc<SessionUseCases>,
    pub password_use_cases: Arc<PasswordUseCases>,
    pub session_accessor: Arc<dyn SessionAccessor>,
    pub management: Arc<dyn ManagementApi>,
    pub audit: Arc<dyn AuditSink>,
    pub sealer: SessionSealer,
}

impl FromRef<AppState> for Arc<SessionUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.session_use_cases.clone()
    }
}
