use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    application::ports::{management::ManagementApi, session::SessionAccessor},
    infra::{
        audit::build_audit_sink, config::AppConfig, crypto::SessionSealer,
        management::ManagementBridge, oidc_session::OidcSessionAccessor,
    },
    use_cases::{password::PasswordUseCases, session::SessionUseCases},
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;

    let sealer = SessionSealer::from_secret(&config.cookie_secret)?;
    let audit = build_audit_sink(&config.audit)?;

    let session_accessor: Arc<dyn SessionAccessor> =
        Arc::new(OidcSessionAccessor::new(&config.idp, &config.app_base_url)?);
    let management: Arc<dyn ManagementApi> = Arc::new(ManagementBridge::new(&config.idp)?);
    if config.idp.m2m_app_id.is_none() || config.idp.m2m_app_secret.is_none() {
        tracing::warn!("IDP_M2M_APP_ID/IDP_M2M_APP_SECRET not set, password changes will fail");
    }

    let session_use_cases = SessionUseCases::new(
        session_accessor.clone(),
        audit.clone(),
        config.refresh_window_secs,
    );
    let password_use_cases = PasswordUseCases::new(management.clone(), audit.clone());

    Ok(AppState {
        config: Arc::new(config),
        session_use_cases: Arc::new(session_use_cases),
        password_use_cases: Arc::new(password_use_cases),
        session_accessor,
        management,
        audit,
        sealer,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "authgate=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), skipped when app.log can't be created
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(Arc::new(file))
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
