use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::header::{HeaderName, REFERER, USER_AGENT},
    middleware::Next,
    response::Response,
};

use crate::{
    adapters::http::app_state::AppState,
    application::ports::audit::{AuditEvent, AuditLevel},
};

/// One audit record per request: method, path, status and timing.
///
/// Bodies and credentials are never read here.
pub async fn audit_middleware(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let (user_agent, referrer) = {
        let header = |name: HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        (header(USER_AGENT), header(REFERER))
    };

    let response = next.run(request).await;

    let status = response.status();
    let level = if status.is_server_error() {
        AuditLevel::Error
    } else if status.is_client_error() {
        AuditLevel::Warn
    } else {
        AuditLevel::Info
    };
    let route = path.trim_start_matches("/api/").to_string();

    let mut event = AuditEvent::new(level, "http_request", route)
        .field("method", method)
        .field("path", path)
        .field("status", status.as_u16())
        .field("responseTime", started.elapsed().as_millis() as u64);
    if let Some(ua) = user_agent {
        event = event.field("userAgent", ua);
    }
    if let Some(referrer) = referrer {
        event = event.field("referrer", referrer);
    }
    app_state.audit.record(event);

    response
}
