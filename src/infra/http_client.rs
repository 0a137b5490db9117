//! HTTP client factory with consistent timeout configuration.
//!
//! Every outbound client (identity provider, management API, audit sink) is
//! built here rather than with `reqwest::Client::new()`.

use reqwest::Client;
use std::time::Duration;

/// Default connect timeout (TCP handshake + TLS).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default request timeout (total request/response time).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Audit delivery is best effort and must not pile up behind a slow cluster.
pub const AUDIT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Build an HTTP client with default timeouts.
pub fn try_build_client() -> Result<Client, reqwest::Error> {
    try_build_client_with_timeout(DEFAULT_REQUEST_TIMEOUT)
}

pub fn try_build_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(timeout)
        .build()
}
