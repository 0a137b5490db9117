//! Request dispatch seam.
//!
//! The coordinator only needs "send this request, give me status and body",
//! so the HTTP stack lives behind [`Transport`]. [`HttpTransport`] is the
//! reqwest implementation; tests plug in scripted transports.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SdkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request relative to the server's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path including the `/api` prefix, e.g. `/api/auth/status`
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn post_empty(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: None,
        }
    }
}

/// Status and decoded body of a response.
///
/// Bodies that are not JSON are kept as a JSON string; empty bodies are `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, SdkError>;
}

#[cfg(feature = "client")]
pub use http::HttpTransport;

#[cfg(feature = "client")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{ApiRequest, ApiResponse, Method, Transport, parse_body};
    use crate::error::SdkError;

    /// reqwest transport with a cookie store, so the session cookie set by
    /// `/api/callback` and rotated by refreshes is replayed automatically.
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        base_url: String,
        client: reqwest::Client,
    }

    impl HttpTransport {
        pub fn new(base_url: &str) -> Result<Self, SdkError> {
            let client = reqwest::Client::builder()
                .cookie_store(true)
                .connect_timeout(Duration::from_secs(5))
                .timeout(Duration::from_secs(30))
                .build()?;

            Ok(Self {
                base_url: base_url.trim_end_matches('/').to_string(),
                client,
            })
        }
    }

    #[async_trait]
    impl Transport for HttpTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, SdkError> {
            let url = format!("{}{}", self.base_url, request.path);
            let mut builder = match request.method {
                Method::Get => self.client.get(&url),
                Method::Post => self.client.post(&url),
            };
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let text = response.text().await?;

            Ok(ApiResponse::new(status, parse_body(&text)))
        }
    }
}
