use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Debug => "debug",
            AuditLevel::Info => "info",
            AuditLevel::Warn => "warn",
            AuditLevel::Error => "error",
        }
    }
}

/// Which index family a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStream {
    /// Request and route outcomes
    Server,
    /// Verifier diagnostics, indexed per level
    Diagnostic,
}

/// Structured audit record. Never carries passwords, keys or tokens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    #[serde(skip)]
    pub stream: AuditStream,
    pub level: AuditLevel,
    pub event: String,
    pub route: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,

    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(level: AuditLevel, event: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            stream: AuditStream::Server,
            level,
            event: event.into(),
            route: route.into(),
            user_id: None,
            result: None,
            fields: Map::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn diagnostic(
        level: AuditLevel,
        event: impl Into<String>,
        route: impl Into<String>,
    ) -> Self {
        Self {
            stream: AuditStream::Diagnostic,
            ..Self::new(level, event, route)
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

/// Receives audit records. Implementations must not block the caller and
/// must swallow their own delivery failures.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}
