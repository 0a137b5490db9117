//! Audit delivery to an Elasticsearch-compatible document store.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::runtime::Handle;

use super::{config::AuditConfig, error::InfraError, http_client};
use crate::application::ports::audit::{AuditEvent, AuditSink, AuditStream};

const DATE_PLACEHOLDER: &str = "%{+YYYY.MM.dd}";

/// Build the sink described by the config. Disabled or host-less configs
/// get a sink that drops everything.
pub fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn AuditSink>, InfraError> {
    match (&config.host, config.enabled) {
        (Some(host), true) => {
            tracing::info!(host = %host, index = %config.index, "Audit log enabled");
            Ok(Arc::new(ElasticAuditSink::new(config, host.as_str())?))
        }
        _ => Ok(Arc::new(NoopAuditSink)),
    }
}

/// Daily index name: the date placeholder filled in, `suffix` appended, all
/// lowercase.
pub fn format_index_name(index: &str, suffix: &str, date: NaiveDate) -> String {
    let name = index.replacen(DATE_PLACEHOLDER, &date.format("%Y.%m.%d").to_string(), 1);
    format!("{name}{suffix}").to_lowercase()
}

pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

#[derive(Clone)]
pub struct ElasticAuditSink {
    client: Client,
    host: String,
    index: String,
    credentials: Option<(String, SecretString)>,
}

impl ElasticAuditSink {
    pub fn new(config: &AuditConfig, host: &str) -> Result<Self, InfraError> {
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            _ => None,
        };
        Ok(Self {
            client: http_client::try_build_client_with_timeout(http_client::AUDIT_REQUEST_TIMEOUT)?,
            host: host.trim_end_matches('/').to_string(),
            index: config.index.clone(),
            credentials,
        })
    }

    fn index_for(&self, event: &AuditEvent) -> String {
        let suffix = match event.stream {
            AuditStream::Server => "-server".to_string(),
            AuditStream::Diagnostic => format!("-{}", event.level.as_str()),
        };
        format_index_name(&self.index, &suffix, Utc::now().date_naive())
    }

    async fn deliver(self, index: String, event: AuditEvent) {
        let mut doc = match serde_json::to_value(&event) {
            Ok(Value::Object(doc)) => doc,
            Ok(_) | Err(_) => return,
        };
        let timestamp = event.timestamp.to_rfc3339();
        doc.insert("@timestamp".into(), Value::String(timestamp));

        let mut request = self
            .client
            .post(format!("{}/{}/_doc", self.host, index))
            .json(&doc);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password.expose_secret()));
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(
                    status = response.status().as_u16(),
                    index,
                    "Audit sink rejected record"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, index, "Audit sink unreachable");
            }
        }
    }
}

impl AuditSink for ElasticAuditSink {
    /// Fire and forget. Delivery failures are logged and dropped.
    fn record(&self, event: AuditEvent) {
        let Ok(handle) = Handle::try_current() else {
            tracing::debug!(event = %event.event, "No runtime, audit record dropped");
            return;
        };
        let index = self.index_for(&event);
        handle.spawn(self.clone().deliver(index, event));
    }
}
