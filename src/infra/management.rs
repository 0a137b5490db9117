//! Privileged calls to the identity provider's management API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use super::{config::IdpConfig, error::InfraError, http_client};
use crate::{
    app_error::{AppError, AppResult},
    application::ports::management::ManagementApi,
};

#[derive(Deserialize)]
struct ManagementToken {
    access_token: String,
}

struct M2mCredentials {
    app_id: String,
    app_secret: SecretString,
}

pub struct ManagementBridge {
    client: Client,
    endpoint: String,
    credentials: Option<M2mCredentials>,
    resource: String,
    scope: String,
}

impl ManagementBridge {
    pub fn new(idp: &IdpConfig) -> Result<Self, InfraError> {
        let credentials = match (&idp.m2m_app_id, &idp.m2m_app_secret) {
            (Some(app_id), Some(app_secret)) => Some(M2mCredentials {
                app_id: app_id.clone(),
                app_secret: app_secret.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            client: http_client::try_build_client()?,
            endpoint: idp.url(""),
            credentials,
            resource: idp.management_resource.clone(),
            scope: idp.management_scope.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Client-credentials token. Never cached: every bridge call gets its own.
    #[instrument(skip(self))]
    async fn get_management_api_token(&self) -> AppResult<String> {
        let Some(credentials) = &self.credentials else {
            tracing::error!("Management API credentials are not configured");
            return Err(AppError::Configuration(
                "IDP_M2M_APP_ID and IDP_M2M_APP_SECRET must be set".into(),
            ));
        };

        let response = self
            .client
            .post(self.url("/oidc/token"))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.app_id.as_str()),
                ("client_secret", credentials.app_secret.expose_secret()),
                ("resource", self.resource.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let details = error_payload(response).await;
            tracing::error!(status, details = %details, "Failed to obtain management API token");
            return Err(AppError::UpstreamUnavailable {
                message: format!("Failed to obtain management API token ({status})"),
                details: Some(details),
            });
        }

        let token = response
            .json::<ManagementToken>()
            .await
            .map_err(|e| AppError::upstream(format!("Failed to parse token response: {e}")))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl ManagementApi for ManagementBridge {
    #[instrument(skip(self, password))]
    async fn verify_password(&self, user_id: &str, password: &str) -> AppResult<bool> {
        let token = self.get_management_api_token().await?;
        let response = self
            .client
            .post(self.url(&format!("/api/users/{user_id}/password/verify")))
            .bearer_auth(token)
            .json(&json!({ "password": password }))
            .send()
            .await?;

        let ok = response.status().is_success();
        if !ok {
            tracing::warn!(status = response.status().as_u16(), "Password verification rejected");
        }
        Ok(ok)
    }

    #[instrument(skip(self, password))]
    async fn update_password(&self, user_id: &str, password: &str) -> AppResult<()> {
        let token = self.get_management_api_token().await?;
        let response = self
            .client
            .patch(self.url(&format!("/api/users/{user_id}/password")))
            .bearer_auth(token)
            .json(&json!({ "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let details = error_payload(response).await;
            tracing::error!(status, details = %details, "Password update rejected");
            return Err(AppError::PasswordUpdateFailed { details });
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> AppResult<Value> {
        let token = self.get_management_api_token().await?;
        let response = self
            .client
            .get(self.url(&format!("/api/users/{user_id}")))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(AppError::UpstreamUnavailable {
                message: format!("Failed to fetch user ({status})"),
                details: Some(error_payload(response).await),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::upstream(format!("Failed to parse user record: {e}")))
    }
}

/// Error body as JSON, or the raw text when it isn't JSON.
async fn error_payload(response: Response) -> Value {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}
