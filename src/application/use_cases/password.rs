use std::sync::Arc;

use authgate_types::MIN_PASSWORD_LENGTH;
use tracing::instrument;
use validator::Validate;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        audit::{AuditEvent, AuditLevel, AuditSink},
        management::ManagementApi,
    },
};

const ROUTE: &str = "auth/change-password";

#[derive(Validate)]
struct PasswordChange {
    #[validate(length(min = 1, message = "Current password and new password are required"))]
    current: String,

    #[validate(length(min = 1, message = "Current password and new password are required"))]
    new: String,
}

#[derive(Clone)]
pub struct PasswordUseCases {
    management: Arc<dyn ManagementApi>,
    audit: Arc<dyn AuditSink>,
}

impl PasswordUseCases {
    pub fn new(management: Arc<dyn ManagementApi>, audit: Arc<dyn AuditSink>) -> Self {
        Self { management, audit }
    }

    /// Verify `current_password`, then set `new_password`.
    ///
    /// The update is only attempted after the provider accepted the current
    /// password.
    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        validate_input(current_password, new_password)?;

        let verified = self
            .management
            .verify_password(user_id, current_password)
            .await?;
        if !verified {
            tracing::warn!(user_id, "Current password rejected");
            self.audit.record(
                AuditEvent::new(AuditLevel::Warn, "password_change", ROUTE)
                    .user(user_id)
                    .result("verification_failed"),
            );
            return Err(AppError::VerificationFailed);
        }

        if let Err(e) = self.management.update_password(user_id, new_password).await {
            tracing::error!(user_id, error = %e, "Password update failed after successful verification");
            self.audit.record(
                AuditEvent::new(AuditLevel::Error, "password_change", ROUTE)
                    .user(user_id)
                    .result("update_failed"),
            );
            return Err(e);
        }

        tracing::info!(user_id, "Password changed");
        self.audit.record(
            AuditEvent::new(AuditLevel::Info, "password_change", ROUTE)
                .user(user_id)
                .result("success"),
        );
        Ok(())
    }
}

fn validate_input(current: &str, new: &str) -> AppResult<()> {
    PasswordChange {
        current: current.to_string(),
        new: new.to_string(),
    }
    .validate()
    .map_err(|_| AppError::InvalidInput("Current password and new password are required".into()))?;

    if new.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "New password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}
