//! Single-flight session refresh for outbound requests.
//!
//! `Idle --401--> Refreshing` for exactly one caller at a time. Callers that
//! hit a 401 while another refresh is in flight wait for it (bounded) and
//! re-issue their request. Every request is retried at most once; a retry
//! that is rejected again is handed back to the caller as-is.

use std::sync::Arc;
use std::time::Duration;

use authgate_types::StatusResponse;
use time::OffsetDateTime;

use crate::error::SdkError;
use crate::state::{RefreshOutcome, RefreshStateHandle};
use crate::transport::{ApiRequest, ApiResponse, Transport};

pub(crate) const STATUS_PATH: &str = "/api/auth/status";
pub(crate) const REFRESH_PATH: &str = "/api/auth/refresh";

/// How many times a request is re-issued after a refresh.
const MAX_RETRIES: u32 = 1;

/// Called once when a refresh fails and the user must sign in again.
pub type UnauthorizedHandler = Arc<dyn Fn() + Send + Sync>;

pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    state: RefreshStateHandle,
    on_unauthorized: Option<UnauthorizedHandler>,
    wait_timeout: Duration,
    refresh_window_secs: i64,
    proactive: bool,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        state: RefreshStateHandle,
        wait_timeout: Duration,
        refresh_window_secs: i64,
        proactive: bool,
    ) -> Self {
        Self {
            transport,
            state,
            on_unauthorized: None,
            wait_timeout,
            refresh_window_secs,
            proactive,
        }
    }

    pub fn with_unauthorized_handler(mut self, handler: UnauthorizedHandler) -> Self {
        self.on_unauthorized = Some(handler);
        self
    }

    pub fn state(&self) -> &RefreshStateHandle {
        &self.state
    }

    /// Sends `request`, refreshing the session ahead of time when it is close
    /// to expiry and once more if the server answers 401.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, SdkError> {
        if self.proactive {
            self.ensure_fresh().await;
        }
        self.dispatch(&request).await
    }

    /// Like [`Self::execute`] without the proactive status probe.
    pub async fn execute_without_probe(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse, SdkError> {
        self.dispatch(&request).await
    }

    /// Sends `request` exactly once, leaving a 401 to the caller.
    pub async fn execute_once(&self, request: ApiRequest) -> Result<ApiResponse, SdkError> {
        self.transport.send(&request).await
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, SdkError> {
        let mut retries = 0;
        loop {
            let response = self.transport.send(request).await?;
            if !response.is_unauthorized() || retries >= MAX_RETRIES {
                return Ok(response);
            }

            tracing::debug!(path = %request.path, "Request rejected with 401, refreshing session");
            retries += 1;
            self.recover_session().await?;
        }
    }

    /// Refreshes the session, or waits for the refresh another caller started.
    ///
    /// Fails only when a refresh was rejected and the unauthorized handler
    /// has run. A waiter whose refresher gave up claims the next refresh
    /// itself.
    pub async fn recover_session(&self) -> Result<(), SdkError> {
        for _ in 0..2 {
            if self.state.try_begin_refresh() {
                return self.refresh_now().await;
            }

            let state = self.state.wait_for_refresh(self.wait_timeout).await;
            if state.is_refreshing {
                // Timed out waiting; retry with whatever session we have.
                return Ok(());
            }
            match state.last_outcome {
                Some(RefreshOutcome::Rejected) => return Err(SdkError::RefreshFailed),
                Some(RefreshOutcome::Abandoned) => continue,
                Some(RefreshOutcome::Refreshed) | None => return Ok(()),
            }
        }
        Ok(())
    }

    async fn refresh_now(&self) -> Result<(), SdkError> {
        if self.perform_refresh().await {
            self.state.finish_refresh(RefreshOutcome::Refreshed);
            return Ok(());
        }
        self.state.finish_refresh(RefreshOutcome::Rejected);
        self.notify_unauthorized();
        Err(SdkError::RefreshFailed)
    }

    async fn perform_refresh(&self) -> bool {
        match self.transport.send(&ApiRequest::post_empty(REFRESH_PATH)).await {
            Ok(response) if response.is_success() => {
                tracing::info!("Session refreshed");
                true
            }
            Ok(response) => {
                tracing::warn!(status = response.status, "Session refresh rejected");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session refresh failed");
                false
            }
        }
    }

    /// Proactive refresh. Never fails the request it precedes.
    async fn ensure_fresh(&self) {
        let response = match self.transport.send(&ApiRequest::get(STATUS_PATH)).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::debug!(status = response.status, "Status probe not successful");
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Status probe failed");
                return;
            }
        };

        let status: StatusResponse = match serde_json::from_value(response.body) {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!(error = %e, "Status probe returned an unexpected body");
                return;
            }
        };
        if !status.is_authenticated {
            return;
        }
        self.state.set_authenticated(true);

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let Some(remaining) = status
            .claims
            .as_ref()
            .and_then(|claims| claims.seconds_until_expiry(now))
        else {
            return;
        };

        if remaining < self.refresh_window_secs {
            tracing::debug!(remaining, "Session close to expiry, refreshing ahead of time");
            if self.state.try_begin_refresh() {
                let outcome = if self.perform_refresh().await {
                    RefreshOutcome::Refreshed
                } else {
                    RefreshOutcome::Abandoned
                };
                self.state.finish_refresh(outcome);
            } else {
                self.state.wait_for_refresh(self.wait_timeout).await;
            }
        }
    }

    fn notify_unauthorized(&self) {
        tracing::warn!("Session could not be refreshed, sign-in required");
        if let Some(handler) = &self.on_unauthorized {
            handler();
        }
    }
}
