use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// How the most recent refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    /// The server refused the refresh and the unauthorized handler ran.
    Rejected,
    /// An ahead-of-time refresh did not go through. The session may still be
    /// valid, so authentication is left as it was.
    Abandoned,
}

/// Client-side view of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshState {
    pub is_authenticated: bool,
    pub is_refreshing: bool,
    pub last_outcome: Option<RefreshOutcome>,
}

/// Shared, cloneable handle to one client's [`RefreshState`].
///
/// Every clone observes the same state. Only the coordinator flips
/// `is_refreshing`; embedders read snapshots or subscribe to changes.
#[derive(Debug, Clone)]
pub struct RefreshStateHandle {
    tx: Arc<watch::Sender<RefreshState>>,
}

impl Default for RefreshStateHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshStateHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RefreshState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> RefreshState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.tx.subscribe()
    }

    /// Atomically claims the refresh slot.
    ///
    /// Returns `true` when the caller became the refresher. The check and the
    /// set happen under the channel lock, before anything is awaited.
    pub fn try_begin_refresh(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.is_refreshing {
                false
            } else {
                state.is_refreshing = true;
                true
            }
        })
    }

    /// Releases the refresh slot and records the outcome. Wakes all waiters.
    pub fn finish_refresh(&self, outcome: RefreshOutcome) {
        self.tx.send_modify(|state| {
            state.is_refreshing = false;
            state.last_outcome = Some(outcome);
            match outcome {
                RefreshOutcome::Refreshed => state.is_authenticated = true,
                RefreshOutcome::Rejected => state.is_authenticated = false,
                RefreshOutcome::Abandoned => {}
            }
        });
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.tx.send_if_modified(|state| {
            if state.is_authenticated == authenticated {
                false
            } else {
                state.is_authenticated = authenticated;
                true
            }
        });
    }

    /// Waits until no refresh is in flight, or `timeout` elapses.
    ///
    /// Returns the state observed when the wait ended.
    pub async fn wait_for_refresh(&self, timeout: Duration) -> RefreshState {
        let mut rx = self.tx.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(|state| !state.is_refreshing)).await {
            Ok(Ok(state)) => *state,
            _ => self.snapshot(),
        }
    }
}
