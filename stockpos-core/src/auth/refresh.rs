//! Single-flight session refresh
//!
//! When a request fails authentication, the caller asks the orchestrator for
//! a refresh outcome. The first caller starts the refresh on its own task;
//! every caller arriving while it runs is queued and released in arrival
//! order once the outcome is known. Each caller then replays its own request
//! at most once.

use super::session::{SessionManager, CSRF_PATH, REFRESH_PATH};
use crate::config::RouteConfig;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::navigation::{guard::login_redirect, Navigator};
use crate::telemetry::metrics::{record_refresh, record_refresh_waiter};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
}

/// Result of a refresh attempt as seen by a waiting request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    Failed,
}

impl RefreshOutcome {
    fn as_str(self) -> &'static str {
        match self {
            RefreshOutcome::Refreshed => "success",
            RefreshOutcome::Failed => "failure",
        }
    }
}

/// What a refresh actually does, and what happens when it fails
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshHandler: Send + Sync {
    /// Renew the session credentials
    async fn refresh(&self) -> Result<()>;

    /// Called once per failed refresh, before queued requests are released
    async fn on_refresh_failed(&self);
}

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

impl RefreshState {
    /// Back to idle, handing the queued senders to the caller
    fn settle(&mut self) -> VecDeque<oneshot::Sender<RefreshOutcome>> {
        self.in_flight = false;
        std::mem::take(&mut self.waiters)
    }
}

fn release(waiters: VecDeque<oneshot::Sender<RefreshOutcome>>, outcome: RefreshOutcome) {
    for waiter in waiters {
        // A waiter that went away no longer cares.
        let _ = waiter.send(outcome);
    }
}

/// Settles the state as failed if the refresh task ends without settling
struct SettleGuard {
    state: Arc<Mutex<RefreshState>>,
    armed: bool,
}

impl SettleGuard {
    fn settle(&mut self, outcome: RefreshOutcome) {
        self.armed = false;
        let waiters = self.state.lock().settle();
        debug!(waiters = waiters.len(), outcome = outcome.as_str(), "refresh settled");
        release(waiters, outcome);
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!("refresh task ended without an outcome");
            self.settle(RefreshOutcome::Failed);
        }
    }
}

pub struct RefreshOrchestrator {
    handler: Arc<dyn RefreshHandler>,
    state: Arc<Mutex<RefreshState>>,
}

impl RefreshOrchestrator {
    pub fn new(handler: Arc<dyn RefreshHandler>) -> Self {
        Self {
            handler,
            state: Arc::new(Mutex::new(RefreshState::default())),
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        if self.state.lock().in_flight {
            RefreshPhase::Refreshing
        } else {
            RefreshPhase::Idle
        }
    }

    /// Number of requests waiting on the current refresh
    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Wait for the outcome of the current refresh, starting one if idle.
    ///
    /// The refresh runs on a separate task: dropping the returned future
    /// does not cancel it.
    pub async fn await_refresh(&self) -> RefreshOutcome {
        let (tx, rx) = oneshot::channel();
        let start = {
            let mut state = self.state.lock();
            state.waiters.push_back(tx);
            !std::mem::replace(&mut state.in_flight, true)
        };

        if start {
            self.spawn_refresh();
        } else {
            record_refresh_waiter();
        }

        rx.await.unwrap_or(RefreshOutcome::Failed)
    }

    fn spawn_refresh(&self) {
        let handler = self.handler.clone();
        let mut guard = SettleGuard {
            state: self.state.clone(),
            armed: true,
        };

        tokio::spawn(async move {
            debug!("session refresh started");
            // A panicking refresh surfaces as a join error and fails like any other.
            let attempt = {
                let handler = handler.clone();
                tokio::spawn(async move { handler.refresh().await }).await
            };
            let outcome = match attempt {
                Ok(Ok(())) => {
                    info!("session refreshed");
                    RefreshOutcome::Refreshed
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "session refresh failed");
                    handler.on_refresh_failed().await;
                    RefreshOutcome::Failed
                }
                Err(e) => {
                    warn!(error = %e, "session refresh aborted");
                    handler.on_refresh_failed().await;
                    RefreshOutcome::Failed
                }
            };
            record_refresh(outcome.as_str());
            guard.settle(outcome);
        });
    }
}

/// Refresh against the backend session endpoints
pub struct SessionRefresher {
    session: Arc<SessionManager>,
    navigator: Arc<dyn Navigator>,
    routes: RouteConfig,
}

impl SessionRefresher {
    pub fn new(
        session: Arc<SessionManager>,
        navigator: Arc<dyn Navigator>,
        routes: RouteConfig,
    ) -> Self {
        Self {
            session,
            navigator,
            routes,
        }
    }
}

#[async_trait]
impl RefreshHandler for SessionRefresher {
    async fn refresh(&self) -> Result<()> {
        let http = self.session.http();
        // The refresh call is an unsafe verb; make sure a CSRF cookie exists.
        http.send(&ApiRequest::get(CSRF_PATH)).await?;
        let request = ApiRequest::post(REFRESH_PATH).json(&serde_json::json!({}))?;
        http.send(&request).await?;
        Ok(())
    }

    async fn on_refresh_failed(&self) {
        let _ = self.session.end_remote_session().await;
        self.session.clear();

        let target = login_redirect(&self.routes, self.navigator.current_url().as_deref());
        info!(target = %target, "session expired, redirecting to login");
        self.navigator.navigate(&target);
    }
}
