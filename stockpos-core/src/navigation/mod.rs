//! Navigation: route guards, the route table and the navigation sink

pub mod guard;
pub mod router;

use parking_lot::Mutex;

pub use guard::{auth_guard, login_redirect, role_guard, GuardDecision};
pub use router::{NavigationOutcome, Route, RouteGuard, RouteTable, Router};

/// Where navigation decisions are delivered
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Move to `url` (path plus optional query)
    fn navigate(&self, url: &str);

    /// The location currently shown, if any
    fn current_url(&self) -> Option<String>;
}

/// In-memory navigator that records every location it was sent to
#[derive(Debug, Default)]
pub struct NavigationLog {
    history: Mutex<Vec<String>>,
}

impl NavigationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `url` without going through the router
    pub fn starting_at(url: &str) -> Self {
        Self {
            history: Mutex::new(vec![url.to_string()]),
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }
}

impl Navigator for NavigationLog {
    fn navigate(&self, url: &str) {
        self.history.lock().push(url.to_string());
    }

    fn current_url(&self) -> Option<String> {
        self.history.lock().last().cloned()
    }
}
