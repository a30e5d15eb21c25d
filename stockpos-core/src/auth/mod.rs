//! Session ownership and the refresh protocol

pub mod refresh;
pub mod session;

pub use refresh::{
    RefreshHandler, RefreshOrchestrator, RefreshOutcome, RefreshPhase, SessionRefresher,
};
pub use session::{Session, SessionManager};
