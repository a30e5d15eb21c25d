//! StockPOS Core - Inventory and point-of-sale client
//!
//! This crate provides the client side of the StockPOS backend: the
//! cookie session, the coordinated token refresh, route guards and the
//! typed inventory, sales and KPI API.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod navigation;
pub mod state;
pub mod telemetry;
pub mod views;

// Re-export commonly used types
pub use config::Config;
pub use error::{ClientError, Result};
pub use state::AppContext;
