//! Typed backend API
//!
//! [`ApiClient`] adds the refresh protocol on top of the HTTP layer; the
//! domain clients shape requests and responses on top of it.

pub mod client;
pub mod inventory;
pub mod stats;

pub use client::ApiClient;
pub use inventory::InventoryApi;
pub use stats::{Kpis, Overview, StatsService};
