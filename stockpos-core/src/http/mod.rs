//! HTTP layer: request description, CSRF attachment and the cookie-aware client

pub mod client;
pub mod csrf;
pub mod request;

pub use client::{ApiResponse, HttpClient};
pub use request::{ApiRequest, FilePart, RequestBody};
