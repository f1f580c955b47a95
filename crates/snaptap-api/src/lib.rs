//! Axum HTTP API server for SnapTap.
//!
//! This crate provides:
//! - Job submission and status polling endpoints
//! - An in-memory job store with per-job worker tasks
//! - File and ZIP delivery for completed items
//! - A TTL janitor that reaps expired jobs

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod packaging;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod worker;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::CleanupJanitor;
pub use state::AppState;
pub use store::{JobStore, ReadLease};
