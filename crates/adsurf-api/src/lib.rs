//! Axum REST API over the ad-surface pipeline.
//!
//! This crate provides:
//! - Tuning configuration read and partial update
//! - Scan and insertion endpoints sharing one session video/logo pair
//! - Run serialisation with 409 on overlap, and cancellation
//! - Health check and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, SessionPair};
