//! Axum HTTP API server for video analysis jobs.
//!
//! This crate provides:
//! - Submission of base64 videos and polling of job progress and results
//! - Health and readiness checks
//! - Prometheus metrics

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
pub use state::AppState;
