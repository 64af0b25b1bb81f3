//! Axum HTTP API server.
//!
//! This crate provides:
//! - Bearer token auth (principal resolution + token issuance)
//! - The authorization policy and the application status workflow
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod policy;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
