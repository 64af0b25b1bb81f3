//! API routes.

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::applications::{apply, list_applications, update_application_status};
use crate::handlers::auth::{login, me, register};
use crate::handlers::jobs::{create_job, delete_job, get_job, list_jobs, update_job};
use crate::handlers::uploads::serve_resume;
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me));

    let job_routes = Router::new()
        // Public reads
        .route("/jobs", get(list_jobs))
        .route("/jobs/:id", get(get_job))
        // Recruiter-side mutations (ownership enforced per handler)
        .route("/jobs", post(create_job))
        .route("/jobs/:id", put(update_job))
        .route("/jobs/:id", delete(delete_job));

    let application_routes = Router::new()
        // Multipart apply (resume upload goes through the blob store)
        .route("/applications", post(apply))
        // Role-scoped listing
        .route("/applications", get(list_applications))
        // Status workflow, driven by the posting's owner
        .route("/applications/:id/status", put(update_application_status));

    // Per-IP rate limiter for API routes
    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(job_routes)
        .merge(application_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    // Resume serving by locator (public, like the original /uploads statics)
    let upload_routes = Router::new().route("/uploads/:name", get(serve_resume));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(upload_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
