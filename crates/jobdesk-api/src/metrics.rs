//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;
use uuid::Uuid;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "jobdesk_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "jobdesk_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "jobdesk_http_requests_in_flight";

    // Domain metrics
    pub const JOBS_CREATED_TOTAL: &str = "jobdesk_jobs_created_total";
    pub const APPLICATIONS_SUBMITTED_TOTAL: &str = "jobdesk_applications_submitted_total";
    pub const APPLICATION_STATUS_CHANGES_TOTAL: &str =
        "jobdesk_application_status_changes_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "jobdesk_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a created posting.
pub fn record_job_created() {
    counter!(names::JOBS_CREATED_TOTAL).increment(1);
}

/// Record a submitted application.
pub fn record_application_submitted() {
    counter!(names::APPLICATIONS_SUBMITTED_TOTAL).increment(1);
}

/// Record an application status change.
pub fn record_status_change(status: &str) {
    let labels = [("status", status.to_string())];
    counter!(names::APPLICATION_STATUS_CHANGES_TOTAL, &labels).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize a path for metrics labels: replace UUID segments and upload
/// names with placeholders so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut after_uploads = false;

    for segment in path.split('/') {
        if after_uploads || Uuid::parse_str(segment).is_ok() {
            segments.push(":id".to_string());
        } else {
            segments.push(segment.to_string());
        }
        after_uploads = segment == "uploads";
    }

    segments.join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
