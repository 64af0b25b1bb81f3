//! Résumé serving by locator.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;

use jobdesk_blob::BlobError;

use crate::error::ApiError;
use crate::state::AppState;

/// Serve a stored résumé. The name is the locator with its `/uploads/`
/// prefix stripped by routing.
pub async fn serve_resume(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(ApiError::bad_request("Invalid resume name"));
    }

    let bytes = state.resumes.get(&name).await.map_err(|e| match e {
        BlobError::NotFound(_) => ApiError::not_found("Resume not found"),
        other => other.into(),
    })?;

    let content_type = if name.to_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    };

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(header::CACHE_CONTROL, "private, max-age=0")
        .body(Body::from(bytes))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {e}")))
}
