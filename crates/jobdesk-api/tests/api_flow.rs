//! End-to-end API tests against the in-process router.
//!
//! Every request goes through the full middleware stack and the real
//! store, so these cover the authorization gates, the apply-uniqueness
//! invariant and the status workflow as the client sees them.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use jobdesk_api::{create_router, ApiConfig, AppState};

const BOUNDARY: &str = "XjobdeskTestBoundaryX";

async fn test_app() -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ApiConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["*".to_string()],
        rate_limit_rps: 10_000,
        max_body_size: 10 * 1024 * 1024,
        jwt_secret: "test-secret".to_string(),
        upload_dir: dir.path().to_string_lossy().into_owned(),
        environment: "test".to_string(),
    };
    let state = AppState::new(config).await.unwrap();
    (create_router(state, None), dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn register(app: &Router, name: &str, email: &str, role: &str) -> (String, Value) {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "name": name,
                "email": email,
                "password": "password123",
                "role": role,
                "company": if role == "recruiter" { json!("Acme") } else { Value::Null },
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"].clone(),
    )
}

async fn create_job(app: &Router, token: &str, title: &str, skills: &[&str]) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/jobs",
            Some(token),
            json!({
                "title": title,
                "company": "Acme",
                "location": "Berlin",
                "description": "Build services",
                "skills": skills,
                "salary": { "min": 90000, "max": 130000 },
                "employmentType": "Full-time",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create job failed: {body}");
    body
}

fn apply_request(
    token: &str,
    job_id: &str,
    cover_letter: Option<&str>,
    resume: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();

    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"jobId\"\r\n\r\n{job_id}\r\n"
        )
        .as_bytes(),
    );
    if let Some(letter) = cover_letter {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"coverLetter\"\r\n\r\n{letter}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = resume {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/applications")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = test_app().await;
    let (status, body) = send(&app, get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_register_login_me() {
    let (app, _dir) = test_app().await;

    let (token, user) = register(&app, "Ada", "ada@example.com", "seeker").await;
    assert_eq!(user["role"], "seeker");
    assert!(user.get("passwordHash").is_none());

    // Duplicate email is a conflict
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "name": "Ada Again",
                "email": "ada@example.com",
                "password": "password123",
                "role": "seeker",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    // Wrong password is a uniform 401
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "ada@example.com", "password": "wrong-password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "ada@example.com", "password": "password123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    let (status, body) = send(&app, get_request("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");

    let (status, _) = send(&app, get_request("/api/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_request("/api/auth/me", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_job_ownership_gates() {
    let (app, _dir) = test_app().await;

    let (r1, r1_user) = register(&app, "Rita", "rita@acme.com", "recruiter").await;
    let (r2, _) = register(&app, "Remy", "remy@other.com", "recruiter").await;
    let (seeker, _) = register(&app, "Sam", "sam@example.com", "seeker").await;

    // Seekers cannot post jobs
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/jobs",
            Some(&seeker),
            json!({
                "title": "X", "company": "Acme", "location": "Berlin",
                "description": "d", "skills": [],
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Ownership is stamped server-side from the principal
    let job = create_job(&app, &r1, "Backend Engineer", &["rust"]).await;
    assert_eq!(job["postedBy"], r1_user["id"]);
    let job_id = job["id"].as_str().unwrap().to_string();

    // get resolves the poster to a minimal public profile
    let (status, body) = send(&app, get_request(&format!("/api/jobs/{job_id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["postedBy"]["name"], "Rita");
    assert_eq!(body["postedBy"]["company"], "Acme");

    // Non-owner updates are forbidden and change nothing
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/jobs/{job_id}"),
            Some(&r2),
            json!({ "title": "Hijacked" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = send(&app, get_request(&format!("/api/jobs/{job_id}"), None)).await;
    assert_eq!(body["title"], "Backend Engineer");

    // Owner patch overwrites only the provided keys
    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/jobs/{job_id}"),
            Some(&r1),
            json!({ "title": "Senior Backend Engineer" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Senior Backend Engineer");
    assert_eq!(body["company"], "Acme");
    assert_eq!(body["postedBy"], r1_user["id"]);

    // Delete follows the same gate
    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/jobs/{job_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {r2}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/jobs/{job_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {r1}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get_request(&format!("/api/jobs/{job_id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_application_scenario() {
    let (app, _dir) = test_app().await;

    let (recruiter, _) = register(&app, "Rita", "rita@acme.com", "recruiter").await;
    let (seeker, _) = register(&app, "Sam", "sam@example.com", "seeker").await;
    let (other, _) = register(&app, "Sue", "sue@example.com", "seeker").await;

    let job = create_job(&app, &recruiter, "Backend Engineer", &["rust"]).await;
    let job_id = job["id"].as_str().unwrap().to_string();

    // Apply with a cover letter and no resume
    let (status, application) = send(
        &app,
        apply_request(&seeker, &job_id, Some("I love Acme"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{application}");
    assert_eq!(application["status"], "Applied");
    assert_eq!(application["coverLetter"], "I love Acme");
    assert!(application.get("resumeUrl").is_none());
    let application_id = application["id"].as_str().unwrap().to_string();

    // Second apply for the same pair fails without creating a record
    let (status, body) = send(&app, apply_request(&seeker, &job_id, None, None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Already applied");

    let (_, listing) = send(&app, get_request("/api/applications", Some(&seeker))).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);

    // The job owner shortlists
    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/applications/{application_id}/status"),
            Some(&recruiter),
            json!({ "status": "Shortlisted" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Shortlisted");

    // An unrelated principal may not drive the status
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/applications/{application_id}/status"),
            Some(&other),
            json!({ "status": "Rejected" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Recruiter's incoming view carries applicant and job projections
    let (status, listing) = send(&app, get_request("/api/applications", Some(&recruiter))).await;
    assert_eq!(status, StatusCode::OK);
    let entries = listing.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["applicant"]["name"], "Sam");
    assert_eq!(entries[0]["applicant"]["email"], "sam@example.com");
    assert_eq!(entries[0]["job"]["title"], "Backend Engineer");
    assert_eq!(entries[0]["status"], "Shortlisted");
}

#[tokio::test]
async fn test_status_workflow_is_unordered_and_validated() {
    let (app, _dir) = test_app().await;

    let (recruiter, _) = register(&app, "Rita", "rita@acme.com", "recruiter").await;
    let (seeker, _) = register(&app, "Sam", "sam@example.com", "seeker").await;

    let job = create_job(&app, &recruiter, "Backend Engineer", &[]).await;
    let job_id = job["id"].as_str().unwrap().to_string();

    let (_, application) = send(&app, apply_request(&seeker, &job_id, None, None)).await;
    let application_id = application["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/applications/{application_id}/status");

    // Applied -> Rejected directly is legal (no transition table)
    let (status, body) = send(
        &app,
        json_request("PUT", &status_uri, Some(&recruiter), json!({ "status": "Rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Rejected");

    // Repeating a transition is idempotent
    let (status, body) = send(
        &app,
        json_request("PUT", &status_uri, Some(&recruiter), json!({ "status": "Viewed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Viewed");
    let (status, body) = send(
        &app,
        json_request("PUT", &status_uri, Some(&recruiter), json!({ "status": "Viewed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Viewed");

    // Values outside the enumeration are rejected before any load
    let (status, _) = send(
        &app,
        json_request("PUT", &status_uri, Some(&recruiter), json!({ "status": "Archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown application
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/applications/no-such-id/status",
            Some(&recruiter),
            json!({ "status": "Viewed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // No token
    let (status, _) = send(
        &app,
        json_request("PUT", &status_uri, None, json!({ "status": "Viewed" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listing_scoped_by_role() {
    let (app, _dir) = test_app().await;

    let (r1, _) = register(&app, "Rita", "rita@acme.com", "recruiter").await;
    let (r2, _) = register(&app, "Remy", "remy@other.com", "recruiter").await;
    let (s1, _) = register(&app, "Sam", "sam@example.com", "seeker").await;
    let (s2, _) = register(&app, "Sue", "sue@example.com", "seeker").await;

    let j1 = create_job(&app, &r1, "Job One", &[]).await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let j2 = create_job(&app, &r2, "Job Two", &[]).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    send(&app, apply_request(&s1, &j1, None, None)).await;
    send(&app, apply_request(&s1, &j2, None, None)).await;
    send(&app, apply_request(&s2, &j2, None, None)).await;

    // s1 sees exactly their two applications
    let (_, listing) = send(&app, get_request("/api/applications", Some(&s1))).await;
    let entries = listing.as_array().unwrap();
    assert_eq!(entries.len(), 2);

    // s2 sees exactly one
    let (_, listing) = send(&app, get_request("/api/applications", Some(&s2))).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);

    // r1 sees only applications to Job One
    let (_, listing) = send(&app, get_request("/api/applications", Some(&r1))).await;
    let entries = listing.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["job"]["title"], "Job One");

    // r2 sees both applications to Job Two
    let (_, listing) = send(&app, get_request("/api/applications", Some(&r2))).await;
    assert_eq!(listing.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_resume_upload_round_trip() {
    let (app, _dir) = test_app().await;

    let (recruiter, _) = register(&app, "Rita", "rita@acme.com", "recruiter").await;
    let (seeker, _) = register(&app, "Sam", "sam@example.com", "seeker").await;

    let job_id = create_job(&app, &recruiter, "Backend Engineer", &[]).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let pdf = b"%PDF-1.4 fake resume";
    let (status, application) = send(
        &app,
        apply_request(&seeker, &job_id, None, Some(("my resume.pdf", pdf))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{application}");

    let locator = application["resumeUrl"].as_str().unwrap().to_string();
    assert!(locator.starts_with("/uploads/"));
    assert!(locator.ends_with("-my-resume.pdf"));

    // The locator resolves back to the stored bytes
    let response = app
        .clone()
        .oneshot(get_request(&locator, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], pdf);

    // Unknown locators are 404
    let (status, _) = send(&app, get_request("/uploads/123-missing.pdf", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_orphaned_applications_survive_job_delete() {
    let (app, _dir) = test_app().await;

    let (recruiter, _) = register(&app, "Rita", "rita@acme.com", "recruiter").await;
    let (seeker, _) = register(&app, "Sam", "sam@example.com", "seeker").await;

    let job_id = create_job(&app, &recruiter, "Short-lived", &[]).await["id"]
        .as_str()
        .unwrap()
        .to_string();
    send(&app, apply_request(&seeker, &job_id, None, None)).await;

    // Deleting the job does not cascade to its applications
    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/jobs/{job_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {recruiter}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, listing) = send(&app, get_request("/api/applications", Some(&seeker))).await;
    let entries = listing.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0]["job"].is_null());

    // The recruiter no longer owns any job, so the incoming view is empty
    let (_, listing) = send(&app, get_request("/api/applications", Some(&recruiter))).await;
    assert!(listing.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_job_filters_and_pagination() {
    let (app, _dir) = test_app().await;

    let (recruiter, _) = register(&app, "Rita", "rita@acme.com", "recruiter").await;
    create_job(&app, &recruiter, "Python Dev", &["python"]).await;
    create_job(&app, &recruiter, "Platform Engineer", &["python", "go"]).await;
    create_job(&app, &recruiter, "Go Dev", &["go"]).await;

    // Set-containment: both skills required
    let (status, body) = send(&app, get_request("/api/jobs?skills=python,go", None)).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["title"], "Platform Engineer");

    // Single skill matches the two jobs carrying it
    let (_, body) = send(&app, get_request("/api/jobs?skills=python", None)).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Title is a case-insensitive substring match
    let (_, body) = send(&app, get_request("/api/jobs?title=dev", None)).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Exact employment type match
    let (_, body) = send(&app, get_request("/api/jobs?employmentType=Full-time", None)).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    // Poster profiles are resolved in listings too
    let (_, body) = send(&app, get_request("/api/jobs", None)).await;
    assert_eq!(body.as_array().unwrap()[0]["postedBy"]["name"], "Rita");

    // Pagination bounds
    let (status, _) = send(&app, get_request("/api/jobs?limit=0", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, get_request("/api/jobs?page=0", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = send(&app, get_request("/api/jobs?limit=2&page=2", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unauthenticated_requests_rejected() {
    let (app, _dir) = test_app().await;

    let (status, _) = send(&app, get_request("/api/applications", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/jobs", None, json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Listing and reading jobs stays public
    let (status, _) = send(&app, get_request("/api/jobs", None)).await;
    assert_eq!(status, StatusCode::OK);
}
