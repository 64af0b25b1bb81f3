//! Application handlers: apply, role-scoped listing, status updates.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use jobdesk_models::{
    Application, ApplicationId, ApplicationStatus, JobId, UserId,
};
use jobdesk_store::{ApplicationRepository, JobRepository, UserRepository};

use crate::auth::Principal;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::policy::{self, ApplicationView};
use crate::state::AppState;

/// Job fields attached to a seeker's application listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJobBrief {
    pub id: JobId,
    pub title: String,
    pub company: String,
}

/// Applicant fields attached to a recruiter's incoming listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantBrief {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Job fields attached to a recruiter's incoming listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingJobBrief {
    pub id: JobId,
    pub title: String,
}

/// One entry in a seeker's listing. `job` is `None` when the posting was
/// deleted after the application was submitted.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyApplicationEntry {
    pub id: ApplicationId,
    pub job: Option<AppliedJobBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry in a recruiter's incoming listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingApplicationEntry {
    pub id: ApplicationId,
    pub job: Option<IncomingJobBrief>,
    pub applicant: Option<ApplicantBrief>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role-scoped listing payload.
#[derive(Serialize)]
#[serde(untagged)]
pub enum ApplicationListing {
    Mine(Vec<MyApplicationEntry>),
    Incoming(Vec<IncomingApplicationEntry>),
}

/// Status update request. The status arrives as a string and is validated
/// against the enumeration before anything is loaded.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Submit an application: multipart form with `jobId`, optional
/// `coverLetter`, and either a `resume` file (stored through the blob
/// store) or a pre-existing `resumeUrl`.
///
/// Any authenticated principal may apply; the uniqueness of
/// `(job, applicant)` is the only gate. The posting itself is not required
/// to exist.
pub async fn apply(
    State(state): State<AppState>,
    principal: Principal,
    mut multipart: Multipart,
) -> ApiResult<Json<Application>> {
    let mut job_id: Option<String> = None;
    let mut cover_letter: Option<String> = None;
    let mut resume_url: Option<String> = None;
    let mut resume_locator: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed form data: {e}")))?
    {
        match field.name() {
            Some("jobId") => {
                job_id = Some(field.text().await.map_err(bad_field)?);
            }
            Some("coverLetter") => {
                cover_letter = Some(field.text().await.map_err(bad_field)?);
            }
            Some("resumeUrl") => {
                resume_url = Some(field.text().await.map_err(bad_field)?);
            }
            Some("resume") => {
                let file_name = field
                    .file_name()
                    .unwrap_or("resume")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_field)?;
                if !bytes.is_empty() {
                    resume_locator = Some(state.resumes.put(&file_name, &bytes).await?);
                }
            }
            _ => {}
        }
    }

    let job_id = job_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("jobId is required"))?;

    // An uploaded file wins over a caller-supplied locator
    let resume_url = resume_locator.or(resume_url.filter(|s| !s.is_empty()));
    let cover_letter = cover_letter.filter(|s| !s.is_empty());

    let application = ApplicationRepository::new(state.store.clone())
        .create(
            JobId::from_string(job_id),
            principal.id.clone(),
            cover_letter,
            resume_url,
        )
        .await
        .map_err(|e| {
            if e.is_duplicate() {
                ApiError::Conflict("Already applied".to_string())
            } else {
                e.into()
            }
        })?;

    metrics::record_application_submitted();
    info!(
        application_id = %application.id,
        job_id = %application.job,
        applicant = %principal.id,
        "Application submitted"
    );

    Ok(Json(application))
}

fn bad_field(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::bad_request(format!("Malformed form data: {e}"))
}

/// List applications. The role decides the view: seekers get their own
/// applications, recruiters get applications to the jobs they posted.
pub async fn list_applications(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<ApplicationListing>> {
    let applications = ApplicationRepository::new(state.store.clone());
    let jobs = JobRepository::new(state.store.clone());

    match policy::application_view(&principal) {
        ApplicationView::Own => {
            let mine = applications.list_by_applicant(&principal.id).await?;

            let mut out = Vec::with_capacity(mine.len());
            for app in mine {
                let job = jobs.get(&app.job).await?.map(|j| AppliedJobBrief {
                    id: j.id,
                    title: j.title,
                    company: j.company,
                });
                out.push(MyApplicationEntry {
                    id: app.id,
                    job,
                    resume_url: app.resume_url,
                    cover_letter: app.cover_letter,
                    status: app.status,
                    created_at: app.created_at,
                    updated_at: app.updated_at,
                });
            }
            Ok(Json(ApplicationListing::Mine(out)))
        }
        ApplicationView::Incoming => {
            let owned = jobs.ids_by_owner(&principal.id).await?;
            let incoming = applications.list_by_jobs(&owned).await?;

            let users = UserRepository::new(state.store.clone());
            let mut out = Vec::with_capacity(incoming.len());
            for app in incoming {
                let job = jobs.get(&app.job).await?.map(|j| IncomingJobBrief {
                    id: j.id,
                    title: j.title,
                });
                let applicant = users.get(&app.applicant).await?.map(|u| ApplicantBrief {
                    id: u.id,
                    name: u.name,
                    email: u.email,
                });
                out.push(IncomingApplicationEntry {
                    id: app.id,
                    job,
                    applicant,
                    resume_url: app.resume_url,
                    cover_letter: app.cover_letter,
                    status: app.status,
                    created_at: app.created_at,
                    updated_at: app.updated_at,
                });
            }
            Ok(Json(ApplicationListing::Incoming(out)))
        }
    }
}

/// Update an application's status. Only the owner of the application's job
/// may drive the status, and the value is set unconditionally: no
/// transition table, repeats are no-ops, last writer wins.
pub async fn update_application_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Application>> {
    let status: ApplicationStatus = payload
        .status
        .parse()
        .map_err(|e: jobdesk_models::ParseStatusError| ApiError::bad_request(e.to_string()))?;

    let id = ApplicationId::from_string(id);
    let applications = ApplicationRepository::new(state.store.clone());

    let application = applications
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    let job = JobRepository::new(state.store.clone())
        .get(&application.job)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if !policy::can_update_application_status(&principal, &job) {
        return Err(ApiError::forbidden("Not allowed"));
    }

    let updated = applications
        .update_status(&id, status)
        .await?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    metrics::record_status_change(status.as_str());

    Ok(Json(updated))
}
