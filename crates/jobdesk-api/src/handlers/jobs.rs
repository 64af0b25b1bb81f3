//! Job posting handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use jobdesk_models::{
    EmploymentType, Job, JobId, JobPatch, NewJob, PosterProfile, Salary, UserId,
};
use jobdesk_store::{JobFilter, JobRepository, UserRepository, DEFAULT_PAGE_LIMIT};

use crate::auth::Principal;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::policy;
use crate::state::AppState;

const MAX_PAGE_LIMIT: u32 = 200;

/// Listing query. All filters are optional and conjunctive.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsQuery {
    pub title: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    /// Comma-separated; a job matches only if it carries every listed skill.
    pub skills: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Job response with the poster resolved to a minimal public profile.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobWithPoster {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<Salary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
    /// `None` if the posting account no longer exists.
    pub posted_by: Option<PosterProfile>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobWithPoster {
    fn from_job(job: Job, posted_by: Option<PosterProfile>) -> Self {
        Self {
            id: job.id,
            title: job.title,
            company: job.company,
            location: job.location,
            description: job.description,
            skills: job.skills,
            salary: job.salary,
            employment_type: job.employment_type,
            posted_by,
            is_active: job.is_active,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Delete confirmation.
#[derive(Serialize)]
pub struct DeleteJobResponse {
    pub success: bool,
    pub message: String,
}

fn validate_pagination(page: u32, limit: u32) -> Result<(u32, u32), ApiError> {
    if page < 1 {
        return Err(ApiError::bad_request("page must be at least 1"));
    }
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }
    Ok((page, limit))
}

async fn resolve_poster(
    users: &UserRepository,
    id: &UserId,
) -> ApiResult<Option<PosterProfile>> {
    Ok(users.get(id).await?.map(|u| u.poster_profile()))
}

/// Create a posting. Recruiter-only; ownership is stamped server-side and
/// cannot be supplied by the payload.
pub async fn create_job(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<NewJob>,
) -> ApiResult<Json<Job>> {
    if !policy::can_create_job(&principal) {
        return Err(ApiError::forbidden("Only recruiters can post jobs"));
    }

    let job = Job::new(payload, principal.id.clone());
    let job = JobRepository::new(state.store.clone()).create(job).await?;

    metrics::record_job_created();
    info!(job_id = %job.id, posted_by = %principal.id, "Job posted");

    Ok(Json(job))
}

/// List postings, newest first. No authentication required.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Json<Vec<JobWithPoster>>> {
    let (page, limit) = validate_pagination(
        query.page.unwrap_or(1),
        query.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    )?;

    let skills = query
        .skills
        .map(|s| {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let filter = JobFilter {
        title: query.title,
        location: query.location,
        employment_type: query.employment_type,
        skills,
        page,
        limit,
    };

    let jobs = JobRepository::new(state.store.clone()).list(&filter).await?;

    let users = UserRepository::new(state.store.clone());
    let mut out = Vec::with_capacity(jobs.len());
    for job in jobs {
        let poster = resolve_poster(&users, &job.posted_by).await?;
        out.push(JobWithPoster::from_job(job, poster));
    }

    Ok(Json(out))
}

/// Get a single posting with its poster profile.
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobWithPoster>> {
    let job = JobRepository::new(state.store.clone())
        .get(&JobId::from_string(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    let users = UserRepository::new(state.store.clone());
    let poster = resolve_poster(&users, &job.posted_by).await?;

    Ok(Json(JobWithPoster::from_job(job, poster)))
}

/// Partially update a posting. Owner-only; `posted_by` is not patchable.
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
    Json(patch): Json<JobPatch>,
) -> ApiResult<Json<Job>> {
    let id = JobId::from_string(id);
    let repo = JobRepository::new(state.store.clone());

    let job = repo
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if !policy::can_modify_job(&principal, &job) {
        return Err(ApiError::forbidden("Not allowed"));
    }

    let updated = repo
        .update(&id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(updated))
}

/// Delete a posting. Owner-only. Applications to it are left in place.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    principal: Principal,
) -> ApiResult<Json<DeleteJobResponse>> {
    let id = JobId::from_string(id);
    let repo = JobRepository::new(state.store.clone());

    let job = repo
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if !policy::can_modify_job(&principal, &job) {
        return Err(ApiError::forbidden("Not allowed"));
    }

    repo.delete(&id).await?;

    Ok(Json(DeleteJobResponse {
        success: true,
        message: "Deleted".to_string(),
    }))
}
