//! Job repository and listing filters.

use tracing::info;

use jobdesk_models::{EmploymentType, Job, JobId, JobPatch, UserId};

use crate::client::StoreClient;
use crate::error::StoreResult;

/// Default page size for job listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 30;

/// Conjunctive listing filter. All fields are optional; a job must satisfy
/// every provided one.
///
/// `title` and `location` are case-insensitive substring matches; `skills`
/// is set-containment (a job matches only if it carries every requested
/// skill). Listing deliberately does not filter on `is_active`.
#[derive(Debug, Clone)]
pub struct JobFilter {
    pub title: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub skills: Vec<String>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            title: None,
            location: None,
            employment_type: None,
            skills: Vec::new(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl JobFilter {
    fn matches(&self, job: &Job) -> bool {
        if let Some(title) = &self.title {
            if !job.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !job.location.to_lowercase().contains(&location.to_lowercase()) {
                return false;
            }
        }
        if let Some(employment_type) = self.employment_type {
            if job.employment_type != Some(employment_type) {
                return false;
            }
        }
        if !self.skills.is_empty() && !job.has_all_skills(&self.skills) {
            return false;
        }
        true
    }
}

/// Repository for job postings.
pub struct JobRepository {
    client: StoreClient,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Insert a new posting.
    pub async fn create(&self, job: Job) -> StoreResult<Job> {
        let mut state = self.client.state.write().await;
        state.jobs.insert(job.id.clone(), job.clone());
        info!(job_id = %job.id, posted_by = %job.posted_by, "Created job");
        Ok(job)
    }

    /// Get a posting by ID.
    pub async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let state = self.client.state.read().await;
        Ok(state.jobs.get(id).cloned())
    }

    /// List postings matching `filter`, newest first, paginated.
    pub async fn list(&self, filter: &JobFilter) -> StoreResult<Vec<Job>> {
        let state = self.client.state.read().await;

        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|j| filter.matches(j))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let skip = (filter.page.saturating_sub(1) as usize) * filter.limit as usize;
        Ok(jobs
            .into_iter()
            .skip(skip)
            .take(filter.limit as usize)
            .collect())
    }

    /// Apply a partial update. Existence is re-checked under the writer
    /// lock; returns the updated posting, or `None` if it is gone.
    pub async fn update(&self, id: &JobId, patch: JobPatch) -> StoreResult<Option<Job>> {
        let mut state = self.client.state.write().await;
        let Some(job) = state.jobs.get_mut(id) else {
            return Ok(None);
        };
        job.apply_patch(patch);
        Ok(Some(job.clone()))
    }

    /// Remove a posting. Returns false if it did not exist. Applications to
    /// the posting are left in place; deletion does not cascade.
    pub async fn delete(&self, id: &JobId) -> StoreResult<bool> {
        let mut state = self.client.state.write().await;
        let removed = state.jobs.remove(id).is_some();
        if removed {
            info!(job_id = %id, "Deleted job");
        }
        Ok(removed)
    }

    /// IDs of all postings owned by `owner`.
    pub async fn ids_by_owner(&self, owner: &UserId) -> StoreResult<Vec<JobId>> {
        let state = self.client.state.read().await;
        Ok(state
            .jobs
            .values()
            .filter(|j| &j.posted_by == owner)
            .map(|j| j.id.clone())
            .collect())
    }
}
