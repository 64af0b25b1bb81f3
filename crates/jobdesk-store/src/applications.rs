//! Application repository.

use tracing::info;

use jobdesk_models::{Application, ApplicationId, ApplicationStatus, JobId, UserId};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};

/// Repository for applications.
pub struct ApplicationRepository {
    client: StoreClient,
}

impl ApplicationRepository {
    /// Create a new application repository.
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Submit an application. The `(job, applicant)` uniqueness check and
    /// the insert happen under one writer lock, so concurrent submissions
    /// for the same pair cannot both succeed.
    pub async fn create(
        &self,
        job: JobId,
        applicant: UserId,
        cover_letter: Option<String>,
        resume_url: Option<String>,
    ) -> StoreResult<Application> {
        let mut state = self.client.state.write().await;

        let key = (job.clone(), applicant.clone());
        if state.applied.contains(&key) {
            return Err(StoreError::already_exists(format!(
                "application for job {job} by {applicant}"
            )));
        }

        let application = Application::new(job, applicant, cover_letter, resume_url);
        state.applied.insert(key);
        state
            .applications
            .insert(application.id.clone(), application.clone());

        info!(
            application_id = %application.id,
            job_id = %application.job,
            applicant = %application.applicant,
            "Created application"
        );
        Ok(application)
    }

    /// Get an application by ID.
    pub async fn get(&self, id: &ApplicationId) -> StoreResult<Option<Application>> {
        let state = self.client.state.read().await;
        Ok(state.applications.get(id).cloned())
    }

    /// All applications submitted by `applicant`, newest first.
    pub async fn list_by_applicant(&self, applicant: &UserId) -> StoreResult<Vec<Application>> {
        let state = self.client.state.read().await;
        let mut apps: Vec<Application> = state
            .applications
            .values()
            .filter(|a| &a.applicant == applicant)
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    /// All applications to any of `jobs`, newest first.
    pub async fn list_by_jobs(&self, jobs: &[JobId]) -> StoreResult<Vec<Application>> {
        let state = self.client.state.read().await;
        let mut apps: Vec<Application> = state
            .applications
            .values()
            .filter(|a| jobs.contains(&a.job))
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    /// Set the status unconditionally (last writer wins, no transition
    /// table). Returns the updated record, or `None` if it is absent.
    pub async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> StoreResult<Option<Application>> {
        let mut state = self.client.state.write().await;
        let Some(application) = state.applications.get_mut(id) else {
            return Ok(None);
        };
        application.set_status(status);
        info!(application_id = %id, status = %status, "Updated application status");
        Ok(Some(application.clone()))
    }

    /// Total number of applications for a `(job, applicant)` pair, for
    /// invariant checks in tests.
    pub async fn count_for(&self, job: &JobId, applicant: &UserId) -> StoreResult<usize> {
        let state = self.client.state.read().await;
        Ok(state
            .applications
            .values()
            .filter(|a| &a.job == job && &a.applicant == applicant)
            .count())
    }
}
