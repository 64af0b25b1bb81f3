//! Shared store client.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use jobdesk_models::{Application, ApplicationId, Job, JobId, User, UserId};

/// Process-local store state. One writer lock guards the whole state so
/// uniqueness checks and the matching insert happen in a single critical
/// section.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub users: HashMap<UserId, User>,
    /// Email uniqueness index.
    pub emails: HashMap<String, UserId>,
    pub jobs: HashMap<JobId, Job>,
    pub applications: HashMap<ApplicationId, Application>,
    /// Apply-uniqueness index over `(job, applicant)` pairs.
    pub applied: HashSet<(JobId, UserId)>,
}

/// Cloneable handle to the store. Repositories are constructed from it.
#[derive(Clone, Default)]
pub struct StoreClient {
    pub(crate) state: Arc<RwLock<StoreState>>,
}

/// Record counts, used by the readiness probe.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreCounts {
    pub users: usize,
    pub jobs: usize,
    pub applications: usize,
}

impl StoreClient {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record counts.
    pub async fn counts(&self) -> StoreCounts {
        let state = self.state.read().await;
        StoreCounts {
            users: state.users.len(),
            jobs: state.jobs.len(),
            applications: state.applications.len(),
        }
    }
}
