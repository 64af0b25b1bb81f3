//! Application models and the status workflow.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::job::JobId;
use crate::user::UserId;

/// Unique identifier for an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    /// Generate a new random application ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ApplicationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ApplicationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Application status.
///
/// Transitions are not strictly ordered: the posting's owner may set any
/// status from any prior status, and repeating a transition is a no-op
/// rather than an error. `Hired` is part of the enumeration though no
/// dedicated operation drives into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Viewed,
    Shortlisted,
    Rejected,
    Hired,
}

/// Error returned when a status string is not part of the enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown application status: {0}")]
pub struct ParseStatusError(pub String);

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Viewed => "Viewed",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Hired => "Hired",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Applied" => Ok(ApplicationStatus::Applied),
            "Viewed" => Ok(ApplicationStatus::Viewed),
            "Shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "Rejected" => Ok(ApplicationStatus::Rejected),
            "Hired" => Ok(ApplicationStatus::Hired),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A job application.
///
/// Created only through the apply action; mutated only through status
/// updates; never deleted. At most one application exists per
/// `(job, applicant)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub job: JobId,
    pub applicant: UserId,
    /// Locator into the résumé blob store, not file content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Create a new application in the `Applied` state.
    pub fn new(
        job: JobId,
        applicant: UserId,
        cover_letter: Option<String>,
        resume_url: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ApplicationId::new(),
            job,
            applicant,
            resume_url,
            cover_letter,
            status: ApplicationStatus::Applied,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the status and bump `updated_at`. No transition table: any
    /// enumeration value is accepted from any prior state.
    pub fn set_status(&mut self, status: ApplicationStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
