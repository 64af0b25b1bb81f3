//! Authorization policy.
//!
//! Pure decision functions with no I/O. Authorization is role plus
//! per-resource ownership; there is no dynamic permission system.

use jobdesk_models::{Job, Role};

use crate::auth::Principal;

/// Only recruiters may create postings.
pub fn can_create_job(principal: &Principal) -> bool {
    principal.role == Role::Recruiter
}

/// Ownership gate for updating and deleting a posting.
pub fn can_modify_job(principal: &Principal, job: &Job) -> bool {
    job.posted_by == principal.id
}

/// Ownership gate for driving an application's status. The check is against
/// the owner of the posting, not against anything on the application itself,
/// so callers must resolve the owning job first.
pub fn can_update_application_status(principal: &Principal, job: &Job) -> bool {
    job.posted_by == principal.id
}

/// Which application listing a principal sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationView {
    /// Seeker: own applications only.
    Own,
    /// Recruiter: applications to owned postings.
    Incoming,
}

/// Select the listing view by role.
pub fn application_view(principal: &Principal) -> ApplicationView {
    match principal.role {
        Role::Recruiter => ApplicationView::Incoming,
        Role::Seeker => ApplicationView::Own,
    }
}
