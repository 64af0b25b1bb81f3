//! Jobdesk persistence layer.
//!
//! This crate provides:
//! - Typed repositories for Users, Jobs and Applications
//! - The store-owned invariants: email uniqueness and the one-application-
//!   per-`(job, applicant)` constraint, both enforced atomically
//! - Job listing with conjunctive filters and pagination
//!
//! Every repository is a thin handle over a shared [`StoreClient`]; mutating
//! operations take a single writer lock over the full store state, so
//! check-and-insert sequences cannot race.

pub mod applications;
pub mod client;
pub mod error;
pub mod jobs;
pub mod users;

pub use applications::ApplicationRepository;
pub use client::{StoreClient, StoreCounts};
pub use error::{StoreError, StoreResult};
pub use jobs::{JobFilter, JobRepository, DEFAULT_PAGE_LIMIT};
pub use users::UserRepository;
