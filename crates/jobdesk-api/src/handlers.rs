//! API handlers.

pub mod applications;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod uploads;

pub use health::{health, ready};
