//! Data models for the job board.
//!
//! - `UserProfile`, `Role` and the login/refresh wire types
//! - `JobOffer`, `JobsPage`: offers as served by the API
//! - `Job`: display form of an offer, plus client-side filtering
//! - `JobApplication`: applications kept on this machine

pub mod application;
pub mod job;
pub mod user;

pub use application::{ApplicationForm, ApplicationStatus, JobApplication};
pub use job::{search_jobs, Job, JobFilter, JobOffer, JobType, JobsPage, JobsQuery};
pub use user::{LoginRequest, LoginResponse, RefreshRequest, RefreshTokenResponse, Role, UserProfile};
