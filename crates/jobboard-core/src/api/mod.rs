//! REST API client module for the job board service.
//!
//! `ApiClient` performs login, token refresh and authenticated requests,
//! and exposes the job offer endpoints on top of them.
//!
//! The API uses bearer token authentication; tokens come from
//! `/mobile/auth/login` and are renewed through `/api/v1/mobile/auth/refresh`.

pub mod client;
pub mod error;
pub mod jobs;

pub use client::{join_url, ApiClient, LoginOutcome, RequestOptions};
pub use error::ApiError;
