//! Core library for the job board client.
//!
//! - `auth`: session store and its persistent key-value backends
//! - `api`: authenticated request dispatcher, login/refresh, job endpoints
//! - `models`: users, job offers, applications
//! - `applications`: locally stored job applications
//! - `config`: application configuration

pub mod api;
pub mod applications;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, RequestOptions};
pub use applications::ApplicationStore;
pub use auth::{AuthEvent, LogoutReason, SessionStore};
pub use config::{Config, SessionBackend};
