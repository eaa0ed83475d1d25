//! User and authentication wire types.

use serde::{Deserialize, Serialize};

/// Account role as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    JobSeeker,
    Employer,
    Recruiter,
    Admin,
}

impl Role {
    /// Recruiters and employers may publish offers.
    pub fn can_post_jobs(&self) -> bool {
        matches!(self, Role::Recruiter | Role::Employer)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::JobSeeker => "Job seeker",
            Role::Employer => "Employer",
            Role::Recruiter => "Recruiter",
            Role::Admin => "Administrator",
        }
    }
}

/// Cached snapshot of the logged-in user, used for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub is_premium: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(rename = "type", default)]
    pub token_type: Option<String>,
    pub id: i64,
    pub uuid: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub is_first_login: bool,
    #[serde(default)]
    pub is_premium: bool,
}

impl LoginResponse {
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            uuid: self.uuid.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            is_premium: self.is_premium,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
