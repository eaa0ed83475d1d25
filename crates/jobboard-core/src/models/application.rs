use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Reviewed => "Under review",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

/// A submitted job application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: String,
    pub job_id: String,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: String,
    pub cover_letter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    pub submitted_date: DateTime<Utc>,
    #[serde(default)]
    pub status: ApplicationStatus,
}

/// Fields the applicant fills in.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_phone: String,
    pub cover_letter: String,
    pub resume_url: Option<String>,
}

impl ApplicationForm {
    /// Names of required fields left blank, in form order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.applicant_name),
            ("email", &self.applicant_email),
            ("phone", &self.applicant_phone),
            ("cover letter", &self.cover_letter),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}
