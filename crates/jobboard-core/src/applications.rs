//! Job applications kept on this machine.
//!
//! Applications are appended to `applications.json` in the data directory.
//! A missing file means no applications yet.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::{debug, info};

use crate::models::{ApplicationForm, ApplicationStatus, JobApplication};

const APPLICATIONS_FILE: &str = "applications.json";

pub struct ApplicationStore {
    path: PathBuf,
}

impl ApplicationStore {
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: data_dir.join(APPLICATIONS_FILE),
        })
    }

    /// All stored applications, oldest first
    pub fn list(&self) -> Result<Vec<JobApplication>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read applications file")?;
        serde_json::from_str(&contents).context("Failed to parse applications file")
    }

    pub fn for_job(&self, job_id: &str) -> Result<Vec<JobApplication>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|a| a.job_id == job_id)
            .collect())
    }

    /// Record a new pending application for `job_id`
    pub fn submit(&self, job_id: &str, form: &ApplicationForm) -> Result<JobApplication> {
        let missing = form.missing_fields();
        if !missing.is_empty() {
            bail!("Missing required fields: {}", missing.join(", "));
        }

        let now = Utc::now();
        let mut applications = self.list()?;

        // Millisecond timestamps can collide when submitting in a tight loop
        let mut id = now.timestamp_millis();
        while applications.iter().any(|a| a.id == id.to_string()) {
            id += 1;
        }

        let application = JobApplication {
            id: id.to_string(),
            job_id: job_id.to_string(),
            applicant_name: form.applicant_name.trim().to_string(),
            applicant_email: form.applicant_email.trim().to_string(),
            applicant_phone: form.applicant_phone.trim().to_string(),
            cover_letter: form.cover_letter.clone(),
            resume_url: form.resume_url.clone().filter(|u| !u.trim().is_empty()),
            submitted_date: now,
            status: ApplicationStatus::Pending,
        };

        applications.push(application.clone());
        self.save(&applications)?;

        info!(job_id, application_id = %application.id, "Application submitted");
        Ok(application)
    }

    fn save(&self, applications: &[JobApplication]) -> Result<()> {
        let contents = serde_json::to_string_pretty(applications)?;
        std::fs::write(&self.path, contents).context("Failed to write applications file")?;
        debug!(count = applications.len(), "Applications saved");
        Ok(())
    }
}
