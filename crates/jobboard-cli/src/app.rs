//! Command handlers.
//!
//! `App` owns the configuration, the shared session store, the API client
//! and the local application store, and runs one command at a time.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use jobboard_core::auth::{FileStore, KeyValueStore, KeyringStore};
use jobboard_core::models::{ApplicationForm, Job, JobFilter, JobsQuery};
use jobboard_core::utils::{format_age, format_date, truncate_string};
use jobboard_core::{
    ApiClient, ApplicationStore, AuthEvent, Config, LogoutReason, SessionBackend, SessionStore,
};
use tracing::{debug, warn};

use crate::cli::JobsArgs;

/// Width of the description excerpt in job listings
const DESCRIPTION_EXCERPT_LEN: usize = 70;

pub struct App {
    config: Config,
    api: ApiClient,
    applications: ApplicationStore,
}

impl App {
    pub fn new(config: Config, data_dir: &Path) -> Result<Self> {
        let session = Arc::new(open_session(config.session_backend, data_dir));

        session.subscribe(|event| match event {
            AuthEvent::LoggedOut(LogoutReason::SessionExpired) => {
                eprintln!("Your session has expired. Run `jobboard login` to sign in again.");
            }
            other => debug!(?other, "Auth state changed"),
        });

        let api = ApiClient::new(&config, session)?;
        let applications = ApplicationStore::new(data_dir)?;

        Ok(Self {
            config,
            api,
            applications,
        })
    }

    pub async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = choose_email(email, self.config.last_email.as_deref(), prompt)?;
        let password = rpassword::prompt_password("Password: ")?;

        let outcome = self.api.login(&email, &password).await?;

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        if outcome.is_first_login {
            println!("Welcome, {}!", outcome.user.full_name);
        } else {
            println!("Logged in as {}.", outcome.user.full_name);
        }
        if outcome.user.role.can_post_jobs() {
            println!("Your {} account can publish offers.", outcome.user.role.display_name().to_lowercase());
        }
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.api.logout()?;
        println!("Logged out.");
        Ok(())
    }

    pub fn whoami(&self) {
        let session = self.api.session();
        if !session.is_authenticated() {
            println!("Not logged in.");
            return;
        }
        match session.user() {
            Some(user) => {
                println!("{} <{}>", user.full_name, user.email);
                println!("Role: {}", user.role.display_name());
                if user.is_premium {
                    println!("Premium account");
                }
            }
            None => println!("Logged in (no profile cached)."),
        }
    }

    pub async fn list_jobs(&self, args: &JobsArgs) -> Result<()> {
        let (jobs, footer): (Vec<Job>, String) = if args.all {
            let offers = self.api.fetch_all_jobs(JobsArgs::ALL_PAGE_SIZE).await?;
            let footer = format!("{} offers", offers.len());
            (offers.iter().map(Job::from).collect(), footer)
        } else {
            let page = self.api.fetch_jobs(&JobsQuery::page(args.page, args.size)).await?;
            let footer = format!(
                "Page {} of {} ({} offers)",
                page.number + 1,
                page.total_pages.max(1),
                page.total_elements
            );
            (page.content.iter().map(Job::from).collect(), footer)
        };

        let filter = JobFilter {
            query: args.search.clone(),
            job_type: args.job_type,
        };
        let shown = filter.apply(&jobs);

        if shown.is_empty() {
            println!("No job offers match.");
        }
        for job in &shown {
            print_job_summary(job);
        }
        println!("{}", footer);
        Ok(())
    }

    pub async fn show_job(&self, uuid: &str) -> Result<()> {
        let job = Job::from(self.api.fetch_job(uuid).await?);

        println!("{}", job.title);
        println!("{} - {}", job.company, job.location);
        println!("Type: {}", job.job_type.display_name());
        if let Some(ref salary) = job.salary {
            println!("Salary: {}", salary);
        }
        if let Some(ref posted) = job.posted_date {
            println!("Posted: {}", format_date(posted));
        }
        if let Some(ref deadline) = job.deadline {
            println!("Apply before: {}", format_date(deadline));
        }
        println!();
        println!("{}", job.description);
        if !job.requirements.is_empty() {
            println!();
            println!("Requirements:");
            for requirement in &job.requirements {
                println!("  - {}", requirement);
            }
        }

        let applied = self.applications.for_job(&job.id)?;
        if let Some(last) = applied.last() {
            println!();
            println!("You applied {}.", format_age(last.submitted_date, Utc::now()));
        }
        Ok(())
    }

    pub async fn apply(&self, uuid: &str) -> Result<()> {
        // Make sure the offer exists before asking for details
        let job = Job::from(self.api.fetch_job(uuid).await?);
        println!("Applying to {} at {}", job.title, job.company);

        let form = ApplicationForm {
            applicant_name: prompt("Full name: ")?,
            applicant_email: prompt("Email: ")?,
            applicant_phone: prompt("Phone: ")?,
            cover_letter: prompt_multiline("Cover letter (end with an empty line):")?,
            resume_url: Some(prompt("Resume URL (optional): ")?),
        };

        let application = self.applications.submit(&job.id, &form)?;
        println!("Application {} submitted.", application.id);
        Ok(())
    }

    pub fn list_applications(&self) -> Result<()> {
        let applications = self.applications.list()?;
        if applications.is_empty() {
            println!("You have not applied to any offer yet.");
            return Ok(());
        }
        let now = Utc::now();
        for application in applications.iter().rev() {
            println!(
                "{}  job {}  {:<12}  {}",
                application.id,
                application.job_id,
                application.status.display_name(),
                format_age(application.submitted_date, now)
            );
        }
        Ok(())
    }
}

/// Email from the command line, or asked for with the last one as default
fn choose_email<F>(given: Option<String>, last: Option<&str>, ask: F) -> Result<String>
where
    F: FnOnce(&str) -> Result<String>,
{
    if let Some(email) = given.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) {
        return Ok(email);
    }

    let email = match last {
        Some(last) => {
            let input = ask(&format!("Email [{}]: ", last))?;
            if input.is_empty() {
                last.to_string()
            } else {
                input
            }
        }
        None => ask("Email: ")?,
    };
    if email.is_empty() {
        bail!("An email address is required");
    }
    Ok(email)
}

fn open_session(backend: SessionBackend, data_dir: &Path) -> SessionStore {
    let store: Box<dyn KeyValueStore> = match backend {
        SessionBackend::File => Box::new(FileStore::open(data_dir)),
        SessionBackend::Keyring => Box::new(KeyringStore::new()),
    };
    SessionStore::new(store)
}

/// Data directory from the config, falling back to a local directory
pub fn data_dir(config: &Config) -> PathBuf {
    config
        .data_dir()
        .unwrap_or_else(|_| PathBuf::from("./jobboard-data"))
}

fn print_job_summary(job: &Job) {
    let marker = if job.featured { "*" } else { " " };
    println!("{} {}  [{}]", marker, job.title, job.id);
    println!("    {} - {} - {}", job.company, job.location, job.job_type.display_name());
    if let Some(ref salary) = job.salary {
        println!("    {}", salary);
    }
    if !job.description.is_empty() {
        println!("    {}", truncate_string(&job.description, DESCRIPTION_EXCERPT_LEN));
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_multiline(label: &str) -> Result<String> {
    println!("{}", label);
    let mut lines = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}
