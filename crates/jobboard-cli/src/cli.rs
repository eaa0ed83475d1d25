//! Command-line argument parsing.

use anyhow::{anyhow, bail, Result};
use jobboard_core::models::JobType;

pub const USAGE: &str = "\
Usage: jobboard <command> [options]

Commands:
  login [email]            Log in and store the session
  logout                   Forget the stored session
  whoami                   Show the logged-in user
  jobs [options]           List job offers
      --page <n>           Page to fetch (default 0)
      --size <n>           Offers per page (default 20)
      --search <text>      Filter by title, company, location or description
      --type <type>        full-time, part-time, contract or internship
      --all                Fetch every page
  job <uuid>               Show one job offer
  apply <uuid>             Apply to a job offer
  applications             List your applications
  help                     Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsArgs {
    pub page: u32,
    pub size: u32,
    pub search: Option<String>,
    pub job_type: Option<JobType>,
    pub all: bool,
}

impl Default for JobsArgs {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            search: None,
            job_type: None,
            all: false,
        }
    }
}

impl JobsArgs {
    /// Page size used when fetching every offer with `--all`
    pub const ALL_PAGE_SIZE: u32 = 100;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: Option<String> },
    Logout,
    WhoAmI,
    Jobs(JobsArgs),
    Job { uuid: String },
    Apply { uuid: String },
    Applications,
    Help,
}

/// Parse arguments, not including the program name
pub fn parse(args: &[String]) -> Result<Command> {
    let Some(command) = args.first() else {
        return Ok(Command::Help);
    };
    let rest = &args[1..];

    match command.as_str() {
        "login" => Ok(Command::Login {
            email: rest.first().cloned(),
        }),
        "logout" => Ok(Command::Logout),
        "whoami" => Ok(Command::WhoAmI),
        "jobs" => parse_jobs_args(rest).map(Command::Jobs),
        "job" => Ok(Command::Job {
            uuid: required_uuid(rest, "job")?,
        }),
        "apply" => Ok(Command::Apply {
            uuid: required_uuid(rest, "apply")?,
        }),
        "applications" => Ok(Command::Applications),
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

fn required_uuid(rest: &[String], command: &str) -> Result<String> {
    rest.first()
        .cloned()
        .ok_or_else(|| anyhow!("'{}' needs a job uuid", command))
}

fn parse_jobs_args(rest: &[String]) -> Result<JobsArgs> {
    let mut parsed = JobsArgs::default();
    let mut iter = rest.iter();

    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("'{}' needs a value", flag))
        };
        match flag.as_str() {
            "--page" => parsed.page = value()?.parse()?,
            "--size" => parsed.size = value()?.parse()?,
            "--search" => parsed.search = Some(value()?),
            "--type" => parsed.job_type = Some(value()?.parse().map_err(|e: String| anyhow!(e))?),
            "--all" => parsed.all = true,
            other => bail!("Unknown option '{}' for 'jobs'", other),
        }
    }

    if parsed.size == 0 {
        bail!("--size must be at least 1");
    }
    Ok(parsed)
}
