//! Job offer models.
//!
//! `JobOffer` and `JobsPage` mirror the `/mobile/offers` wire format.
//! `Job` is the flattened display form built from an offer.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::{contains_ignore_case, format_amount};

/// Contract type of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    /// Any type this client does not know about
    #[serde(other)]
    Other,
}

impl JobType {
    /// Short slug used on the command line (`full-time`, `part-time`, ...)
    pub fn slug(&self) -> &'static str {
        match self {
            JobType::FullTime | JobType::Other => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            JobType::FullTime | JobType::Other => "Full time",
            JobType::PartTime => "Part time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
        }
    }

    /// Unknown types are shown as full time.
    fn normalized(self) -> Self {
        match self {
            JobType::Other => JobType::FullTime,
            other => other,
        }
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "full-time" => Ok(JobType::FullTime),
            "part-time" => Ok(JobType::PartTime),
            "contract" => Ok(JobType::Contract),
            "internship" => Ok(JobType::Internship),
            _ => Err(format!(
                "Unknown job type '{}' (expected full-time, part-time, contract or internship)",
                s
            )),
        }
    }
}

/// A job offer as returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobOffer {
    pub id: i64,
    pub uuid: String,
    pub recruiter_uuid: Option<String>,
    pub recruiter_name: Option<String>,
    pub company_name: Option<String>,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub job_type: Option<JobType>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub salary_min: f64,
    pub salary_max: f64,
    pub salary_currency: Option<String>,
    pub experience_required: Option<i32>,
    pub education_level: Option<String>,
    pub skills_required: Option<String>,
    pub application_deadline: Option<String>,
    pub start_date: Option<String>,
    pub remote_allowed: bool,
    pub views_count: i64,
    pub applications_count: i64,
    pub is_featured: bool,
    pub is_urgent: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub published_at: Option<String>,
}

/// Paginated envelope for `/mobile/offers`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobsPage {
    pub content: Vec<JobOffer>,
    pub total_pages: u32,
    pub total_elements: u64,
    pub number: u32,
    pub size: u32,
    pub first: bool,
    pub last: bool,
    pub number_of_elements: u32,
    pub empty: bool,
}

impl JobsPage {
    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }
}

/// Query parameters for listing offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsQuery {
    pub page: u32,
    pub size: u32,
    /// Sort entries in `field,direction` form
    pub sort: Vec<String>,
}

impl Default for JobsQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            sort: vec!["createdAt,desc".to_string()],
        }
    }
}

impl JobsQuery {
    pub fn page(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            ..Self::default()
        }
    }

    /// Build the query string, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let sort = self.sort.join(",");
        format!(
            "page={}&size={}&sort={}",
            self.page,
            self.size,
            encode_query_value(&sort)
        )
    }
}

/// Percent-encode a query value the way `URLSearchParams` does for our inputs.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Display form of a job offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<String>,
    pub description: String,
    pub requirements: Vec<String>,
    pub posted_date: Option<String>,
    pub deadline: Option<String>,
    pub featured: bool,
}

/// Treat `None` and empty strings alike.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl From<&JobOffer> for Job {
    fn from(offer: &JobOffer) -> Self {
        let currency = offer.salary_currency.as_deref().unwrap_or_default();
        let salary = if offer.salary_min > 0.0 || offer.salary_max > 0.0 {
            if offer.salary_min == offer.salary_max {
                Some(format!("{} {}", format_amount(offer.salary_max), currency))
            } else {
                Some(format!(
                    "{} - {} {}",
                    format_amount(offer.salary_min),
                    format_amount(offer.salary_max),
                    currency
                ))
            }
        } else {
            None
        };

        let requirements = offer
            .requirements
            .as_deref()
            .map(|reqs| {
                reqs.split('\n')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let country = offer.country.as_deref().unwrap_or_default();
        let location = match non_empty(&offer.city) {
            Some(city) => format!("{}, {}", city, country),
            None => non_empty(&offer.location).unwrap_or(country).to_string(),
        };

        let company = non_empty(&offer.company_name)
            .or_else(|| non_empty(&offer.recruiter_name))
            .unwrap_or_default()
            .to_string();

        Job {
            id: offer.uuid.clone(),
            title: offer.title.clone(),
            company,
            location,
            job_type: offer.job_type.unwrap_or(JobType::FullTime).normalized(),
            salary,
            description: offer.description.clone(),
            requirements,
            posted_date: non_empty(&offer.published_at)
                .or_else(|| non_empty(&offer.created_at))
                .map(str::to_string),
            deadline: non_empty(&offer.application_deadline).map(str::to_string),
            featured: offer.is_featured,
        }
    }
}

impl From<JobOffer> for Job {
    fn from(offer: JobOffer) -> Self {
        Job::from(&offer)
    }
}

/// Client-side filter applied to an already-fetched page of jobs.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub query: Option<String>,
    pub job_type: Option<JobType>,
}

impl JobFilter {
    /// Jobs passing both the text search and the type filter, in order.
    /// An empty query matches everything.
    pub fn apply<'a>(&self, jobs: &'a [Job]) -> Vec<&'a Job> {
        let found = match self.query.as_deref().filter(|q| !q.is_empty()) {
            Some(query) => search_jobs(jobs, query),
            None => jobs.iter().collect(),
        };
        found
            .into_iter()
            .filter(|job| self.job_type.map_or(true, |t| job.job_type == t))
            .collect()
    }
}

impl Job {
    /// Case-insensitive match on title, company, location or description
    pub fn matches_search(&self, query: &str) -> bool {
        contains_ignore_case(&self.title, query)
            || contains_ignore_case(&self.company, query)
            || contains_ignore_case(&self.location, query)
            || contains_ignore_case(&self.description, query)
    }
}

/// Free-text search over title, company, location and description.
pub fn search_jobs<'a>(jobs: &'a [Job], query: &str) -> Vec<&'a Job> {
    jobs.iter().filter(|job| job.matches_search(query)).collect()
}
