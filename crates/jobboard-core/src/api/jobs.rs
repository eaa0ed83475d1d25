//! Job offer endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{JobOffer, JobsPage, JobsQuery};

use super::client::{ApiClient, RequestOptions};
use super::ApiError;

const OFFERS_ENDPOINT: &str = "/mobile/offers";

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Pages fetched concurrently by `fetch_all_jobs`
const CONCURRENT_PAGE_REQUESTS: usize = 4;

impl ApiClient {
    /// GET an endpoint and decode its JSON body, backing off on 429.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self.send(endpoint, &RequestOptions::get(), true).await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited.into());
                }
                warn!(endpoint, retry = retries, backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
                continue;
            }

            let response = Self::check_response(response).await?;
            return response
                .json()
                .await
                .with_context(|| format!("Failed to parse JSON response from {}", endpoint));
        }
    }

    /// Fetch one page of offers
    pub async fn fetch_jobs(&self, query: &JobsQuery) -> Result<JobsPage> {
        let endpoint = format!("{}?{}", OFFERS_ENDPOINT, query.to_query_string());
        let page: JobsPage = self
            .get_json(&endpoint)
            .await
            .context("Failed to fetch job offers")?;
        debug!(
            page = page.number,
            total_pages = page.total_pages,
            count = page.content.len(),
            "Fetched job offers"
        );
        Ok(page)
    }

    /// Fetch a single offer by uuid
    pub async fn fetch_job(&self, uuid: &str) -> Result<JobOffer> {
        let endpoint = format!("{}/{}", OFFERS_ENDPOINT, uuid);
        match self.get_json(&endpoint).await {
            Ok(offer) => Ok(offer),
            Err(e) if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::NotFound(_))) => {
                Err(ApiError::NotFound(format!("job offer {}", uuid)).into())
            }
            Err(e) => Err(e.context(format!("Failed to fetch job offer {}", uuid))),
        }
    }

    /// Fetch every offer, newest first. Pages after the first are requested
    /// concurrently in small batches.
    pub async fn fetch_all_jobs(&self, page_size: u32) -> Result<Vec<JobOffer>> {
        let first = self.fetch_jobs(&JobsQuery::page(0, page_size)).await?;
        let total_pages = first.total_pages;
        let mut offers = first.content;

        let remaining: Vec<u32> = (1..total_pages).collect();
        for chunk in remaining.chunks(CONCURRENT_PAGE_REQUESTS) {
            let futures: Vec<_> = chunk
                .iter()
                .map(|&page| {
                    let query = JobsQuery::page(page, page_size);
                    async move { self.fetch_jobs(&query).await }
                })
                .collect();

            for result in join_all(futures).await {
                offers.extend(result?.content);
            }
        }

        debug!(count = offers.len(), total_pages, "Fetched all job offers");
        Ok(offers)
    }
}
