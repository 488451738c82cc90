use std::collections::HashSet;

use anyhow::Context;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use super::{normalize::normalize, types::Opportunity};
use crate::config::SearchConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Server Config Error: JSEARCH_API_KEY is missing")]
    NotConfigured,
    #[error("Invalid API Key or Subscription ({0}). Check RapidAPI.")]
    Auth(u16),
    #[error("Rate Limit Exceeded (429). You made too many requests.")]
    RateLimited,
    #[error("External API Error: {0}")]
    Upstream(u16),
    #[error("Network error contacting job provider")]
    Network,
}

impl SearchError {
    /// Maps a non-success status onto the failure taxonomy; `None` for 2xx.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            return None;
        }
        Some(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SearchError::Auth(status.as_u16()),
            StatusCode::TOO_MANY_REQUESTS => SearchError::RateLimited,
            other => SearchError::Upstream(other.as_u16()),
        })
    }
}

/// Logs the full transport error; callers only see the fixed message.
fn network_error(e: reqwest::Error) -> SearchError {
    error!(error = %e, "job provider request failed");
    SearchError::Network
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub keywords: Vec<String>,
    pub location: String,
    pub employment_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordResults {
    pub keyword: String,
    pub jobs: Vec<Opportunity>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub results: Vec<KeywordResults>,
    pub total_jobs: usize,
}

/// Trims, drops empties and removes repeats, keeping first-seen order.
pub fn dedupe_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_string()))
        .map(str::to_string)
        .collect()
}

/// One GET per keyword against the job-search provider, issued sequentially
/// with a fixed pause between calls.
pub struct SearchClient {
    http: reqwest::Client,
    cfg: SearchConfig,
}

impl SearchClient {
    pub fn new(cfg: SearchConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { http, cfg })
    }

    async fn fetch_keyword(
        &self,
        api_key: &str,
        keyword: &str,
        location: &str,
        employment_type: Option<&str>,
    ) -> Result<Option<Vec<Opportunity>>, SearchError> {
        let query = format!("{keyword} in {location}");
        let url = format!("{}/search", self.cfg.base_url.trim_end_matches('/'));

        let mut params: Vec<(&str, &str)> = vec![
            ("query", query.as_str()),
            ("page", "1"),
            ("num_pages", "1"),
            ("country", self.cfg.country.as_str()),
            ("date_posted", self.cfg.date_posted.as_str()),
        ];
        if let Some(et) = employment_type {
            params.push(("employment_types", et));
        }

        info!(%query, "searching job provider");
        let response = self
            .http
            .get(&url)
            .query(&params)
            .header("x-rapidapi-host", &self.cfg.api_host)
            .header("x-rapidapi-key", api_key)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if let Some(err) = SearchError::from_status(status) {
            error!(%status, %query, "job provider returned error status");
            return Err(err);
        }

        let payload: Value = response
            .json()
            .await
            .map_err(network_error)?;

        match payload.get("data") {
            Some(data) if data.is_array() => {
                let jobs = normalize(data);
                info!(%keyword, count = jobs.len(), "search succeeded");
                Ok(Some(jobs))
            }
            _ => {
                warn!(%keyword, "provider response has no data array");
                Ok(None)
            }
        }
    }

    /// Succeeds when at least one keyword succeeded (failed keywords are
    /// dropped); otherwise surfaces the last error observed. A run with no
    /// usable keywords or no errors succeeds with whatever was collected.
    #[instrument(skip(self, req), fields(keywords = req.keywords.len()))]
    pub async fn search(&self, req: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let api_key = self.cfg.api_key.as_deref().ok_or(SearchError::NotConfigured)?;
        let employment_type = req
            .employment_type
            .as_deref()
            .map(str::trim)
            .filter(|et| !et.is_empty() && !et.eq_ignore_ascii_case("ALL"));

        let keywords = dedupe_keywords(&req.keywords);
        let mut results = Vec::new();
        let mut last_error = None;

        for (idx, keyword) in keywords.iter().enumerate() {
            if idx > 0 && !self.cfg.delay().is_zero() {
                tokio::time::sleep(self.cfg.delay()).await;
            }
            match self
                .fetch_keyword(api_key, keyword, &req.location, employment_type)
                .await
            {
                Ok(Some(jobs)) => results.push(KeywordResults {
                    keyword: keyword.clone(),
                    jobs,
                }),
                Ok(None) => {}
                Err(e) => {
                    warn!(%keyword, error = %e, "keyword search failed");
                    last_error = Some(e);
                }
            }
        }

        if results.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let total_jobs = results.iter().map(|r| r.jobs.len()).sum();
        Ok(SearchOutcome { results, total_jobs })
    }
}
