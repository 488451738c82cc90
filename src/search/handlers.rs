use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    error::{AppError, AppResult},
    search::client::{dedupe_keywords, KeywordResults, SearchError, SearchRequest},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/search-jobs", post(search_jobs))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchJobsRequest {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub location: String,
    pub employment_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum SearchJobsResponse {
    #[serde(rename_all = "camelCase")]
    Found {
        success: bool,
        results: Vec<KeywordResults>,
        total_jobs: usize,
    },
    Failed {
        success: bool,
        error: String,
    },
}

#[instrument(skip(state, payload))]
pub async fn search_jobs(
    State(state): State<AppState>,
    payload: Result<Json<SearchJobsRequest>, JsonRejection>,
) -> AppResult<Json<SearchJobsResponse>> {
    let Json(payload) = payload?;

    if dedupe_keywords(&payload.keywords).is_empty() {
        return Err(AppError::validation("At least one keyword is required"));
    }
    let location = payload.location.trim();
    if location.is_empty() {
        return Err(AppError::validation("Location is required"));
    }

    let req = SearchRequest {
        keywords: payload.keywords,
        location: location.to_string(),
        employment_type: payload.employment_type,
    };

    match state.search.search(&req).await {
        Ok(outcome) => {
            info!(total_jobs = outcome.total_jobs, keywords = outcome.results.len(), "search finished");
            Ok(Json(SearchJobsResponse::Found {
                success: true,
                results: outcome.results,
                total_jobs: outcome.total_jobs,
            }))
        }
        Err(SearchError::NotConfigured) => Err(AppError::Config("JSEARCH_API_KEY is missing".into())),
        Err(e) => {
            warn!(error = %e, "search failed for every keyword");
            Ok(Json(SearchJobsResponse::Failed {
                success: false,
                error: e.to_string(),
            }))
        }
    }
}
