//! JSON stand-ins for the gated pages. The route gate has already resolved the
//! session by the time these run.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{claims::Role, extractors::AuthUser, PublicUser},
    error::{AppError, AppResult},
    jobs::{
        repo_types::ApplicationRecord,
        stats::{summarize, ApplicationStats},
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/job/:id", get(job_detail))
        .route("/stats", get(stats))
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub user: PublicUser,
    pub jobs: Vec<ApplicationRecord>,
}

#[derive(Debug, Serialize)]
pub struct JobDetail {
    pub item: ApplicationRecord,
}

#[instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn dashboard(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Dashboard>> {
    let user = state
        .credentials
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;
    let jobs = state.applications.list(auth.user_id).await?;
    Ok(Json(Dashboard {
        user: user.into(),
        jobs,
    }))
}

#[instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn job_detail(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<JobDetail>> {
    let id = Uuid::parse_str(&id).map_err(|_| AppError::not_found("Job not found"))?;
    let item = state.applications.get(auth.user_id, id).await?;
    Ok(Json(JobDetail { item }))
}

#[instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn stats(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<ApplicationStats>> {
    if auth.role != Role::Admin {
        return Err(AppError::Forbidden("Admin access required".into()));
    }
    let records = state.applications.list(auth.user_id).await?;
    Ok(Json(summarize(&records)))
}
