use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    jobs::{
        dto::{ItemResponse, JobListResponse, JobResponse, MessageResponse},
        services::ApplicationFields,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(get_job).put(update_job).delete(delete_job))
}

/// Unparseable ids read as "no such record" except on delete, which reports them.
fn record_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("Job not found"))
}

#[instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn list_jobs(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<JobListResponse>> {
    let jobs = state.applications.list(auth.user_id).await?;
    Ok(Json(JobListResponse { jobs }))
}

#[instrument(skip(state, payload), fields(user_id = %auth.user_id))]
pub async fn create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<ApplicationFields>, JsonRejection>,
) -> AppResult<(StatusCode, Json<JobResponse>)> {
    let Json(fields) = payload?;
    let job = state.applications.create(auth.user_id, fields).await?;
    Ok((
        StatusCode::CREATED,
        Json(JobResponse {
            message: "Job added successfully",
            job,
        }),
    ))
}

#[instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn get_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ItemResponse>> {
    let item = state.applications.get(auth.user_id, record_id(&id)?).await?;
    Ok(Json(ItemResponse { item }))
}

#[instrument(skip(state, payload), fields(user_id = %auth.user_id))]
pub async fn update_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<ApplicationFields>, JsonRejection>,
) -> AppResult<Json<JobResponse>> {
    let id = record_id(&id)?;
    let Json(fields) = payload?;
    let job = state.applications.update(auth.user_id, id, fields).await?;
    Ok(Json(JobResponse {
        message: "Job updated successfully",
        job,
    }))
}

#[instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = Uuid::parse_str(&id).map_err(|_| AppError::validation("Invalid item ID"))?;
    state.applications.delete(auth.user_id, id).await?;
    Ok(Json(MessageResponse { message: "Item deleted" }))
}
