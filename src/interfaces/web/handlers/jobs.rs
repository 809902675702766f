use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use super::super::AppState;
use super::{ApiError, internal_error};
use crate::core::jobs::{JobKind, JobPayload};

#[derive(serde::Deserialize)]
pub struct SubmitJobRequest {
    pub kind: JobKind,
    #[serde(default)]
    pub payload: JobPayload,
}

pub async fn submit_job(
    State(state): State<AppState>,
    Json(req): Json<SubmitJobRequest>,
) -> Result<Json<Value>, ApiError> {
    let record = state
        .jobs
        .submit(req.kind, req.payload)
        .await
        .map_err(internal_error)?;
    Ok(Json(json!({
        "job_id": record.job_id,
        "status": record.status,
    })))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = state.jobs.status(&id).await.map_err(internal_error)?;
    match record {
        Some(job) => Ok(Json(serde_json::to_value(job).map_err(|e| internal_error(e.into()))?)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Job not found" })),
        )),
    }
}
