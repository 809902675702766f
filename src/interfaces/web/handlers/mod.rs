pub mod coordinator;
pub mod jobs;
pub mod templates;

use axum::Json;
use axum::http::StatusCode;
use serde_json::json;

use crate::core::coordinator::WorkflowError;

pub(crate) type ApiError = (StatusCode, Json<serde_json::Value>);

/// Map the workflow error taxonomy onto HTTP responses. Precondition and
/// configuration problems are the caller's to fix; timeouts get their own
/// status so clients can suggest a smaller input; everything else is a
/// retried-and-failed server fault.
pub(crate) fn error_response(err: WorkflowError) -> ApiError {
    let (status, hint) = match &err {
        WorkflowError::Precondition { .. } | WorkflowError::Configuration(_) => {
            (StatusCode::BAD_REQUEST, "check the request inputs")
        }
        WorkflowError::Timeout { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            "generation timed out; try a smaller input",
        ),
        WorkflowError::Stage { .. } | WorkflowError::Store(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "generation failed after retries; try again shortly",
        ),
    };
    let code = match &err {
        WorkflowError::Precondition { code, .. } => Some(*code),
        _ => None,
    };
    (
        status,
        Json(json!({ "error": err.to_string(), "code": code, "hint": hint })),
    )
}

pub(crate) fn internal_error(err: anyhow::Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
}
