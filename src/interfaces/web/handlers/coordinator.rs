use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::super::AppState;
use super::{ApiError, error_response, internal_error};

#[derive(serde::Deserialize)]
pub struct StartRequest {
    pub user_request: String,
    pub conversation_title: Option<String>,
    /// attract, nurture, or convert
    pub category: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct ContinueRequest {
    pub conversation_id: String,
    pub user_response: String,
}

#[derive(serde::Deserialize)]
pub struct IdeasRequest {
    pub source_url: String,
    pub conversation_title: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct SelectRequest {
    pub conversation_id: String,
    pub idea_index: usize,
    pub template_id: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct TransformRequest {
    pub conversation_id: String,
    pub draft: String,
    pub template_id: Option<String>,
    pub category: Option<String>,
    pub format: Option<String>,
    pub feedback: Option<String>,
}

pub async fn start(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<Value>, ApiError> {
    let conv = state
        .store
        .create_conversation(Some(
            req.conversation_title.as_deref().unwrap_or("New conversation"),
        ))
        .await
        .map_err(internal_error)?;
    let outcome = state
        .coordinator
        .process_request(&conv.id, &req.user_request, req.category.as_deref())
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "conversation_id": conv.id,
        "status": outcome.status,
        "final_output": outcome.final_output,
    })))
}

pub async fn continue_conversation(
    State(state): State<AppState>,
    Json(req): Json<ContinueRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .coordinator
        .continue_after_user_input(&req.conversation_id, &req.user_response)
        .await
        .map_err(error_response)?;
    let mut body = serde_json::to_value(&outcome).map_err(|e| internal_error(e.into()))?;
    if let Some(map) = body.as_object_mut() {
        map.insert(
            "conversation_id".to_string(),
            Value::String(req.conversation_id),
        );
    }
    Ok(Json(body))
}

pub async fn generate_ideas(
    State(state): State<AppState>,
    Json(req): Json<IdeasRequest>,
) -> Result<Json<Value>, ApiError> {
    let conv = state
        .store
        .create_conversation(Some(
            req.conversation_title
                .as_deref()
                .unwrap_or("Ideas from source article"),
        ))
        .await
        .map_err(internal_error)?;
    let outcome = state
        .coordinator
        .generate_ideas(&conv.id, &req.source_url)
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "conversation_id": conv.id,
        "status": outcome.status,
        "source_title": outcome.source_title,
        "ideas": outcome.ideas,
    })))
}

pub async fn select_idea(
    State(state): State<AppState>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state
        .coordinator
        .generate_from_idea(
            &req.conversation_id,
            req.idea_index,
            req.template_id.as_deref(),
        )
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "conversation_id": req.conversation_id,
        "status": outcome.status,
        "final_output": outcome.final_output,
        "selected_idea": outcome.selected_idea,
        "generation_secs": outcome.generation_secs,
    })))
}

pub async fn transform(
    State(state): State<AppState>,
    Json(req): Json<TransformRequest>,
) -> Result<Json<Value>, ApiError> {
    let content = state
        .coordinator
        .format_draft(
            &req.conversation_id,
            &req.draft,
            req.template_id.as_deref(),
            req.category.as_deref(),
            req.format.as_deref(),
            req.feedback.as_deref(),
        )
        .await
        .map_err(error_response)?;
    Ok(Json(json!({
        "conversation_id": req.conversation_id,
        "content": content,
    })))
}
