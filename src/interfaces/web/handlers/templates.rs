use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use super::super::AppState;
use super::{ApiError, internal_error};
use crate::core::coordinator::normalize_label;
use crate::core::store::types::NewTemplate;

#[derive(serde::Deserialize)]
pub struct TemplatesQuery {
    pub category: Option<String>,
    pub format: Option<String>,
    pub limit: Option<usize>,
}

pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplatesQuery>,
) -> Result<Json<Value>, ApiError> {
    let category = query.category.as_deref().map(normalize_label);
    let format = query.format.as_deref().map(normalize_label);
    let templates = state
        .store
        .list_templates(
            category.as_deref(),
            format.as_deref(),
            query.limit.unwrap_or(50),
        )
        .await
        .map_err(internal_error)?;
    Ok(Json(json!({ "templates": templates })))
}

pub async fn create_template(
    State(state): State<AppState>,
    Json(mut req): Json<NewTemplate>,
) -> Result<Json<Value>, ApiError> {
    req.category = normalize_label(&req.category);
    req.format = normalize_label(&req.format);
    let template = state
        .store
        .create_template(&req)
        .await
        .map_err(internal_error)?;
    Ok(Json(serde_json::to_value(template).map_err(|e| internal_error(e.into()))?))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let template = state
        .store
        .get_template(&id)
        .await
        .map_err(internal_error)?;
    match template {
        Some(t) => Ok(Json(serde_json::to_value(t).map_err(|e| internal_error(e.into()))?)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Template not found" })),
        )),
    }
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .store
        .delete_template(&id)
        .await
        .map_err(internal_error)?;
    if deleted {
        Ok(Json(json!({ "message": "Template deleted" })))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Template not found" })),
        ))
    }
}
