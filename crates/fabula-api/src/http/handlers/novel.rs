//! Novel library endpoints.
//!
//! Thin wrappers over [`NovelService`]: validation and status mapping live
//! here, persistence semantics live in the service.
//!
//! [`NovelService`]: fabula_core::novel::service::NovelService

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};

use fabula_types::novel::{AdvancedDoc, NovelDetail, NovelSummary, StoryDoc};

use crate::http::error::AppError;
use crate::state::AppState;

/// Longest accepted novel title, in characters.
const TITLE_MAX_CHARS: usize = 100;

/// Request body for creating a novel.
#[derive(Debug, Deserialize)]
pub struct CreateNovelRequest {
    pub title: String,
}

/// GET /api/novels - List all novels, oldest first.
pub async fn list_novels(
    State(state): State<AppState>,
) -> Result<Json<Vec<NovelSummary>>, AppError> {
    Ok(Json(state.novels.list_novels().await?))
}

/// POST /api/novels - Create a novel and register it in the index.
pub async fn create_novel(
    State(state): State<AppState>,
    Json(body): Json<CreateNovelRequest>,
) -> Result<Json<NovelSummary>, AppError> {
    let title = validate_title(&body.title)?;
    Ok(Json(state.novels.create_novel(title).await?))
}

/// GET /api/novels/{id} - Index entry plus story and advanced documents.
pub async fn get_novel(
    State(state): State<AppState>,
    Path(novel_id): Path<String>,
) -> Result<Json<NovelDetail>, AppError> {
    match state.novels.get_novel(&novel_id).await? {
        Some(detail) => Ok(Json(detail)),
        None => Err(AppError::NotFound("novel_not_found")),
    }
}

/// POST /api/novels/{id}/story - Replace the story document.
pub async fn save_story(
    State(state): State<AppState>,
    Path(novel_id): Path<String>,
    Json(story): Json<StoryDoc>,
) -> Result<Json<Value>, AppError> {
    if !state.novels.save_story(&novel_id, &story).await? {
        return Err(AppError::NotFound("novel_not_found"));
    }
    Ok(Json(json!({ "ok": true })))
}

/// POST /api/novels/{id}/advanced - Replace the advanced design document.
pub async fn save_advanced(
    State(state): State<AppState>,
    Path(novel_id): Path<String>,
    Json(advanced): Json<AdvancedDoc>,
) -> Result<Json<Value>, AppError> {
    if !state.novels.save_advanced(&novel_id, &advanced).await? {
        return Err(AppError::NotFound("novel_not_found"));
    }
    Ok(Json(json!({ "ok": true })))
}

/// Trimmed title, rejecting blank and over-long values.
fn validate_title(raw: &str) -> Result<&str, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(title)
}
