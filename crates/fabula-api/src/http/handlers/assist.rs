//! Model-assisted writing utilities.
//!
//! Both endpoints talk to the chat backend directly with single-turn
//! prompts; they never touch the conversation session.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use fabula_core::novel::naming::generate_name;
use fabula_core::novel::revise::optimize_text;

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for character name generation. All fields optional; blank
/// gender and style fall back to the product defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NamingRequest {
    pub gender: String,
    pub style: String,
    pub description: String,
}

/// Request body for field text optimization.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OptimizeRequest {
    pub text: String,
    pub field: String,
    pub instruction: String,
}

/// POST /api/naming - Generate one character name.
pub async fn naming(
    State(state): State<AppState>,
    Json(body): Json<NamingRequest>,
) -> Result<Json<Value>, AppError> {
    let name = generate_name(
        state.chat.as_ref(),
        &body.gender,
        &body.style,
        &body.description,
    )
    .await;

    match name {
        Some(name) => Ok(Json(json!({ "name": name }))),
        None => Err(AppError::Upstream("naming_failed")),
    }
}

/// POST /api/optimize - Rewrite field text; failures return it unchanged.
pub async fn optimize(
    State(state): State<AppState>,
    Json(body): Json<OptimizeRequest>,
) -> Json<Value> {
    let text = optimize_text(
        state.chat.as_ref(),
        &body.text,
        &body.instruction,
        &body.field,
    )
    .await;

    Json(json!({ "text": text }))
}
