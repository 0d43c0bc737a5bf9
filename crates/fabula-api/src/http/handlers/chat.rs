//! Conversation endpoints backed by the shared chat engine.
//!
//! All four endpoints operate on the single process-wide session. The
//! streaming variant returns a chunked plain-text body rather than SSE;
//! the front-end appends raw fragments as they arrive and treats the end
//! of the body as the end of the reply.

use std::convert::Infallible;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};

use fabula_types::chat::Turn;
use fabula_types::route::Route;

use crate::state::AppState;

/// Request body shared by the blocking and streaming send endpoints.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// The user message.
    pub message: String,
    /// Optional forced route (`chat`/`search` and their aliases). Absent
    /// or unrecognized values fall back to automatic classification.
    #[serde(default)]
    pub route: Option<String>,
}

impl SendRequest {
    fn forced_route(&self) -> Option<Route> {
        self.route.as_deref().and_then(|raw| raw.parse().ok())
    }
}

/// GET /api/chat/history - Conversation so far, oldest first.
pub async fn history(State(state): State<AppState>) -> Json<Vec<Turn>> {
    Json(state.engine.history())
}

/// POST /api/chat/send - Blocking send; replies with the full text.
pub async fn send(State(state): State<AppState>, Json(body): Json<SendRequest>) -> Json<Value> {
    let reply = state.engine.send(&body.message, body.forced_route()).await;
    Json(json!({ "reply": reply }))
}

/// POST /api/chat/send_stream - Reply as a chunked plain-text stream.
///
/// The engine's fragment stream is lazy, so a client that disconnects
/// before reading cancels the backend call.
pub async fn send_stream(State(state): State<AppState>, Json(body): Json<SendRequest>) -> Response {
    let forced = body.forced_route();
    let fragments = state.engine.send_stream(body.message, forced);
    let stream_body = Body::from_stream(fragments.map(Ok::<_, Infallible>));

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        stream_body,
    )
        .into_response()
}

/// POST /api/chat/clear - Drop the whole conversation.
pub async fn clear(State(state): State<AppState>) -> Json<Value> {
    state.engine.clear_history();
    Json(json!({ "ok": true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(route: Option<&str>) -> SendRequest {
        SendRequest {
            message: "你好".to_string(),
            route: route.map(str::to_string),
        }
    }

    #[test]
    fn test_route_aliases_accepted() {
        assert_eq!(request(Some("search")).forced_route(), Some(Route::Search));
        assert_eq!(request(Some("baidu")).forced_route(), Some(Route::Search));
        assert_eq!(request(Some("qwen")).forced_route(), Some(Route::Chat));
    }

    #[test]
    fn test_unknown_route_falls_back_to_auto() {
        assert_eq!(request(Some("google")).forced_route(), None);
        assert_eq!(request(None).forced_route(), None);
    }

    #[test]
    fn test_route_field_optional_in_json() {
        let body: SendRequest = serde_json::from_str(r#"{"message":"你好"}"#).unwrap();
        assert_eq!(body.forced_route(), None);
    }
}
