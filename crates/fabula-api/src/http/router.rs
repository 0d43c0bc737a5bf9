//! Axum router configuration with middleware.
//!
//! All API routes are under `/api`. Middleware: CORS (open, the UI runs on
//! a local dev server during development) and request tracing.
//!
//! In production the front-end is served from `web/` (configurable via
//! `FABULA_WEB_DIR`). API routes take priority; unknown paths fall through
//! to `index.html`. If the directory does not exist, only the API is
//! served.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Novel library
        .route("/novels", get(handlers::novel::list_novels))
        .route("/novels", post(handlers::novel::create_novel))
        .route("/novels/{id}", get(handlers::novel::get_novel))
        .route("/novels/{id}/story", post(handlers::novel::save_story))
        .route(
            "/novels/{id}/advanced",
            post(handlers::novel::save_advanced),
        )
        // Writing utilities
        .route("/naming", post(handlers::assist::naming))
        .route("/optimize", post(handlers::assist::optimize))
        // Conversation
        .route("/chat/history", get(handlers::chat::history))
        .route("/chat/send", post(handlers::chat::send))
        .route("/chat/send_stream", post(handlers::chat::send_stream))
        .route("/chat/clear", post(handlers::chat::clear));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Serve the front-end from disk if the directory exists. API routes
    // and /health take priority; unknown paths fall back to index.html.
    let web_dir = std::env::var("FABULA_WEB_DIR").unwrap_or_else(|_| "web".to_string());
    if std::path::Path::new(&web_dir).exists() {
        let index_path = format!("{}/index.html", web_dir);
        let serve_dir = ServeDir::new(&web_dir).fallback(ServeFile::new(index_path));
        router = router.fallback_service(serve_dir);
        tracing::info!(path = %web_dir, "static front-end serving enabled");
    }

    router
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
