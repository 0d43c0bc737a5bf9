//! Application state wiring all services together.
//!
//! AppState holds the concrete engine and services used by the REST API
//! handlers. The engine and novel service are generic over backend and
//! storage traits, but AppState pins them to the concrete infra
//! implementations.

use std::sync::Arc;

use fabula_core::chat::engine::ChatEngine;
use fabula_core::chat::route::RouteClassifier;
use fabula_core::chat::session::Session;
use fabula_core::novel::service::NovelService;
use fabula_infra::config::{load_config, resolve_data_dir};
use fabula_infra::llm::aisearch::AiSearchBackend;
use fabula_infra::llm::qwen::QwenBackend;
use fabula_infra::storage::LocalDocumentStore;

/// Concrete engine type pinned to the infra backends.
pub type ConcreteEngine = ChatEngine<QwenBackend, AiSearchBackend>;

/// Shared application state, cloned per request by axum.
///
/// Everything inside is Arc-shared, so clones are cheap and all requests
/// see the same conversation session.
#[derive(Clone)]
pub struct AppState {
    pub engine: ConcreteEngine,
    pub novels: Arc<NovelService<LocalDocumentStore>>,
    /// Direct handle to the chat backend for single-turn utility calls
    /// (naming, text optimization) that bypass the conversation session.
    pub chat: Arc<QwenBackend>,
}

impl AppState {
    /// Initialize the application state: load config, wire backends.
    ///
    /// A missing search credential is fatal here; a missing chat key is
    /// surfaced per call instead, so the novel endpoints stay usable
    /// without one.
    pub async fn init() -> anyhow::Result<Self> {
        let config = load_config().await;

        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;
        let store = Arc::new(LocalDocumentStore::new(data_dir));

        let chat = Arc::new(QwenBackend::new(&config.chat));
        let search = Arc::new(AiSearchBackend::new(&config.search)?);

        let engine = ChatEngine::new(
            Arc::clone(&chat),
            search,
            Arc::new(Session::new()),
            RouteClassifier::new(config.route_mode),
        );

        Ok(Self {
            engine,
            novels: Arc::new(NovelService::new(store)),
            chat,
        })
    }
}
