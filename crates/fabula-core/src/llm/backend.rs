//! ChatBackend and SearchBackend trait definitions.
//!
//! These are the core abstractions the session engine dispatches to. Uses
//! RPITIT (Rust 2024 edition) for the request/response calls and
//! `Pin<Box<dyn Stream>>` for streaming, so engine code can hold the stream
//! without naming the concrete backend type.
//!
//! Implementations live in fabula-infra (`QwenBackend`, `AiSearchBackend`).

use std::pin::Pin;

use futures_util::Stream;

use fabula_types::error::BackendError;
use fabula_types::llm::ChatRequest;

/// A finite, lazy sequence of reply text fragments.
///
/// Fragments are always non-empty strings. The sequence ending is the only
/// completion signal; producers log their own failures.
pub type FragmentStream = Pin<Box<dyn Stream<Item = String> + Send + 'static>>;

/// General-purpose chat model backend (Qwen over an OpenAI-compatible API).
pub trait ChatBackend: Send + Sync {
    /// Single-turn call with a bare prompt. Used by the route classifier and
    /// the naming/optimize helpers.
    fn chat_once(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send;

    /// Multi-turn call with an optional system instruction.
    fn chat(
        &self,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send;

    /// Streaming call. Yields each non-empty content fragment as it
    /// arrives; empty or malformed fragments are skipped. On failure the
    /// stream logs and simply ends -- consumers see no more fragments.
    fn chat_stream(&self, request: ChatRequest) -> FragmentStream;
}

/// Search-augmented backend (Baidu AI Search). Stateless per call: it
/// receives one message plus an instruction, never conversation history.
pub trait SearchBackend: Send + Sync {
    fn search_chat(
        &self,
        message: &str,
        instruction: &str,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send;
}
