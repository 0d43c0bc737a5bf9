//! Session engine: route, dispatch, record.
//!
//! Orchestrates one conversation over an injected [`Session`]: classify the
//! message (unless the route is forced), call the chosen backend, append
//! exactly one user and one assistant turn. Replies are delivered either
//! blocking (`send`) or as a lazy fragment stream (`send_stream`).

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::warn;

use fabula_types::chat::{Turn, TurnRole};
use fabula_types::error::BackendError;
use fabula_types::llm::{ChatRequest, Message, MessageRole};
use fabula_types::route::Route;

use crate::chat::prompt::{FALLBACK_REPLY, SEARCH_NOTICE, SYSTEM_PROMPT};
use crate::chat::route::RouteClassifier;
use crate::chat::session::Session;
use crate::llm::backend::{ChatBackend, FragmentStream, SearchBackend};

/// Slice width, in characters, when chunking a blocking reply for streaming
/// delivery.
pub const STREAM_CHUNK_CHARS: usize = 40;

/// Orchestrates one conversation.
///
/// Cheap to clone; backends and session are shared through `Arc`.
pub struct ChatEngine<C, S> {
    chat: Arc<C>,
    search: Arc<S>,
    session: Arc<Session>,
    classifier: RouteClassifier,
    system_prompt: Arc<str>,
}

impl<C, S> Clone for ChatEngine<C, S> {
    fn clone(&self) -> Self {
        Self {
            chat: Arc::clone(&self.chat),
            search: Arc::clone(&self.search),
            session: Arc::clone(&self.session),
            classifier: self.classifier,
            system_prompt: Arc::clone(&self.system_prompt),
        }
    }
}

impl<C, S> ChatEngine<C, S>
where
    C: ChatBackend + 'static,
    S: SearchBackend + 'static,
{
    pub fn new(
        chat: Arc<C>,
        search: Arc<S>,
        session: Arc<Session>,
        classifier: RouteClassifier,
    ) -> Self {
        Self {
            chat,
            search,
            session,
            classifier,
            system_prompt: Arc::from(SYSTEM_PROMPT),
        }
    }

    /// Snapshot copy of the conversation so far.
    pub fn history(&self) -> Vec<Turn> {
        self.session.snapshot()
    }

    pub fn clear_history(&self) {
        self.session.clear();
    }

    /// Blocking send. Appends one user and one assistant turn; an empty
    /// message returns an empty reply with no side effects.
    pub async fn send(&self, message: &str, forced_route: Option<Route>) -> String {
        let content = message.trim();
        if content.is_empty() {
            return String::new();
        }

        let route = match forced_route {
            Some(route) => route,
            None => self.classifier.classify(content, self.chat.as_ref()).await,
        };

        self.session.push(Turn::user(content));

        let outcome = match route {
            Route::Search => self.search.search_chat(content, &self.system_prompt).await,
            Route::Chat => self.chat.chat(&self.chat_request()).await,
        };

        let reply = resolve_reply(route, outcome);
        self.session.push(Turn::assistant(reply.clone()));
        reply
    }

    /// Streaming send. Lazy: nothing runs until the stream is polled, and
    /// dropping the stream cancels in-flight backend work. The assistant
    /// turn is recorded only after the final fragment has been yielded, so
    /// a consumer that saw the stream end has the complete reply.
    pub fn send_stream(
        &self,
        message: impl Into<String>,
        forced_route: Option<Route>,
    ) -> FragmentStream {
        let engine = self.clone();
        let message = message.into();

        Box::pin(async_stream::stream! {
            let content = message.trim().to_string();
            if content.is_empty() {
                return;
            }

            let route = match forced_route {
                Some(route) => route,
                None => engine.classifier.classify(&content, engine.chat.as_ref()).await,
            };

            engine.session.push(Turn::user(content.clone()));

            match route {
                Route::Search => {
                    yield SEARCH_NOTICE.to_string();
                    let outcome = engine
                        .search
                        .search_chat(&content, &engine.system_prompt)
                        .await;
                    let reply = resolve_reply(route, outcome);
                    for chunk in chunk_text(&reply, STREAM_CHUNK_CHARS) {
                        yield chunk;
                    }
                    engine.session.push(Turn::assistant(reply));
                }
                Route::Chat => {
                    let mut fragments = engine.chat.chat_stream(engine.chat_request());
                    let mut accumulated = String::new();
                    while let Some(fragment) = fragments.next().await {
                        accumulated.push_str(&fragment);
                        yield fragment;
                    }
                    let mut reply = accumulated.trim().to_string();
                    if reply.is_empty() {
                        warn!(%route, "stream produced no usable reply");
                        reply = FALLBACK_REPLY.to_string();
                        yield reply.clone();
                    }
                    engine.session.push(Turn::assistant(reply));
                }
            }
        })
    }

    /// System prompt plus the full history snapshot, which already contains
    /// the just-appended user turn.
    fn chat_request(&self) -> ChatRequest {
        let messages = self
            .session
            .snapshot()
            .into_iter()
            .map(|turn| Message {
                role: match turn.role {
                    TurnRole::User => MessageRole::User,
                    TurnRole::Assistant => MessageRole::Assistant,
                },
                content: turn.content,
            })
            .collect();
        ChatRequest::with_system(self.system_prompt.as_ref(), messages)
    }
}

/// Trimmed backend reply, or the fallback sentence when the call failed or
/// came back empty.
fn resolve_reply(route: Route, outcome: Result<String, BackendError>) -> String {
    match outcome {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            warn!(%route, "backend returned an empty reply");
            FALLBACK_REPLY.to_string()
        }
        Err(err) => {
            warn!(%route, error = %err, "backend call failed");
            FALLBACK_REPLY.to_string()
        }
    }
}

/// Fixed-width character chunks, last one short.
fn chunk_text(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fabula_types::route::RouteMode;

    fn engine<C, S>(chat: C, search: S) -> ChatEngine<C, S>
    where
        C: ChatBackend + 'static,
        S: SearchBackend + 'static,
    {
        ChatEngine::new(
            Arc::new(chat),
            Arc::new(search),
            Arc::new(Session::new()),
            RouteClassifier::new(RouteMode::Auto),
        )
    }

    /// Chat backend with a scripted reply and stream, counting calls and
    /// capturing the last multi-turn request.
    struct StubChat {
        reply: Option<String>,
        fragments: Vec<String>,
        calls: AtomicUsize,
        last_request: Mutex<Option<ChatRequest>>,
    }

    impl StubChat {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                fragments: Vec::new(),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn streaming(fragments: &[&str]) -> Self {
            Self {
                reply: None,
                fragments: fragments.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ChatBackend for StubChat {
        async fn chat_once(&self, _prompt: &str) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(BackendError::EmptyReply),
            }
        }

        async fn chat(&self, request: &ChatRequest) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(BackendError::EmptyReply),
            }
        }

        fn chat_stream(&self, request: ChatRequest) -> FragmentStream {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request);
            Box::pin(futures_util::stream::iter(self.fragments.clone()))
        }
    }

    /// Search backend that either answers or fails like a 403.
    struct StubSearch {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl StubSearch {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SearchBackend for StubSearch {
        async fn search_chat(
            &self,
            _message: &str,
            _instruction: &str,
        ) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(BackendError::Api {
                    status: 403,
                    code: Some("AuthFailed".to_string()),
                    message: "bad key".to_string(),
                }),
            }
        }
    }

    async fn collect(stream: FragmentStream) -> Vec<String> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_empty_send_is_a_noop() {
        let engine = engine(StubChat::replying("不该被调用"), StubSearch::failing());
        let reply = engine.send("   \n", None).await;
        assert_eq!(reply, "");
        assert!(engine.history().is_empty());
        assert_eq!(engine.chat.calls(), 0);
        assert_eq!(engine.search.calls(), 0);
    }

    #[tokio::test]
    async fn test_send_appends_user_and_assistant() {
        let engine = engine(StubChat::replying("先定主角目标。"), StubSearch::failing());
        let reply = engine.send("怎么开头？", Some(Route::Chat)).await;
        assert_eq!(reply, "先定主角目标。");

        let history = engine.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, TurnRole::User);
        assert_eq!(history[0].content, "怎么开头？");
        assert_eq!(history[1].role, TurnRole::Assistant);
        assert_eq!(history[1].content, "先定主角目标。");
    }

    #[tokio::test]
    async fn test_history_grows_by_two_until_cap() {
        let engine = engine(StubChat::replying("好"), StubSearch::failing());
        for i in 0..31 {
            engine.send(&format!("第{i}问"), Some(Route::Chat)).await;
            let len = engine.history().len();
            assert!(len <= 60);
            assert_eq!(len % 2, 0);
        }
        // 31 sends = 62 turns, truncated to the newest 60.
        assert_eq!(engine.history().len(), 60);
        assert_eq!(engine.history()[0].content, "第1问");
    }

    #[tokio::test]
    async fn test_forced_search_bypasses_classifier() {
        // No trigger keyword; an Auto classify would have hit the chat model.
        let engine = engine(StubChat::replying("unused"), StubSearch::replying("搜到了"));
        let reply = engine.send("讲个笑话", Some(Route::Search)).await;
        assert_eq!(reply, "搜到了");
        assert_eq!(engine.chat.calls(), 0);
        assert_eq!(engine.search.calls(), 1);
    }

    #[tokio::test]
    async fn test_search_failure_yields_fallback_and_two_turns() {
        let engine = engine(StubChat::replying("unused"), StubSearch::failing());
        let reply = engine.send("讲个笑话", Some(Route::Search)).await;
        assert_eq!(reply, FALLBACK_REPLY);

        let history = engine.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_blank_backend_reply_yields_fallback() {
        let engine = engine(StubChat::replying("  \n "), StubSearch::failing());
        let reply = engine.send("在吗", Some(Route::Chat)).await;
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_chat_request_carries_system_and_full_history() {
        let engine = engine(StubChat::replying("回1"), StubSearch::failing());
        engine.send("问1", Some(Route::Chat)).await;
        engine.send("问2", Some(Route::Chat)).await;

        let request = engine.chat.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.system.as_deref(), Some(SYSTEM_PROMPT));
        let contents: Vec<&str> = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["问1", "回1", "问2"]);
        assert_eq!(request.messages[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_stream_chat_proxies_fragments_then_records() {
        let engine = engine(
            StubChat::streaming(&["Hel", "lo,", " world"]),
            StubSearch::failing(),
        );
        let fragments = collect(engine.send_stream("打个招呼", Some(Route::Chat))).await;
        assert_eq!(fragments, vec!["Hel", "lo,", " world"]);

        let history = engine.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "Hello, world");
    }

    #[tokio::test]
    async fn test_stream_chat_empty_emits_fallback_once() {
        let engine = engine(StubChat::streaming(&[]), StubSearch::failing());
        let fragments = collect(engine.send_stream("在吗", Some(Route::Chat))).await;
        assert_eq!(fragments, vec![FALLBACK_REPLY.to_string()]);
        assert_eq!(engine.history()[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_stream_search_notice_then_chunks() {
        let reply: String = "春".repeat(95);
        let engine = engine(StubChat::replying("unused"), StubSearch::replying(&reply));
        let fragments = collect(engine.send_stream("查个典故", Some(Route::Search))).await;

        assert_eq!(fragments[0], SEARCH_NOTICE);
        let chunks = &fragments[1..];
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 40);
        assert_eq!(chunks[1].chars().count(), 40);
        assert_eq!(chunks[2].chars().count(), 15);
        assert_eq!(chunks.concat(), reply);

        // The notice is delivery feedback, not reply content.
        let history = engine.history();
        assert_eq!(history[1].content, reply);
    }

    #[tokio::test]
    async fn test_stream_search_failure_chunks_fallback() {
        let engine = engine(StubChat::replying("unused"), StubSearch::failing());
        let fragments = collect(engine.send_stream("查个典故", Some(Route::Search))).await;
        assert_eq!(fragments[0], SEARCH_NOTICE);
        assert_eq!(fragments[1..].concat(), FALLBACK_REPLY);
        assert_eq!(engine.history()[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_stream_empty_message_yields_nothing() {
        let engine = engine(StubChat::replying("unused"), StubSearch::failing());
        let fragments = collect(engine.send_stream("  ", None)).await;
        assert!(fragments.is_empty());
        assert!(engine.history().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_sends_keep_even_length() {
        let engine = engine(StubChat::replying("好"), StubSearch::failing());
        let mut tasks = Vec::new();
        for i in 0..8 {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                engine.send(&format!("并发{i}"), Some(Route::Chat)).await
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(engine.history().len(), 16);
    }

    #[test]
    fn test_chunk_text_counts_characters_not_bytes() {
        let chunks = chunk_text(&"好".repeat(41), 40);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 40);
        assert_eq!(chunks[1], "好");

        assert!(chunk_text("", 40).is_empty());
    }
}
