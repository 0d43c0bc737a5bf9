//! OpenAI SSE stream to text-fragment adapter.
//!
//! Collapses `async-openai`'s chunk/choice/delta shape down to the plain
//! fragment stream the session engine consumes. The engine only needs text:
//! there is no terminal event, the stream simply ends. Mid-stream failures
//! are logged here and end the stream early; the engine treats an overall
//! empty result as a failed turn.

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::CreateChatCompletionRequest;
use async_openai::Client;
use futures_util::StreamExt;

use fabula_core::llm::backend::FragmentStream;

/// Open a streaming chat completion and yield each non-empty content delta.
///
/// Nothing is sent until the returned stream is first polled. Dropping the
/// stream cancels the underlying request.
pub(super) fn fragment_stream(
    client: Client<OpenAIConfig>,
    request: CreateChatCompletionRequest,
    base_url: String,
    model: String,
) -> FragmentStream {
    Box::pin(async_stream::stream! {
        let mut oai_stream = match client.chat().create_stream(request).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(
                    base_url = %base_url,
                    model = %model,
                    error = %err,
                    "failed to open chat completion stream"
                );
                return;
            }
        };

        while let Some(result) = oai_stream.next().await {
            let chunk = match result {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::warn!(
                        base_url = %base_url,
                        model = %model,
                        error = %err,
                        "chat completion stream aborted"
                    );
                    break;
                }
            };

            for choice in &chunk.choices {
                if let Some(ref text) = choice.delta.content {
                    if !text.is_empty() {
                        yield text.clone();
                    }
                }
            }
        }
    })
}
