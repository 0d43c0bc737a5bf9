//! QwenBackend -- concrete [`ChatBackend`] for OpenAI-compatible APIs.
//!
//! Talks to DashScope's compatible-mode endpoint by default, but any
//! OpenAI-compatible base URL works. Uses [`async_openai`] for type-safe
//! request/response handling and built-in SSE streaming.

pub mod streaming;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use async_openai::Client;

use fabula_core::llm::backend::{ChatBackend, FragmentStream};
use fabula_types::error::BackendError;
use fabula_types::llm::{ChatRequest, Message, MessageRole};

use crate::config::ChatConfig;

use self::streaming::fragment_stream;

/// Chat backend over an OpenAI-compatible chat completions API.
///
/// # API Key Security
///
/// Does NOT derive Debug to prevent accidental exposure of the API key
/// stored inside the `async_openai::Client`.
pub struct QwenBackend {
    client: Client<OpenAIConfig>,
    base_url: String,
    model: String,
}

impl QwenBackend {
    /// Create a backend from chat configuration.
    ///
    /// An empty API key is accepted; requests will then fail per call and
    /// callers recover. This mirrors how an unset key behaves operationally:
    /// the process still starts, chat just cannot answer.
    pub fn new(config: &ChatConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build a [`CreateChatCompletionRequest`] from a [`ChatRequest`].
    fn build_request(&self, request: &ChatRequest, stream: bool) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::new();

        // System instruction travels as the leading system message.
        if let Some(ref system) = request.system {
            messages.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system.clone()),
                    name: None,
                },
            ));
        }

        for msg in &request.messages {
            let oai_msg = match msg.role {
                MessageRole::System => ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessage {
                        content: ChatCompletionRequestSystemMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    },
                ),
                MessageRole::User => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    },
                ),
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                                msg.content.clone(),
                            )),
                            refusal: None,
                            name: None,
                            audio: None,
                            tool_calls: None,
                            function_call: None,
                        },
                    )
                }
            };
            messages.push(oai_msg);
        }

        let mut req = CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            ..Default::default()
        };

        if stream {
            req.stream = Some(true);
        }

        req
    }
}

// QwenBackend intentionally does NOT derive Debug to prevent accidental
// exposure of internal state including the API key inside the async-openai
// Client.

impl ChatBackend for QwenBackend {
    async fn chat_once(&self, prompt: &str) -> Result<String, BackendError> {
        let request = ChatRequest::new(vec![Message::user(prompt)]);
        self.chat(&request).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, BackendError> {
        let oai_request = self.build_request(request, false);

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(|err| {
                tracing::warn!(
                    base_url = %self.base_url,
                    model = %self.model,
                    error = %err,
                    "chat completion request failed"
                );
                map_openai_error(err)
            })?;

        // Extract content from the first choice.
        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(BackendError::EmptyReply);
        }

        Ok(content)
    }

    fn chat_stream(&self, request: ChatRequest) -> FragmentStream {
        let oai_request = self.build_request(&request, true);

        // Clone the client for the 'static stream closure.
        fragment_stream(
            self.client.clone(),
            oai_request,
            self.base_url.clone(),
            self.model.clone(),
        )
    }
}

/// Map an `async_openai::error::OpenAIError` to a [`BackendError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> BackendError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            // Check for known error types by code or type field
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "authentication_error"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API key")
            {
                BackendError::AuthenticationFailed
            } else {
                BackendError::Transport(err.to_string())
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status() {
            Some(status) if status.as_u16() == 401 => BackendError::AuthenticationFailed,
            _ => BackendError::Transport(err.to_string()),
        },
        OpenAIError::JSONDeserialize(_, content) => {
            BackendError::Malformed(format!("failed to parse response: {content}"))
        }
        _ => BackendError::Transport(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::{ApiError, OpenAIError};

    fn make_backend() -> QwenBackend {
        QwenBackend::new(&ChatConfig {
            api_key: "test-key-not-real".to_string(),
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            model: "qwen-plus".to_string(),
        })
    }

    #[test]
    fn test_build_request_prepends_system() {
        let backend = make_backend();
        let request = ChatRequest::with_system(
            "你是中文小说创作助手。",
            vec![Message::user("写一个开头"), Message::assistant("好的")],
        );

        let oai_req = backend.build_request(&request, false);
        assert_eq!(oai_req.model, "qwen-plus");
        assert_eq!(oai_req.messages.len(), 3);
        assert!(matches!(
            oai_req.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            oai_req.messages[1],
            ChatCompletionRequestMessage::User(_)
        ));
        assert!(matches!(
            oai_req.messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert_eq!(oai_req.stream, None);
    }

    #[test]
    fn test_build_request_without_system() {
        let backend = make_backend();
        let request = ChatRequest::new(vec![Message::user("你好")]);

        let oai_req = backend.build_request(&request, false);
        assert_eq!(oai_req.messages.len(), 1);
        assert!(matches!(
            oai_req.messages[0],
            ChatCompletionRequestMessage::User(_)
        ));
    }

    #[test]
    fn test_build_request_stream_flag() {
        let backend = make_backend();
        let request = ChatRequest::new(vec![Message::user("你好")]);

        let oai_req = backend.build_request(&request, true);
        assert_eq!(oai_req.stream, Some(true));
    }

    #[test]
    fn test_map_openai_error_auth_by_code() {
        let err = OpenAIError::ApiError(ApiError {
            message: "bad credentials".to_string(),
            r#type: Some("authentication_error".to_string()),
            param: None,
            code: None,
        });
        assert!(matches!(
            map_openai_error(err),
            BackendError::AuthenticationFailed
        ));
    }

    #[test]
    fn test_map_openai_error_auth_by_message() {
        let err = OpenAIError::ApiError(ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: None,
            param: None,
            code: None,
        });
        assert!(matches!(
            map_openai_error(err),
            BackendError::AuthenticationFailed
        ));
    }

    #[test]
    fn test_map_openai_error_other_api_error_is_transport() {
        let err = OpenAIError::ApiError(ApiError {
            message: "model overloaded".to_string(),
            r#type: Some("server_error".to_string()),
            param: None,
            code: None,
        });
        assert!(matches!(map_openai_error(err), BackendError::Transport(_)));
    }
}
