//! AiSearchBackend -- concrete [`SearchBackend`] for Baidu Qianfan AI Search.
//!
//! Plain HTTP POST to `/v2/ai_search/chat/completions`; no SDK exists for
//! this endpoint, so the wire structs live here. Each call is stateless:
//! one user message plus an instruction, never conversation history.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use fabula_core::llm::backend::SearchBackend;
use fabula_types::error::{BackendError, ConfigError};

use crate::config::SearchConfig;

/// Cap on response-body text carried into logs and error messages.
const BODY_SNIPPET_CHARS: usize = 2000;

/// Connection establishment timeout. The overall request timeout comes from
/// config because deep search answers can take minutes.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Search-augmented chat backend for the Qianfan AI Search API.
pub struct AiSearchBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    search_source: String,
    enable_corner_markers: bool,
    enable_deep_search: bool,
    stream: bool,
}

impl AiSearchBackend {
    /// Create a new search backend.
    ///
    /// Unlike the chat side, a missing key is fatal here: search silently
    /// degrading into "always the fallback sentence" is much harder to
    /// diagnose than a startup error naming the variable to set.
    pub fn new(config: &SearchConfig) -> Result<Self, ConfigError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential {
                what: "Baidu Qianfan API key",
                env_hint: "BAIDU_QIANFAN_API_KEY (or QIANFAN_API_KEY)",
            });
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .expect("failed to create reqwest client");

        Ok(Self {
            client,
            api_key: SecretString::from(config.api_key.clone()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            search_source: config.search_source.clone(),
            enable_corner_markers: config.enable_corner_markers,
            enable_deep_search: config.enable_deep_search,
            stream: config.stream,
        })
    }

    fn url(&self) -> String {
        format!("{}/v2/ai_search/chat/completions", self.base_url)
    }
}

// AiSearchBackend intentionally does NOT derive Debug to prevent accidental
// exposure of internal state. The SecretString field ensures the API key is
// never printed, but we also omit Debug entirely for defense-in-depth.

impl SearchBackend for AiSearchBackend {
    async fn search_chat(&self, message: &str, instruction: &str) -> Result<String, BackendError> {
        let payload = SearchPayload {
            messages: vec![WireMessage {
                role: "user",
                content: message,
            }],
            stream: self.stream,
            model: &self.model,
            instruction,
            enable_corner_markers: self.enable_corner_markers,
            enable_deep_search: self.enable_deep_search,
            search_source: &self.search_source,
        };
        let url = self.url();

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, model = %self.model, error = %e, "AI search request failed");
                BackendError::Transport(format!("HTTP request failed: {e}"))
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            tracing::warn!(url = %url, model = %self.model, error = %e, "AI search response unreadable");
            BackendError::Transport(format!("failed to read response body: {e}"))
        })?;

        match interpret_response(status, &body) {
            Ok(reply) => Ok(reply),
            Err(err) => {
                tracing::warn!(
                    url = %url,
                    model = %self.model,
                    status,
                    error = %err,
                    "AI search returned no usable reply"
                );
                Err(err)
            }
        }
    }
}

/// Request body for the AI Search chat completions endpoint.
#[derive(Serialize)]
struct SearchPayload<'a> {
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    model: &'a str,
    instruction: &'a str,
    enable_corner_markers: bool,
    enable_deep_search: bool,
    search_source: &'a str,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    choices: Vec<SearchChoice>,
}

#[derive(Deserialize)]
struct SearchChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Error envelope the API returns on non-2xx. `code` arrives as a number or
/// a string depending on the failure, hence the loose value type.
#[derive(Deserialize)]
struct ErrorEnvelope {
    code: Option<serde_json::Value>,
    message: Option<String>,
}

/// Map a completed HTTP exchange to a reply or an error.
///
/// Split out from the transport so the status/body handling is testable
/// without a live endpoint.
fn interpret_response(status: u16, body: &str) -> Result<String, BackendError> {
    if !(200..300).contains(&status) {
        // Prefer the structured {code, message} envelope when present.
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            if let Some(message) = envelope
                .message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
            {
                let code = envelope.code.as_ref().map(|c| match c {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
                return Err(BackendError::Api {
                    status,
                    code,
                    message: message.trim().to_string(),
                });
            }
        }
        return Err(BackendError::Api {
            status,
            code: None,
            message: truncate_chars(body, BODY_SNIPPET_CHARS),
        });
    }

    let parsed: SearchResponse = serde_json::from_str(body).map_err(|e| {
        BackendError::Malformed(format!("{e}: {}", truncate_chars(body, BODY_SNIPPET_CHARS)))
    })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content);

    match content {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(BackendError::EmptyReply),
    }
}

/// Truncate to at most `limit` characters. Byte slicing would split
/// multi-byte UTF-8 and panic, and these bodies are mostly Chinese text.
fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: &str) -> SearchConfig {
        SearchConfig {
            api_key: api_key.to_string(),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let err = AiSearchBackend::new(&make_config("   ")).err().unwrap();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
        assert!(err.to_string().contains("BAIDU_QIANFAN_API_KEY"));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let mut config = make_config("qf-test");
        config.base_url = "https://qianfan.baidubce.com/".to_string();
        let backend = AiSearchBackend::new(&config).unwrap();
        assert_eq!(
            backend.url(),
            "https://qianfan.baidubce.com/v2/ai_search/chat/completions"
        );
    }

    #[test]
    fn test_payload_wire_field_names() {
        let payload = SearchPayload {
            messages: vec![WireMessage {
                role: "user",
                content: "今天油价",
            }],
            stream: false,
            model: "ernie-3.5-8k",
            instruction: "指令",
            enable_corner_markers: false,
            enable_deep_search: true,
            search_source: "baidu_search_v2",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "今天油价");
        assert_eq!(json["stream"], false);
        assert_eq!(json["enable_corner_markers"], false);
        assert_eq!(json["enable_deep_search"], true);
        assert_eq!(json["search_source"], "baidu_search_v2");
        assert_eq!(json["instruction"], "指令");
    }

    #[test]
    fn test_interpret_response_success() {
        let body = r#"{"choices":[{"message":{"content":"  今日油价上涨。  "}}]}"#;
        assert_eq!(interpret_response(200, body).unwrap(), "今日油价上涨。");
    }

    #[test]
    fn test_interpret_response_error_envelope() {
        let body = r#"{"code":"AuthFailed","message":"bad key"}"#;
        match interpret_response(403, body) {
            Err(BackendError::Api {
                status,
                code,
                message,
            }) => {
                assert_eq!(status, 403);
                assert_eq!(code.as_deref(), Some("AuthFailed"));
                assert_eq!(message, "bad key");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_interpret_response_numeric_code_envelope() {
        let body = r#"{"code":336003,"message":"rate limit exceeded"}"#;
        match interpret_response(429, body) {
            Err(BackendError::Api { code, .. }) => {
                assert_eq!(code.as_deref(), Some("336003"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_interpret_response_non_json_error_body() {
        match interpret_response(502, "<html>Bad Gateway</html>") {
            Err(BackendError::Api {
                status,
                code,
                message,
            }) => {
                assert_eq!(status, 502);
                assert_eq!(code, None);
                assert!(message.contains("Bad Gateway"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_interpret_response_missing_content() {
        let cases = [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":null}]}"#,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
            r#"{}"#,
        ];
        for body in cases {
            assert!(matches!(
                interpret_response(200, body),
                Err(BackendError::EmptyReply)
            ));
        }
    }

    #[test]
    fn test_interpret_response_malformed_success_body() {
        assert!(matches!(
            interpret_response(200, "not json at all"),
            Err(BackendError::Malformed(_))
        ));
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        let text = "春".repeat(10);
        assert_eq!(truncate_chars(&text, 3), "春春春");
        assert_eq!(truncate_chars(&text, 10), text);
        assert_eq!(truncate_chars(&text, 100), text);
        assert_eq!(truncate_chars("", 5), "");
    }
}
