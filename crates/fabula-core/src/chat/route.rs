//! Per-message route classification.
//!
//! Order of decision: process-wide override, then empty-message default,
//! then the keyword short-circuit, then a single-turn model verdict. Every
//! ambiguous or failed path lands on `chat`.

use serde::Deserialize;
use tracing::debug;

use fabula_types::route::{Route, RouteMode};

use crate::llm::backend::ChatBackend;
use crate::llm::json::extract_json;

/// Freshness/fact trigger terms. Any hit routes to search without a model
/// call.
const TRIGGER_TERMS: [&str; 23] = [
    "今天",
    "昨日",
    "明天",
    "近期",
    "最近",
    "刚刚",
    "最新",
    "消息",
    "新闻",
    "价格",
    "油价",
    "汇率",
    "股价",
    "天气",
    "政策",
    "公告",
    "发布",
    "发生了什么",
    "谁是",
    "什么时候",
    "在哪",
    "来源",
    "链接",
];

/// Strict shape for the routing model's verdict. Missing field or an
/// unknown value fails the parse, which defaults the route to chat.
#[derive(Debug, Deserialize)]
struct RouteDecision {
    route: Route,
}

/// Chooses the backend for each incoming message.
#[derive(Debug, Clone, Copy)]
pub struct RouteClassifier {
    mode: RouteMode,
}

impl RouteClassifier {
    pub fn new(mode: RouteMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RouteMode {
        self.mode
    }

    pub async fn classify<C: ChatBackend>(&self, message: &str, backend: &C) -> Route {
        if let Some(route) = self.mode.forced() {
            return route;
        }

        let resolved = message.trim();
        if resolved.is_empty() {
            return Route::Chat;
        }

        if TRIGGER_TERMS.iter().any(|term| resolved.contains(term)) {
            return Route::Search;
        }

        let prompt = route_prompt(resolved);
        let text = match backend.chat_once(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                debug!(error = %err, "route model call failed, defaulting to chat");
                return Route::Chat;
            }
        };

        extract_json(&text)
            .and_then(|value| serde_json::from_value::<RouteDecision>(value).ok())
            .map(|decision| decision.route)
            .unwrap_or(Route::Chat)
    }
}

fn route_prompt(message: &str) -> String {
    format!(
        "你是意图识别器，只做路由判断，不要输出多余内容。\n\
         判断用户问题是否需要联网搜索（需要最新信息、具体事实核验、引用来源、或依赖外部网页）。\n\
         仅输出JSON，不要解释。\n\
         JSON格式：{{\"route\":\"search\"}} 或 {{\"route\":\"chat\"}}\n\
         用户问题：{message}\n"
    )
}
