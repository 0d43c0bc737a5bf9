//! Backend route selection types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The backend chosen to answer one user message. Derived per turn, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Chat,
    Search,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Chat => write!(f, "chat"),
            Route::Search => write!(f, "search"),
        }
    }
}

impl FromStr for Route {
    type Err = String;

    /// Accepts the backend aliases used by operators and the front-end:
    /// `chat`/`qwen`/`llm` and `search`/`baidu`/`ai_search`. The serde
    /// representation stays strict (`chat`/`search` only) because it is what
    /// the routing model is instructed to emit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chat" | "qwen" | "llm" => Ok(Route::Chat),
            "search" | "baidu" | "ai_search" => Ok(Route::Search),
            other => Err(format!("invalid route: '{other}'")),
        }
    }
}

/// Process-wide routing override, resolved once from configuration.
///
/// `Auto` lets the classifier decide per message; `Chat`/`Search` pin every
/// message to that backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    #[default]
    Auto,
    Chat,
    Search,
}

impl RouteMode {
    /// Lenient parse for config/env values: empty, `auto`, or anything
    /// unrecognized means automatic classification.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "" | "auto" => RouteMode::Auto,
            other => match other.parse::<Route>() {
                Ok(Route::Chat) => RouteMode::Chat,
                Ok(Route::Search) => RouteMode::Search,
                Err(_) => RouteMode::Auto,
            },
        }
    }

    /// The forced route, if this mode pins one.
    pub fn forced(self) -> Option<Route> {
        match self {
            RouteMode::Auto => None,
            RouteMode::Chat => Some(Route::Chat),
            RouteMode::Search => Some(Route::Search),
        }
    }
}

impl fmt::Display for RouteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMode::Auto => write!(f, "auto"),
            RouteMode::Chat => write!(f, "chat"),
            RouteMode::Search => write!(f, "search"),
        }
    }
}
