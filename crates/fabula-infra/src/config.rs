//! Application configuration loader for Fabula.
//!
//! Reads `config/base.yaml` (override with `FABULA_CONFIG_PATH`), then lays
//! environment variables over the file values, so precedence is always
//! environment > file > built-in default. A missing config file is not an
//! error; every field has a default.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use fabula_types::route::RouteMode;

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/base.yaml";

/// Qwen (OpenAI-compatible) chat backend settings.
///
/// An empty `api_key` is tolerated here: the chat backend fails per-call and
/// the engine falls back, matching how an unset DashScope key behaves.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            model: "qwen-plus".to_string(),
        }
    }
}

/// Baidu Qianfan AI Search settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub search_source: String,
    pub enable_corner_markers: bool,
    pub enable_deep_search: bool,
    pub stream: bool,
    pub read_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://qianfan.baidubce.com".to_string(),
            model: "ernie-3.5-8k".to_string(),
            search_source: "baidu_search_v2".to_string(),
            enable_corner_markers: false,
            enable_deep_search: false,
            stream: false,
            read_timeout_secs: 180,
        }
    }
}

/// Top-level application configuration.
// No Debug derive: the api_key fields must never end up in logs or panic
// messages.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chat: ChatConfig,
    pub search: SearchConfig,
    pub route_mode: RouteMode,
}

/// Load the application configuration.
///
/// Resolution order per field: environment variable > YAML file > default.
/// The file path comes from `FABULA_CONFIG_PATH`, falling back to
/// [`DEFAULT_CONFIG_PATH`].
pub async fn load_config() -> AppConfig {
    let path = std::env::var("FABULA_CONFIG_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = read_config_file(&path).await;
    overlay_env(&mut config, |name| std::env::var(name).ok());
    finalize(&mut config);
    config
}

/// Read and parse the YAML config file.
///
/// - Missing file: defaults (debug log only; running from env vars alone is
///   a supported setup).
/// - Unreadable or unparsable file: warn and fall back to defaults.
async fn read_config_file(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    // An empty file means "all defaults", not a parse error.
    if content.trim().is_empty() {
        return AppConfig::default();
    }

    match serde_yaml_ng::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

/// Apply environment-variable overrides on top of `config`.
///
/// `var` is injected so tests can run without touching process state. Empty
/// string values count as unset, except for the boolean flags where
/// [`as_bool`] keeps the current value.
fn overlay_env<F>(config: &mut AppConfig, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    let first = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| var(name).filter(|v| !v.trim().is_empty()))
    };

    if let Some(key) = first(&["AI_API_KEY", "DASHSCOPE_API_KEY"]) {
        config.chat.api_key = key;
    }
    if let Some(url) = first(&["AI_BASE_URL", "DASHSCOPE_BASE_URL"]) {
        config.chat.base_url = url;
    }
    if let Some(model) = first(&["AI_MODEL", "DASHSCOPE_MODEL"]) {
        config.chat.model = model;
    }

    if let Some(key) = first(&["BAIDU_QIANFAN_API_KEY", "QIANFAN_API_KEY"]) {
        config.search.api_key = key;
    }
    if let Some(url) = first(&["BAIDU_QIANFAN_BASE_URL"]) {
        config.search.base_url = url;
    }
    if let Some(model) = first(&["BAIDU_QIANFAN_MODEL"]) {
        config.search.model = model;
    }
    if let Some(source) = first(&["BAIDU_QIANFAN_SEARCH_SOURCE"]) {
        config.search.search_source = source;
    }
    if let Some(value) = var("BAIDU_QIANFAN_ENABLE_CORNER_MARKERS") {
        config.search.enable_corner_markers =
            as_bool(&value, config.search.enable_corner_markers);
    }
    if let Some(value) = var("BAIDU_QIANFAN_ENABLE_DEEP_SEARCH") {
        config.search.enable_deep_search = as_bool(&value, config.search.enable_deep_search);
    }
    if let Some(value) = var("BAIDU_QIANFAN_STREAM") {
        config.search.stream = as_bool(&value, config.search.stream);
    }

    if let Some(mode) = first(&["CHAT_ROUTE_MODE"]) {
        config.route_mode = RouteMode::parse(&mode);
    }
}

/// Clean up whichever values won and backfill defaults for blanked-out
/// fields. Base URLs get pasted from chat UIs and docs, so stray backticks,
/// trailing commas and whitespace are stripped rather than sent to reqwest.
fn finalize(config: &mut AppConfig) {
    config.chat.base_url = normalize_base_url(&config.chat.base_url);
    config.search.base_url = normalize_base_url(&config.search.base_url);

    let chat_defaults = ChatConfig::default();
    if config.chat.base_url.is_empty() {
        config.chat.base_url = chat_defaults.base_url;
    }
    if config.chat.model.trim().is_empty() {
        config.chat.model = chat_defaults.model;
    }

    let search_defaults = SearchConfig::default();
    if config.search.base_url.is_empty() {
        config.search.base_url = search_defaults.base_url;
    }
    if config.search.model.trim().is_empty() {
        config.search.model = search_defaults.model;
    }
    if config.search.search_source.trim().is_empty() {
        config.search.search_source = search_defaults.search_source;
    }
}

/// Parse a boolean-ish config value. Unrecognized input keeps `default`.
fn as_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => true,
        "0" | "false" | "no" | "n" | "off" => false,
        _ => default,
    }
}

/// Strip whitespace, surrounding backticks and trailing commas from a base
/// URL value.
fn normalize_base_url(value: &str) -> String {
    let v = value.trim();
    if v.is_empty() {
        return String::new();
    }
    let v = v.trim_matches('`').trim();
    let v = v.trim_end_matches(',').trim();
    v.to_string()
}

/// Resolve the data directory holding novel documents and synced config.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FABULA_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    // Home directory fallback: ~/.fabula
    if let Some(home) = dirs::home_dir() {
        return home.join(".fabula");
    }

    // Last resort: current directory
    PathBuf::from(".fabula")
}
