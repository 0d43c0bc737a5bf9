//! LLM backend implementations.
//!
//! Concrete implementations of the [`ChatBackend`] and [`SearchBackend`]
//! traits defined in `fabula-core`: Qwen over an OpenAI-compatible API and
//! Baidu Qianfan AI Search over plain HTTP.
//!
//! [`ChatBackend`]: fabula_core::llm::backend::ChatBackend
//! [`SearchBackend`]: fabula_core::llm::backend::SearchBackend

pub mod aisearch;
pub mod qwen;
