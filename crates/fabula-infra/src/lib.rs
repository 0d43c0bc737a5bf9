//! Infrastructure layer for Fabula.
//!
//! Contains implementations of the ports defined in `fabula-core`: the Qwen
//! chat backend (OpenAI-compatible API), the Baidu AI Search backend, the
//! local-filesystem document store, and YAML configuration loading with
//! environment-variable overrides.

pub mod config;
pub mod llm;
pub mod storage;
pub mod sync;
