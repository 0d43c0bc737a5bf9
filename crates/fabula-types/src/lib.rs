//! Shared domain types for Fabula.
//!
//! This crate contains the types used across the Fabula workspace:
//! conversation turns, backend request shapes, routing enums, novel
//! documents, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod chat;
pub mod error;
pub mod llm;
pub mod novel;
pub mod route;
