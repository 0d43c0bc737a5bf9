//! Business logic and port definitions for Fabula.
//!
//! This crate holds the chat session engine, route classification, the
//! novel document service, and the traits ("ports") that the infrastructure
//! layer implements. It depends only on `fabula-types` -- never on
//! `fabula-infra` or any HTTP/IO crate.

pub mod chat;
pub mod llm;
pub mod novel;
pub mod storage;
