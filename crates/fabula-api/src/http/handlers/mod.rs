//! HTTP request handlers.

pub mod assist;
pub mod chat;
pub mod novel;
