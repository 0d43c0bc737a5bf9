//! Chat session engine: bounded history, route classification, dual-mode
//! (blocking / streaming) reply delivery.

pub mod engine;
pub mod prompt;
pub mod route;
pub mod session;
