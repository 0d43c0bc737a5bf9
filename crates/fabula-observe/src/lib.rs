//! Observability layer for Fabula.
//!
//! Owns tracing subscriber setup so the binary crate stays free of
//! subscriber wiring details.

pub mod tracing_setup;
