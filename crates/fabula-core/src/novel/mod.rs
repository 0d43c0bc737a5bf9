//! Novel library: document service plus model-assisted helpers.

pub mod naming;
pub mod revise;
pub mod service;
