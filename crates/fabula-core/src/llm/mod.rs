//! Backend ports and model-output utilities.

pub mod backend;
pub mod json;
