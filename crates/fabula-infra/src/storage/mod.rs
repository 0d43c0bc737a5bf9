//! Document storage infrastructure.
//!
//! Implements the `DocumentStore` trait from `fabula-core` on the local
//! filesystem. Novel documents and synced config all go through this layer,
//! so swapping in an object store later only touches this module.

pub mod local;

pub use local::LocalDocumentStore;
