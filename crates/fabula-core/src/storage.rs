//! Document store port.
//!
//! Defined in fabula-core so the novel service and config sync can read and
//! write documents without depending on any specific storage backend. The
//! filesystem implementation lives in fabula-infra; tests use in-memory
//! fakes.

use std::path::Path;

use fabula_types::error::StorageError;

/// Abstraction over the blob store holding novel documents and synced
/// config. Keys are forward-slash paths (e.g. `novels/{id}/story.json`).
pub trait DocumentStore: Send + Sync {
    /// Write text at `key`, creating any parent namespace.
    fn put_text(
        &self,
        key: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Read the text at `key`. An absent key is `Ok(None)`, not an error.
    fn get_text(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Upload a local file to `key`.
    fn put_file(
        &self,
        key: &str,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Download `key` into a local file. An absent key is an error here:
    /// callers ask for files they expect to exist.
    fn get_file(
        &self,
        key: &str,
        path: &Path,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}
