//! Config file sync between the working copy and the document store.
//!
//! `base.yaml` holds API keys, so it is deliberately not committed; push and
//! pull move it through the (private) document store instead so a second
//! machine can be set up without re-typing credentials.

use std::path::Path;

use fabula_core::storage::DocumentStore;
use fabula_types::error::StorageError;

/// Store key holding the synced config file.
pub const CONFIG_KEY: &str = "config/base.yaml";

/// Upload the local config file to the store.
pub async fn push_config<D: DocumentStore>(store: &D, local: &Path) -> Result<(), StorageError> {
    if !local.exists() {
        return Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("local config file not found: {}", local.display()),
        )));
    }
    store.put_file(CONFIG_KEY, local).await?;
    tracing::info!(key = CONFIG_KEY, file = %local.display(), "config pushed");
    Ok(())
}

/// Download the stored config file over the local one.
pub async fn pull_config<D: DocumentStore>(store: &D, local: &Path) -> Result<(), StorageError> {
    if let Some(parent) = local.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    store.get_file(CONFIG_KEY, local).await?;
    tracing::info!(key = CONFIG_KEY, file = %local.display(), "config pulled");
    Ok(())
}
