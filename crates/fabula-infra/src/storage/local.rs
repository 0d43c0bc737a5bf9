//! Local-filesystem [`DocumentStore`].
//!
//! Keys are forward-slash relative paths mapped under a root directory
//! (`~/.fabula` by default). Parent directories are created on write, so
//! callers never pre-create the tree.

use std::path::{Component, Path, PathBuf};

use fabula_core::storage::DocumentStore;
use fabula_types::error::StorageError;

/// Document store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `key` to a path under the root.
    ///
    /// Leading slashes are ignored (keys are store-relative); `..` and other
    /// non-plain components are rejected so a key can never escape the root.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let trimmed = key.trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        let rel = Path::new(trimmed);
        for component in rel.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(StorageError::InvalidKey(key.to_string())),
            }
        }

        Ok(self.root.join(rel))
    }

    async fn ensure_parent(path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

impl DocumentStore for LocalDocumentStore {
    async fn put_text(&self, key: &str, text: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        Self::ensure_parent(&path).await?;
        tokio::fs::write(&path, text).await?;
        tracing::debug!(key, path = %path.display(), "document written");
        Ok(())
    }

    async fn get_text(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn put_file(&self, key: &str, file: &Path) -> Result<(), StorageError> {
        let dest = self.resolve(key)?;
        Self::ensure_parent(&dest).await?;
        tokio::fs::copy(file, &dest).await?;
        tracing::debug!(key, file = %file.display(), "file uploaded");
        Ok(())
    }

    async fn get_file(&self, key: &str, file: &Path) -> Result<(), StorageError> {
        let src = self.resolve(key)?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        match tokio::fs::copy(&src, file).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store() -> (TempDir, LocalDocumentStore) {
        let tmp = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(tmp.path());
        (tmp, store)
    }

    #[tokio::test]
    async fn test_put_and_get_text() {
        let (_tmp, store) = make_store();
        store
            .put_text("novels/abc/story.json", "{\"background\":\"山村\"}")
            .await
            .unwrap();

        let text = store.get_text("novels/abc/story.json").await.unwrap();
        assert_eq!(text.as_deref(), Some("{\"background\":\"山村\"}"));
    }

    #[tokio::test]
    async fn test_get_text_missing_is_none() {
        let (_tmp, store) = make_store();
        assert_eq!(store.get_text("novels/index.json").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_text_overwrites() {
        let (_tmp, store) = make_store();
        store.put_text("a/b.txt", "v1").await.unwrap();
        store.put_text("a/b.txt", "v2").await.unwrap();
        assert_eq!(store.get_text("a/b.txt").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_leading_slash_is_store_relative() {
        let (_tmp, store) = make_store();
        store.put_text("/cfg.yaml", "x: 1").await.unwrap();
        assert_eq!(store.get_text("cfg.yaml").await.unwrap().as_deref(), Some("x: 1"));
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let (_tmp, store) = make_store();
        for key in ["../outside.txt", "a/../../b", ""] {
            let err = store.put_text(key, "nope").await.err().unwrap();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {key:?}");
        }
    }

    #[tokio::test]
    async fn test_put_and_get_file() {
        let (_tmp, store) = make_store();
        let scratch = TempDir::new().unwrap();

        let src = scratch.path().join("base.yaml");
        tokio::fs::write(&src, "chat:\n  model: qwen-plus\n")
            .await
            .unwrap();

        store.put_file("config/base.yaml", &src).await.unwrap();

        let dest = scratch.path().join("pulled/base.yaml");
        store.get_file("config/base.yaml", &dest).await.unwrap();
        let round_tripped = tokio::fs::read_to_string(&dest).await.unwrap();
        assert_eq!(round_tripped, "chat:\n  model: qwen-plus\n");
    }

    #[tokio::test]
    async fn test_get_file_missing_is_not_found() {
        let (_tmp, store) = make_store();
        let scratch = TempDir::new().unwrap();
        let dest = scratch.path().join("base.yaml");

        let err = store.get_file("config/base.yaml", &dest).await.err().unwrap();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
