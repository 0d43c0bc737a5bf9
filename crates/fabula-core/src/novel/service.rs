//! Novel document service over the document store port.
//!
//! Layout in the store:
//! ```text
//! novels/index.json          [{id, title, created_at}, ...]
//! novels/{id}/.keep          placeholder written at creation
//! novels/{id}/story.json     background / mainline / darkline
//! novels/{id}/advanced.json  style / core_design / reversal / highlights
//! ```
//! Reads are lenient: a missing or unreadable document loads as defaults,
//! and a broken index is an empty library. Writes are pretty-printed JSON.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::warn;
use uuid::Uuid;

use fabula_types::error::StorageError;
use fabula_types::novel::{AdvancedDoc, NovelDetail, NovelSummary, StoryDoc};

use crate::storage::DocumentStore;

const INDEX_KEY: &str = "novels/index.json";

pub struct NovelService<D> {
    store: Arc<D>,
}

impl<D: DocumentStore> NovelService<D> {
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }

    fn story_key(novel_id: &str) -> String {
        format!("novels/{novel_id}/story.json")
    }

    fn advanced_key(novel_id: &str) -> String {
        format!("novels/{novel_id}/advanced.json")
    }

    fn placeholder_key(novel_id: &str) -> String {
        format!("novels/{novel_id}/.keep")
    }

    /// All novels, newest last. A missing or unreadable index is an empty
    /// library, not an error.
    pub async fn list_novels(&self) -> Result<Vec<NovelSummary>, StorageError> {
        let Some(raw) = self.store.get_text(INDEX_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(err) => {
                warn!(error = %err, "novel index unreadable, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Create a novel with a fresh id and register it in the index.
    pub async fn create_novel(&self, title: &str) -> Result<NovelSummary, StorageError> {
        let mut index = self.list_novels().await?;
        let item = NovelSummary {
            id: Uuid::new_v4().simple().to_string(),
            title: title.trim().to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };
        index.push(item.clone());
        self.save_index(&index).await?;
        self.store
            .put_text(&Self::placeholder_key(&item.id), "placeholder")
            .await?;
        Ok(item)
    }

    pub async fn find_novel(&self, novel_id: &str) -> Result<Option<NovelSummary>, StorageError> {
        Ok(self
            .list_novels()
            .await?
            .into_iter()
            .find(|item| item.id == novel_id))
    }

    /// Index entry plus both document bodies; `None` for an unknown id.
    pub async fn get_novel(&self, novel_id: &str) -> Result<Option<NovelDetail>, StorageError> {
        let Some(novel) = self.find_novel(novel_id).await? else {
            return Ok(None);
        };
        let story = self.load_doc::<StoryDoc>(&Self::story_key(novel_id)).await?;
        let advanced = self
            .load_doc::<AdvancedDoc>(&Self::advanced_key(novel_id))
            .await?;
        Ok(Some(NovelDetail {
            novel,
            story,
            advanced,
        }))
    }

    /// Save the story document. Returns `false` for an unknown id.
    pub async fn save_story(&self, novel_id: &str, story: &StoryDoc) -> Result<bool, StorageError> {
        if self.find_novel(novel_id).await?.is_none() {
            return Ok(false);
        }
        let payload = serde_json::to_string_pretty(story)?;
        self.store
            .put_text(&Self::story_key(novel_id), &payload)
            .await?;
        Ok(true)
    }

    /// Save the advanced design document. Returns `false` for an unknown id.
    pub async fn save_advanced(
        &self,
        novel_id: &str,
        advanced: &AdvancedDoc,
    ) -> Result<bool, StorageError> {
        if self.find_novel(novel_id).await?.is_none() {
            return Ok(false);
        }
        let payload = serde_json::to_string_pretty(advanced)?;
        self.store
            .put_text(&Self::advanced_key(novel_id), &payload)
            .await?;
        Ok(true)
    }

    async fn save_index(&self, items: &[NovelSummary]) -> Result<(), StorageError> {
        let payload = serde_json::to_string_pretty(items)?;
        self.store.put_text(INDEX_KEY, &payload).await
    }

    async fn load_doc<T>(&self, key: &str) -> Result<T, StorageError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let Some(raw) = self.store.get_text(key).await? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(doc) => Ok(doc),
            Err(err) => {
                warn!(key, error = %err, "document unreadable, using defaults");
                Ok(T::default())
            }
        }
    }
}
