//! Novel document types persisted by the document store.
//!
//! The on-disk shapes are lenient on read: missing fields default to empty
//! strings so hand-edited or older documents still load.

use serde::{Deserialize, Serialize};

/// Index entry for one novel.
///
/// `created_at` is an RFC 3339 UTC timestamp kept as the stored string; the
/// index is treated as a wire format and round-trips untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovelSummary {
    pub id: String,
    pub title: String,
    pub created_at: String,
}

/// Story skeleton for a novel: setting, main plotline, hidden plotline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryDoc {
    pub background: String,
    pub mainline: String,
    pub darkline: String,
}

/// Advanced design notes for a novel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedDoc {
    pub style: String,
    pub core_design: String,
    pub reversal: String,
    pub highlights: String,
}

/// Full view of one novel: index entry plus both document bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovelDetail {
    pub novel: NovelSummary,
    pub story: StoryDoc,
    pub advanced: AdvancedDoc,
}
