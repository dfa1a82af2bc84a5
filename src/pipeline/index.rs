//! Corpus vector indices and the per-session index cache.
//!
//! A [`VectorIndex`] is immutable once built: items and embeddings are
//! parallel sequences, `items[i]` always corresponding to `embeddings[i]`.
//! Rebuilding swaps the whole `Arc` in the cache, so a reader never observes
//! a partially-updated pair.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::Mutex;

use super::types::{IndexItem, IntentRecord, ItemMeta, KbRecord};
use crate::embedding::SharedEmbedder;
use crate::error::Result;

/// Bump to invalidate previously-built cache entries across releases.
pub const INDEX_CACHE_VERSION: &str = "v1";

/// An embedded corpus. Empty corpora are a legal state — consumers must treat
/// a query against an empty index as an automatic non-match.
#[derive(Debug, Default)]
pub struct VectorIndex {
    items: Vec<IndexItem>,
    embeddings: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn items(&self) -> &[IndexItem] {
        &self.items
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Embed `items` into a new index. Items with blank text are discarded, so
/// the index length equals the count of non-empty extracted texts, not the
/// count of input records.
pub async fn build_index(embedder: &SharedEmbedder, items: Vec<IndexItem>) -> Result<VectorIndex> {
    let items: Vec<IndexItem> = items
        .into_iter()
        .filter(|item| !item.text.trim().is_empty())
        .collect();

    let texts: Vec<String> = items.iter().map(|item| item.text.clone()).collect();
    let embeddings = embedder.embed(&texts).await?;

    tracing::debug!(items = items.len(), "vector index built");
    Ok(VectorIndex { items, embeddings })
}

/// Flatten intents into index items: one per pattern.
pub fn intent_items(records: &[IntentRecord]) -> Vec<IndexItem> {
    records
        .iter()
        .flat_map(|record| {
            record.patterns.iter().map(|pattern| IndexItem {
                id: record.id.clone(),
                text: pattern.clone(),
                meta: ItemMeta::Intent,
            })
        })
        .collect()
}

/// Flatten KB rows into index items: one per question, carrying the answer.
pub fn kb_items(rows: &[KbRecord]) -> Vec<IndexItem> {
    rows.iter()
        .map(|row| IndexItem {
            id: row.id.clone(),
            text: row.question.clone(),
            meta: ItemMeta::Kb {
                answer: row.answer.clone(),
            },
        })
        .collect()
}

/// Fingerprint of a corpus identity, folded into cache keys so a changed
/// corpus rebuilds its index.
pub fn corpus_fingerprint<'a>(ids: impl Iterator<Item = &'a str>) -> u64 {
    let mut hasher = DefaultHasher::new();
    for id in ids {
        id.hash(&mut hasher);
    }
    hasher.finish()
}

/// Session-scoped cache of built indices, keyed by version + corpus identity.
#[derive(Default)]
pub struct IndexCache {
    entries: Mutex<HashMap<String, Arc<VectorIndex>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the index under `key`, building it on a miss. A cached *empty*
    /// index is treated as a miss and rebuilt — the corpus may simply not
    /// have been available yet.
    ///
    /// The cache lock is held across the build, which both serializes
    /// concurrent builds of the same key and guarantees the supplier behind
    /// `build` runs at most once per distinct key.
    pub async fn get_or_build<F, Fut>(&self, key: &str, build: F) -> Result<Arc<VectorIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VectorIndex>>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(index) = entries.get(key) {
            if !index.is_empty() {
                return Ok(index.clone());
            }
            tracing::debug!(key, "cached index is empty, rebuilding");
        }

        let index = Arc::new(build().await?);
        entries.insert(key.to_string(), index.clone());
        Ok(index)
    }
}
