//! In-memory index store
//!
//! A posting map plus a metadata map behind one lock. Satisfies the same
//! contract as the SQLite backend; useful as a fast backend for tests and
//! for deployments that rebuild the index on startup.

use crate::error::StoreError;
use crate::models::{ContentMetadata, PutOutcome, StoreStats};
use crate::store::IndexStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use waveprint_core::Fingerprint;

#[derive(Default)]
struct Inner {
    /// hash -> occurrences as (content_id, frame position)
    postings: HashMap<u32, Vec<(String, u32)>>,
    items: HashMap<String, ItemRecord>,
    posting_count: u64,
}

struct ItemRecord {
    metadata: ContentMetadata,
    num_hashes: usize,
}

/// Lock-guarded in-memory inverted index.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IndexStore for MemoryStore {
    fn put_item(
        &self,
        content_id: &str,
        fingerprint: &Fingerprint,
        metadata: &ContentMetadata,
    ) -> Result<PutOutcome, StoreError> {
        let mut inner = self.inner.write();

        if inner.items.contains_key(content_id) {
            log::debug!("put_item: {} already stored, skipping postings", content_id);
            return Ok(PutOutcome::AlreadyExists);
        }

        let mut metadata = metadata.clone();
        metadata.content_id = content_id.to_string();
        metadata.duration_ms = fingerprint.duration_ms;

        inner.items.insert(
            content_id.to_string(),
            ItemRecord {
                metadata,
                num_hashes: fingerprint.hashes.len(),
            },
        );

        for (position, &hash) in fingerprint.hashes.iter().enumerate() {
            inner
                .postings
                .entry(hash)
                .or_default()
                .push((content_id.to_string(), position as u32));
        }
        inner.posting_count += fingerprint.hashes.len() as u64;

        Ok(PutOutcome::Inserted)
    }

    fn postings_for(&self, hash: u32, limit: usize) -> Result<Vec<(String, u32)>, StoreError> {
        let inner = self.inner.read();

        let Some(occurrences) = inner.postings.get(&hash) else {
            return Ok(Vec::new());
        };

        let mut counts: HashMap<&str, u32> = HashMap::new();
        for (content_id, _position) in occurrences {
            *counts.entry(content_id.as_str()).or_insert(0) += 1;
        }

        let mut rows: Vec<(String, u32)> = counts
            .into_iter()
            .map(|(id, count)| (id.to_string(), count))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows.truncate(limit);

        Ok(rows)
    }

    fn get_item(&self, content_id: &str) -> Result<Option<ContentMetadata>, StoreError> {
        let inner = self.inner.read();
        Ok(inner.items.get(content_id).map(|rec| rec.metadata.clone()))
    }

    fn fingerprint_len(&self, content_id: &str) -> Result<Option<usize>, StoreError> {
        let inner = self.inner.read();
        Ok(inner.items.get(content_id).map(|rec| rec.num_hashes))
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let inner = self.inner.read();

        // Rough footprint: one posting row is an id reference plus a position
        let storage_bytes = inner.posting_count * 12
            + inner
                .items
                .values()
                .map(|rec| rec.metadata.content_id.len() as u64 + 64)
                .sum::<u64>();

        Ok(StoreStats {
            item_count: inner.items.len() as u64,
            posting_count: inner.posting_count,
            storage_bytes,
        })
    }
}
