//! Index store contract

use crate::error::StoreError;
use crate::models::{ContentMetadata, PutOutcome, StoreStats};
use waveprint_core::Fingerprint;

/// Abstract inverted-index store consumed by the match engine.
///
/// `put_item` is atomic: either every posting of a fingerprint becomes
/// visible to subsequent `postings_for` calls, or none do. Concurrent puts
/// to distinct `content_id`s are independent.
pub trait IndexStore: Send + Sync {
    /// Store a fingerprint and its metadata under `content_id`.
    ///
    /// First write wins: if the id already exists, nothing is written and
    /// `AlreadyExists` is returned. `metadata.duration_ms` is taken from the
    /// fingerprint, not the caller.
    fn put_item(
        &self,
        content_id: &str,
        fingerprint: &Fingerprint,
        metadata: &ContentMetadata,
    ) -> Result<PutOutcome, StoreError>;

    /// Items containing `hash`, as `(content_id, match_count)` pairs ordered
    /// by `match_count` descending. `limit` is advisory.
    fn postings_for(&self, hash: u32, limit: usize) -> Result<Vec<(String, u32)>, StoreError>;

    /// Metadata for one stored item, if present.
    fn get_item(&self, content_id: &str) -> Result<Option<ContentMetadata>, StoreError>;

    /// Number of frame hashes in the stored fingerprint, if present.
    fn fingerprint_len(&self, content_id: &str) -> Result<Option<usize>, StoreError>;

    /// Aggregate counters
    fn stats(&self) -> Result<StoreStats, StoreError>;
}
