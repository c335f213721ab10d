//! Stored-item and match-result models

use serde::{Deserialize, Serialize};

/// Metadata describing one stored content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetadata {
    /// Opaque unique key
    pub content_id: String,
    pub title: String,
    pub source: String,
    /// Derived from the stored fingerprint on ingest
    pub duration_ms: u64,
    /// Caller-supplied timestamp, not interpreted
    pub created_at: i64,
}

impl ContentMetadata {
    pub fn new(content_id: &str, title: &str, source: &str, created_at: i64) -> Self {
        Self {
            content_id: content_id.to_string(),
            title: title.to_string(),
            source: source.to_string(),
            duration_ms: 0,
            created_at,
        }
    }
}

/// One ranked candidate returned by the match engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub metadata: ContentMetadata,
    /// Similarity in [0, 1]
    pub similarity_score: f64,
    /// Stored frames sharing a hash with the query
    pub matched_segments: u32,
}

/// Outcome of an ingest. First write wins: a repeated `content_id` writes
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    AlreadyExists,
}

/// Aggregate store counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub item_count: u64,
    pub posting_count: u64,
    pub storage_bytes: u64,
}
