//! LRU result cache
//!
//! Bounded map from fingerprint digest prefix to ranked match results. One
//! mutex guards the map and its recency list together; no lock is held
//! while the engine or store runs.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use waveprint_core::Fingerprint;
use waveprint_store::MatchResult;

/// Digest prefix length used as the cache key. Distinct fingerprints
/// sharing this prefix alias to one entry.
pub const CACHE_KEY_LEN: usize = 64;

/// Cache key for a fingerprint: the first 64 hex characters of its digest,
/// or the full digest if shorter.
pub fn cache_key(fingerprint: &Fingerprint) -> String {
    if fingerprint.digest.len() <= CACHE_KEY_LEN {
        fingerprint.digest.clone()
    } else {
        fingerprint.digest[..CACHE_KEY_LEN].to_string()
    }
}

/// Bounded LRU cache of ranked result lists.
pub struct ResultCache {
    entries: Mutex<LruCache<String, Vec<MatchResult>>>,
}

impl ResultCache {
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Copy out the cached results for `key`, promoting it to most recent.
    pub fn lookup(&self, key: &str) -> Option<Vec<MatchResult>> {
        self.entries.lock().get(key).cloned()
    }

    /// Insert, evicting the least-recent entry at capacity. Reinserting an
    /// existing key replaces its value and promotes it.
    pub fn insert(&self, key: String, results: Vec<MatchResult>) {
        self.entries.lock().put(key, results);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
