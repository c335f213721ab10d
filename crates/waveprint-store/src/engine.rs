//! Match engine
//!
//! Gathers candidates from the posting lists of every query hash, scores
//! them against the longer of the two fingerprints, and returns the top
//! results above the similarity floor.

use crate::error::StoreError;
use crate::models::MatchResult;
use crate::store::IndexStore;
use std::collections::HashMap;
use std::sync::Arc;
use waveprint_core::Fingerprint;

/// Candidate gathering, scoring, ranking, and truncation over an index store.
pub struct MatchEngine {
    store: Arc<dyn IndexStore>,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self { store }
    }

    /// Top-`max_results` stored items scoring at least `min_similarity`
    /// against the query, best first.
    pub fn find_matches(
        &self,
        query: &Fingerprint,
        min_similarity: f64,
        max_results: usize,
    ) -> Result<Vec<MatchResult>, StoreError> {
        if query.is_empty() || max_results == 0 {
            return Ok(Vec::new());
        }

        // Aggregate per-candidate the stored frames sharing each query hash
        let mut candidates: HashMap<String, u32> = HashMap::new();
        let lookup_limit = max_results * 2;

        for &hash in &query.hashes {
            for (content_id, match_count) in self.store.postings_for(hash, lookup_limit)? {
                *candidates.entry(content_id).or_insert(0) += match_count;
            }
        }

        log::debug!(
            "query of {} hashes produced {} candidates",
            query.len(),
            candidates.len()
        );

        let mut results = Vec::new();
        for (content_id, matched_segments) in candidates {
            let Some(stored_len) = self.store.fingerprint_len(&content_id)? else {
                log::warn!("candidate {} has postings but no fingerprint row", content_id);
                continue;
            };

            let denominator = query.len().max(stored_len).max(1);
            let score = (matched_segments as f64 / denominator as f64).min(1.0);

            if score < min_similarity {
                continue;
            }

            let Some(metadata) = self.store.get_item(&content_id)? else {
                log::warn!("candidate {} has postings but no content row", content_id);
                continue;
            };

            results.push(MatchResult {
                metadata,
                similarity_score: score,
                matched_segments,
            });
        }

        // Rank: score desc, matched_segments desc, content_id asc
        results.sort_by(|a, b| {
            b.similarity_score
                .total_cmp(&a.similarity_score)
                .then_with(|| b.matched_segments.cmp(&a.matched_segments))
                .then_with(|| a.metadata.content_id.cmp(&b.metadata.content_id))
        });
        results.truncate(max_results);

        Ok(results)
    }
}
