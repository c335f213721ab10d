//! Service configuration

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};

/// Hard cap on `max_results`; requests asking for more are rejected.
pub const MAX_RESULTS_LIMIT: usize = 1_000;

/// Matcher service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Workers in the pool
    pub num_threads: u32,
    /// LRU capacity; 0 disables caching regardless of `enable_caching`
    pub cache_size: usize,
    pub enable_caching: bool,
    /// Similarity floor applied when a request passes 0
    pub default_min_similarity: f64,
    /// Result cap applied when a request passes 0
    pub default_max_results: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            num_threads: 8,
            cache_size: 10_000,
            enable_caching: true,
            default_min_similarity: 0.7,
            default_max_results: 10,
        }
    }
}

impl ServiceConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.num_threads == 0 {
            return Err(ServiceError::InvalidInput(
                "num_threads must be >= 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.default_min_similarity) {
            return Err(ServiceError::InvalidInput(
                "default_min_similarity must lie in [0, 1]".to_string(),
            ));
        }
        if self.default_max_results == 0 || self.default_max_results > MAX_RESULTS_LIMIT {
            return Err(ServiceError::InvalidInput(format!(
                "default_max_results must lie in [1, {}]",
                MAX_RESULTS_LIMIT
            )));
        }
        Ok(())
    }
}
