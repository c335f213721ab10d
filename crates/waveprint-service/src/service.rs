//! Matcher service façade
//!
//! Sync, async, and batch entry points over the match engine. Each request
//! flows through one pipeline: count it, validate it, consult the result
//! cache, run the engine, cache non-empty results, and record latency on
//! every exit path. No failure escapes a worker; every outcome becomes a
//! response with a `success` flag.

use crate::cache::{cache_key, ResultCache};
use crate::config::{ServiceConfig, MAX_RESULTS_LIMIT};
use crate::error::ServiceError;
use crate::metrics::{percentile, MetricsCollector, ScopedTimer};
use crate::pool::{JobHandle, WorkerPool};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use waveprint_core::Fingerprint;
use waveprint_store::{IndexStore, MatchEngine, MatchResult};

/// One match request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub request_id: String,
    pub fingerprint: Fingerprint,
    /// Similarity floor; 0 selects the configured default
    pub min_similarity: f64,
    /// Result cap; 0 selects the configured default
    pub max_results: usize,
}

/// One match response. `error_message` is empty exactly when `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub request_id: String,
    pub matches: Vec<MatchResult>,
    pub processing_time_us: u64,
    pub success: bool,
    pub error_message: String,
}

impl MatchResponse {
    fn empty(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            matches: Vec::new(),
            processing_time_us: 0,
            success: false,
            error_message: String::new(),
        }
    }

    fn failed(request_id: &str, error: &ServiceError) -> Self {
        let mut response = Self::empty(request_id);
        response.error_message = error.to_string();
        response
    }
}

/// Aggregated service statistics.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ServiceStats {
    pub total_requests: u64,
    pub successful_matches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub avg_latency_us: f64,
    pub p95_latency_us: f64,
    pub p99_latency_us: f64,
}

enum Served {
    Cache(Vec<MatchResult>),
    Engine(Vec<MatchResult>),
}

/// Concurrent fingerprint matching service.
///
/// Owns its worker pool and result cache; shares the index store and the
/// metrics collector with the rest of the process. Teardown drains the
/// pool before the cache and engine are released (field order matters).
pub struct MatcherService {
    pool: WorkerPool,
    core: Arc<ServiceCore>,
}

/// Request pipeline state shared between caller threads and pool workers.
struct ServiceCore {
    engine: MatchEngine,
    metrics: Arc<MetricsCollector>,
    cache: Option<ResultCache>,
    config: ServiceConfig,

    total_requests: AtomicU64,
    successful_matches: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    latencies: Mutex<Vec<u64>>,
}

impl MatcherService {
    pub fn new(
        store: Arc<dyn IndexStore>,
        metrics: Arc<MetricsCollector>,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError> {
        config.validate()?;

        let cache = if config.enable_caching {
            NonZeroUsize::new(config.cache_size).map(ResultCache::with_capacity)
        } else {
            None
        };

        if cache.is_none() {
            log::info!("result caching disabled");
        }

        let pool = WorkerPool::new(config.num_threads as usize);

        Ok(Self {
            pool,
            core: Arc::new(ServiceCore {
                engine: MatchEngine::new(store),
                metrics,
                cache,
                config,
                total_requests: AtomicU64::new(0),
                successful_matches: AtomicU64::new(0),
                cache_hits: AtomicU64::new(0),
                cache_misses: AtomicU64::new(0),
                latencies: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Process a request synchronously on the caller's thread.
    pub fn match_sync(&self, request: &MatchRequest) -> MatchResponse {
        self.core.process_match(request)
    }

    /// Submit a request to the worker pool.
    ///
    /// After shutdown the handle resolves immediately to a failed response.
    pub fn match_async(&self, request: MatchRequest) -> JobHandle<MatchResponse> {
        let core = Arc::clone(&self.core);
        let request_id = request.request_id.clone();

        match self.pool.submit(move || core.process_match(&request)) {
            Ok(handle) => handle,
            Err(stopped) => {
                log::warn!("request {} refused: pool stopped", request_id);
                JobHandle::ready(MatchResponse::failed(&request_id, &stopped.into()))
            }
        }
    }

    /// Submit every request to the pool, then await them in input order.
    pub fn match_batch(&self, requests: Vec<MatchRequest>) -> Vec<MatchResponse> {
        let handles: Vec<(String, JobHandle<MatchResponse>)> = requests
            .into_iter()
            .map(|request| (request.request_id.clone(), self.match_async(request)))
            .collect();

        handles
            .into_iter()
            .map(|(request_id, handle)| {
                handle.wait().unwrap_or_else(|| {
                    MatchResponse::failed(
                        &request_id,
                        &ServiceError::Internal("worker dropped the response".to_string()),
                    )
                })
            })
            .collect()
    }

    /// Snapshot service counters and latency percentiles.
    pub fn get_stats(&self) -> ServiceStats {
        self.core.get_stats()
    }

    /// Empty the result cache.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.core.cache {
            cache.clear();
        }
    }

    /// Drain in-flight work and stop the pool. Idempotent.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    pub fn queue_depth(&self) -> usize {
        self.pool.queue_depth()
    }
}

impl ServiceCore {
    fn process_match(&self, request: &MatchRequest) -> MatchResponse {
        let start = Instant::now();
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        let mut response = MatchResponse::empty(&request.request_id);
        let key = cache_key(&request.fingerprint);

        let outcome: Result<Served, ServiceError> = (|| {
            validate_request(request)?;

            if let Some(cache) = &self.cache {
                if let Some(results) = cache.lookup(&key) {
                    return Ok(Served::Cache(results));
                }
                self.cache_misses.fetch_add(1, Ordering::Relaxed);
            }

            let min_similarity = if request.min_similarity > 0.0 {
                request.min_similarity
            } else {
                self.config.default_min_similarity
            };
            let max_results = if request.max_results > 0 {
                request.max_results
            } else {
                self.config.default_max_results
            };

            let matches = {
                let _timer = ScopedTimer::new(&self.metrics, "match_db_query");
                self.engine
                    .find_matches(&request.fingerprint, min_similarity, max_results)?
            };

            if !matches.is_empty() {
                if let Some(cache) = &self.cache {
                    cache.insert(key.clone(), matches.clone());
                }
            }

            Ok(Served::Engine(matches))
        })();

        match outcome {
            Ok(Served::Cache(matches)) => {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                response.matches = matches;
                response.success = true;
                response.processing_time_us = elapsed_us(start);
                self.metrics
                    .record_latency("match_cached", response.processing_time_us);
                return response;
            }
            Ok(Served::Engine(matches)) => {
                response.matches = matches;
                response.success = true;
                self.successful_matches.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                log::warn!("request {} failed: {}", request.request_id, error);
                response.error_message = error.to_string();
                self.metrics.increment_counter("match_errors");
            }
        }

        response.processing_time_us = elapsed_us(start);
        self.latencies.lock().push(response.processing_time_us);
        self.metrics
            .record_latency("match_total", response.processing_time_us);

        response
    }

    fn get_stats(&self) -> ServiceStats {
        let mut sorted = self.latencies.lock().clone();
        sorted.sort_unstable();

        let (avg, p95, p99) = if sorted.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let sum: u64 = sorted.iter().sum();
            (
                sum as f64 / sorted.len() as f64,
                percentile(&sorted, 0.95),
                percentile(&sorted, 0.99),
            )
        };

        ServiceStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_matches: self.successful_matches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            avg_latency_us: avg,
            p95_latency_us: p95,
            p99_latency_us: p99,
        }
    }
}

fn validate_request(request: &MatchRequest) -> Result<(), ServiceError> {
    if request.request_id.is_empty() {
        return Err(ServiceError::InvalidInput(
            "request_id must not be empty".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&request.min_similarity) {
        return Err(ServiceError::InvalidInput(format!(
            "min_similarity {} outside [0, 1]",
            request.min_similarity
        )));
    }
    if request.max_results > MAX_RESULTS_LIMIT {
        return Err(ServiceError::InvalidInput(format!(
            "max_results {} exceeds limit {}",
            request.max_results, MAX_RESULTS_LIMIT
        )));
    }
    Ok(())
}

fn elapsed_us(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}
