//! Waveprint Matcher Service
//!
//! Fronts the match engine with a fixed worker pool, a bounded LRU result
//! cache keyed by fingerprint digest, and latency/throughput telemetry.
//! Designed for many concurrent requests sharing one indexed store.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod service;

pub use cache::{cache_key, ResultCache};
pub use config::{ServiceConfig, MAX_RESULTS_LIMIT};
pub use error::ServiceError;
pub use metrics::{LatencyStats, MetricsCollector, ScopedTimer};
pub use pool::{JobHandle, PoolStopped, WorkerPool};
pub use service::{MatchRequest, MatchResponse, MatcherService, ServiceStats};
