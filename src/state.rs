//! # Application State Management
//!
//! This module holds everything the HTTP handlers share: the loaded
//! configuration, the translation pipeline, the encrypted artifact store and
//! the request metrics.
//!
//! ## Key Rust Concepts:
//!
//! ### Arc (Atomically Reference Counted)
//! - **Purpose**: Lets every worker thread hold the same pipeline and store
//! - **Memory safety**: The shared value is dropped with the last reference
//!
//! ### RwLock (Reader-Writer Lock)
//! - **Purpose**: Many readers OR one writer at a time
//! - **Used for**: Metrics only. The pipeline and store are immutable after
//!   startup and synchronise internally (the store relies on the filesystem)
//!
//! ### Lock poisoning
//! - A panic while holding a lock "poisons" it
//! - Metrics are plain counters, so a poisoned lock is still usable; we take
//!   the inner guard with `into_inner()` instead of panicking a second time

use crate::config::AppConfig;
use crate::pipeline::TranslationPipeline;
use crate::storage::ArtifactStore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

/// Shared state handed to every request through `web::Data`.
///
/// ## Thread Safety Pattern:
/// - `config`, `pipeline` and `store` are read-only after startup
/// - `metrics` is the only mutable part and sits behind `Arc<RwLock<_>>`
///
/// Cloning an `AppState` clones the `Arc`s, not the data behind them.
#[derive(Clone)]
pub struct AppState {
    /// Configuration as loaded and validated at startup
    pub config: Arc<AppConfig>,

    /// Enhance, translate, synthesize, encrypt
    pub pipeline: Arc<TranslationPipeline>,

    /// Same store the pipeline writes to; the audio endpoint reads from it
    pub store: Arc<ArtifactStore>,

    /// Request and artifact counters (updated by middleware and handlers)
    pub metrics: Arc<RwLock<AppMetrics>>,

    /// When the server started (never changes, so no lock needed)
    pub start_time: Instant,
}

/// Counters collected across all HTTP requests.
///
/// ## Why these metrics matter:
/// - **request_count / error_count**: Load and reliability
/// - **artifacts_stored / artifacts_served**: A large gap means clients are
///   not collecting their audio and the sweeper is doing the work
/// - **enhancement_failures**: The enhancement provider is degraded while
///   translation keeps working
/// - **endpoint_metrics**: Per-endpoint latency and error rates
#[derive(Debug, Default, Clone)]
pub struct AppMetrics {
    pub request_count: u64,
    pub error_count: u64,
    pub artifacts_stored: u64,
    pub artifacts_served: u64,
    pub enhancement_failures: u64,

    /// Key: `"METHOD /path"` (e.g. `"POST /translate/"`)
    pub endpoint_metrics: HashMap<String, EndpointMetric>,
}

/// Detailed performance metrics for a specific API endpoint.
#[derive(Debug, Default, Clone)]
pub struct EndpointMetric {
    pub request_count: u64,

    /// Total time spent processing all requests to this endpoint (milliseconds)
    pub total_duration_ms: u64,

    pub error_count: u64,
}

impl AppState {
    /// Bundle the startup components into the shared state.
    ///
    /// ## Rust Concepts:
    /// - **Arc::new()**: The config is moved into a reference-counted pointer
    /// - **Instant::now()**: Captures the moment the state was built, used for uptime
    pub fn new(
        config: AppConfig,
        pipeline: Arc<TranslationPipeline>,
        store: Arc<ArtifactStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
            store,
            metrics: Arc::new(RwLock::new(AppMetrics::default())),
            start_time: Instant::now(),
        }
    }

    fn metrics_mut(&self) -> RwLockWriteGuard<'_, AppMetrics> {
        self.metrics.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn metrics_ref(&self) -> RwLockReadGuard<'_, AppMetrics> {
        self.metrics.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Increment the total request counter (called by middleware for every request).
    pub fn increment_request_count(&self) {
        self.metrics_mut().request_count += 1;
    }

    /// Increment the total error counter (4xx and 5xx responses).
    pub fn increment_error_count(&self) {
        self.metrics_mut().error_count += 1;
    }

    pub fn record_artifact_stored(&self) {
        self.metrics_mut().artifacts_stored += 1;
    }

    pub fn record_artifact_served(&self) {
        self.metrics_mut().artifacts_served += 1;
    }

    pub fn record_enhancement_failure(&self) {
        self.metrics_mut().enhancement_failures += 1;
    }

    /// Record detailed metrics for a specific endpoint.
    ///
    /// ## HashMap operations:
    /// - **.entry()**: Gets or creates the entry for this endpoint
    /// - **.or_default()**: A fresh `EndpointMetric` with zeroed counters
    pub fn record_endpoint_request(&self, endpoint: &str, duration_ms: u64, is_error: bool) {
        let mut metrics = self.metrics_mut();
        let endpoint_metric = metrics.endpoint_metrics.entry(endpoint.to_string()).or_default();

        endpoint_metric.request_count += 1;
        endpoint_metric.total_duration_ms += duration_ms;
        if is_error {
            endpoint_metric.error_count += 1;
        }
    }

    /// A copy of the counters, so the lock is not held while serializing.
    pub fn get_metrics_snapshot(&self) -> AppMetrics {
        self.metrics_ref().clone()
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl EndpointMetric {
    /// Average = Total Duration ÷ Number of Requests (0.0 before the first request).
    pub fn average_duration_ms(&self) -> f64 {
        if self.request_count > 0 {
            self.total_duration_ms as f64 / self.request_count as f64
        } else {
            0.0
        }
    }

    /// Fraction of failed requests, between 0.0 and 1.0.
    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            self.error_count as f64 / self.request_count as f64
        } else {
            0.0
        }
    }
}
