//! Metrics module for Prometheus
//!
//! Collects per-request metrics for calls made to the admin API:
//! - Request count by method, path, and status
//! - Request latency histogram

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Status label used when no HTTP response was received
pub const NO_RESPONSE: &str = "none";

/// Admin client metrics collector
#[derive(Clone)]
pub struct ClientMetrics {
    registry: Registry,
    request_counter: CounterVec,
    request_latency: HistogramVec,
    total_requests: Arc<AtomicU64>,
    total_errors: Arc<AtomicU64>,
}

impl ClientMetrics {
    /// Create a new metrics instance with its own registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let request_counter = CounterVec::new(
            Opts::new(
                "admin_client_requests_total",
                "Total number of admin API requests",
            ),
            &["method", "path", "status"],
        )?;

        let request_latency = HistogramVec::new(
            HistogramOpts::new(
                "admin_client_request_latency_seconds",
                "Admin API request latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )?;

        registry.register(Box::new(request_counter.clone()))?;
        registry.register(Box::new(request_latency.clone()))?;

        Ok(Self {
            registry,
            request_counter,
            request_latency,
            total_requests: Arc::new(AtomicU64::new(0)),
            total_errors: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Record a completed request. `status` is `None` when the request failed
    /// before a response arrived.
    pub fn record_request(&self, method: &str, path: &str, status: Option<u16>, latency: Duration) {
        let status_str = status
            .map(|s| s.to_string())
            .unwrap_or_else(|| NO_RESPONSE.to_string());
        let normalized_path = Self::normalize_path(path);

        self.request_counter
            .with_label_values(&[method, &normalized_path, &status_str])
            .inc();

        self.request_latency
            .with_label_values(&[method, &normalized_path])
            .observe(latency.as_secs_f64());

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if status.map(|s| s >= 400).unwrap_or(true) {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Prometheus text exposition of all collected metrics
    pub fn prometheus_output(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }

    /// Error rate in percent
    pub fn error_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            (self.total_errors() as f64 / total as f64) * 100.0
        }
    }

    /// Replace identifiers with a placeholder to keep label cardinality low.
    /// Admin paths alternate collection and identifier segments.
    fn normalize_path(path: &str) -> String {
        let path = path.split('?').next().unwrap_or_default();
        path.split('/')
            .enumerate()
            .map(|(i, part)| {
                // split yields "" first, so identifiers sit at 2, 4, ...
                if i >= 2 && i % 2 == 0 && !part.is_empty() {
                    ":id"
                } else {
                    part
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
