//! Resolution metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for resolution operations.
///
/// # Examples
///
/// ```rust,no_run
/// use paramstore_config::metrics::ResolverMetrics;
/// use opentelemetry::global;
///
/// let metrics = ResolverMetrics::new(global::meter("paramstore-config"));
///
/// let timer = metrics.start_resolve();
/// // ... resolve ...
/// metrics.record_resolve_success(timer);
/// ```
#[derive(Clone)]
pub struct ResolverMetrics {
    cache_hits: Counter<u64>,
    cache_misses: Counter<u64>,
    remote_calls: Counter<u64>,
    resolve_failures: Counter<u64>,
    resolve_duration: Histogram<f64>,
}

impl ResolverMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let cache_hits = meter
            .u64_counter("paramstore_config.cache.hits")
            .with_description("Resolutions served entirely from the cache")
            .build();

        let cache_misses = meter
            .u64_counter("paramstore_config.cache.misses")
            .with_description("Resolutions that needed a remote fetch")
            .build();

        let remote_calls = meter
            .u64_counter("paramstore_config.remote.calls")
            .with_description("Batch calls issued to the parameter store")
            .build();

        let resolve_failures = meter
            .u64_counter("paramstore_config.resolve.failures")
            .with_description("Number of failed resolutions")
            .build();

        let resolve_duration = meter
            .f64_histogram("paramstore_config.resolve.duration")
            .with_description("Duration of resolutions in seconds")
            .with_unit("s")
            .build();

        Self {
            cache_hits,
            cache_misses,
            remote_calls,
            resolve_failures,
            resolve_duration,
        }
    }

    /// Start a resolution timer.
    pub fn start_resolve(&self) -> Instant {
        Instant::now()
    }

    /// Record a resolution answered from the cache.
    pub fn record_cache_hit(&self) {
        self.cache_hits.add(1, &[]);
    }

    /// Record a resolution that went to the parameter store.
    pub fn record_cache_miss(&self) {
        self.cache_misses.add(1, &[]);
    }

    /// Record `calls` batch calls issued to the parameter store.
    pub fn record_remote_calls(&self, calls: u64) {
        self.remote_calls.add(calls, &[]);
    }

    /// Record a successful resolution started at `start`.
    pub fn record_resolve_success(&self, start: Instant) {
        self.resolve_duration
            .record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record a failed resolution started at `start`.
    pub fn record_resolve_failure(&self, start: Instant) {
        self.resolve_failures.add(1, &[]);
        self.resolve_duration
            .record(start.elapsed().as_secs_f64(), &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::global;

    #[test]
    fn test_metrics_creation() {
        let metrics = ResolverMetrics::new(global::meter("test"));

        // Basic operations must not panic without an installed provider
        let timer = metrics.start_resolve();
        metrics.record_cache_miss();
        metrics.record_remote_calls(3);
        metrics.record_resolve_success(timer);

        let timer = metrics.start_resolve();
        metrics.record_cache_hit();
        metrics.record_resolve_failure(timer);
    }

    #[test]
    fn test_metrics_clone() {
        let metrics = ResolverMetrics::new(global::meter("test"));
        let metrics2 = metrics.clone();

        let timer1 = metrics.start_resolve();
        let timer2 = metrics2.start_resolve();

        metrics.record_resolve_success(timer1);
        metrics2.record_resolve_success(timer2);
    }
}
