//! Catalog sync metrics using OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::sync::Arc;
use std::time::Instant;

/// Metrics collector for checks, reloads, store errors and version bumps.
///
/// # Examples
///
/// ```rust,no_run
/// use catalog_sync::metrics::SyncMetrics;
/// use opentelemetry::global;
///
/// let metrics = SyncMetrics::new(global::meter("catalog-sync"));
///
/// let timer = metrics.start_reload();
/// // ... reload catalogs ...
/// metrics.record_reload_success(timer);
/// ```
#[derive(Clone)]
pub struct SyncMetrics {
    checks: Counter<u64>,
    store_errors: Counter<u64>,
    reload_attempts: Counter<u64>,
    reload_success: Counter<u64>,
    reload_failures: Counter<u64>,
    reload_duration: Histogram<f64>,
    version_bumps: Counter<u64>,
    version_bump_failures: Counter<u64>,
    catalog_age_seconds: Gauge<i64>,
    last_reload: Arc<parking_lot::Mutex<Instant>>,
}

impl SyncMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let checks = meter
            .u64_counter("catalog_sync.checks")
            .with_description("Version checks, labelled by outcome")
            .build();

        let store_errors = meter
            .u64_counter("catalog_sync.store.errors")
            .with_description("Version reads that failed because the store was unreachable")
            .build();

        let reload_attempts = meter
            .u64_counter("catalog_sync.reload.attempts")
            .with_description("Total number of catalog reload attempts")
            .build();

        let reload_success = meter
            .u64_counter("catalog_sync.reload.success")
            .with_description("Number of successful catalog reloads")
            .build();

        let reload_failures = meter
            .u64_counter("catalog_sync.reload.failures")
            .with_description("Number of failed catalog reloads")
            .build();

        let reload_duration = meter
            .f64_histogram("catalog_sync.reload.duration")
            .with_description("Duration of catalog reloads in seconds")
            .with_unit("s")
            .build();

        let version_bumps = meter
            .u64_counter("catalog_sync.version.bumps")
            .with_description("Number of version tokens written")
            .build();

        let version_bump_failures = meter
            .u64_counter("catalog_sync.version.bump_failures")
            .with_description("Number of version writes that failed")
            .build();

        let catalog_age_seconds = meter
            .i64_gauge("catalog_sync.catalog.age")
            .with_description("Time since the catalogs were last swapped in seconds")
            .with_unit("s")
            .build();

        Self {
            checks,
            store_errors,
            reload_attempts,
            reload_success,
            reload_failures,
            reload_duration,
            version_bumps,
            version_bump_failures,
            catalog_age_seconds,
            last_reload: Arc::new(parking_lot::Mutex::new(Instant::now())),
        }
    }

    /// Count one version check and refresh the catalog age gauge.
    pub fn record_check(&self, outcome: &'static str) {
        self.checks.add(1, &[KeyValue::new("outcome", outcome)]);
        self.update_catalog_age();
    }

    /// Count one failed version read.
    pub fn record_store_error(&self) {
        self.store_errors.add(1, &[]);
    }

    /// Start a reload timer. Pass the result to `record_reload_success` or
    /// `record_reload_failure`.
    pub fn start_reload(&self) -> Instant {
        self.reload_attempts.add(1, &[]);
        Instant::now()
    }

    /// Record a successful reload started at `start`.
    pub fn record_reload_success(&self, start: Instant) {
        self.reload_success.add(1, &[]);
        self.reload_duration.record(start.elapsed().as_secs_f64(), &[]);
        *self.last_reload.lock() = Instant::now();
    }

    /// Record a failed reload started at `start`.
    pub fn record_reload_failure(&self, start: Instant) {
        self.reload_failures.add(1, &[]);
        self.reload_duration.record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record a version write.
    pub fn record_version_bump(&self, success: bool) {
        if success {
            self.version_bumps.add(1, &[]);
        } else {
            self.version_bump_failures.add(1, &[]);
        }
    }

    /// Update the catalog age gauge. Every check does this.
    pub fn update_catalog_age(&self) {
        let age_secs = self.last_reload.lock().elapsed().as_secs() as i64;
        self.catalog_age_seconds.record(age_secs, &[]);
    }
}
