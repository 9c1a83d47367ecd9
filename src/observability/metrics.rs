//! # Metrics
//!
//! Prometheus metrics for monitoring secret synchronization.
//!
//! ## Metrics Exposed
//!
//! - `remote_secret_sync_operations_total` - Successful secret writes, by operation (create/update)
//! - `remote_secret_sync_errors_total` - Failed syncs, by error reason
//! - `remote_secret_sync_duration_seconds` - Duration of sync operations
//! - `remote_secret_sync_fallbacks_total` - Race fallbacks taken, by the operation that lost the race
//! - `remote_secret_stale_secrets_total` - Stale secrets detected
//! - `remote_secret_list_total` - Successful listings of managed secrets

use anyhow::Result;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static SYNC_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "remote_secret_sync_operations_total",
            "Total number of target secrets written, by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create SYNC_OPERATIONS_TOTAL metric - this should never happen")
});

static SYNC_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "remote_secret_sync_errors_total",
            "Total number of failed secret syncs, by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create SYNC_ERRORS_TOTAL metric - this should never happen")
});

static SYNC_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "remote_secret_sync_duration_seconds",
            "Duration of secret sync operations in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
    )
    .expect("Failed to create SYNC_DURATION metric - this should never happen")
});

static SYNC_FALLBACKS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "remote_secret_sync_fallbacks_total",
            "Total number of create/update fallbacks taken after losing a race",
        ),
        &["from"],
    )
    .expect("Failed to create SYNC_FALLBACKS_TOTAL metric - this should never happen")
});

static STALE_SECRETS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "remote_secret_stale_secrets_total",
        "Total number of stale target secrets detected",
    )
    .expect("Failed to create STALE_SECRETS_TOTAL metric - this should never happen")
});

static LIST_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "remote_secret_list_total",
        "Total number of listings of managed target secrets",
    )
    .expect("Failed to create LIST_TOTAL metric - this should never happen")
});

/// Register all metrics with [`REGISTRY`]. Fails if called twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(SYNC_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SYNC_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SYNC_DURATION.clone()))?;
    REGISTRY.register(Box::new(SYNC_FALLBACKS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STALE_SECRETS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LIST_TOTAL.clone()))?;

    Ok(())
}

/// Render the registered metrics in the Prometheus text exposition format
pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_sync_operations(operation: &str) {
    SYNC_OPERATIONS_TOTAL.with_label_values(&[operation]).inc();
}

pub fn increment_sync_errors(reason: &str) {
    SYNC_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_sync_duration(duration: f64) {
    SYNC_DURATION.observe(duration);
}

pub fn increment_sync_fallbacks(from: &str) {
    SYNC_FALLBACKS_TOTAL.with_label_values(&[from]).inc();
}

pub fn increment_stale_secrets() {
    STALE_SECRETS_TOTAL.inc();
}

pub fn increment_list() {
    LIST_TOTAL.inc();
}
