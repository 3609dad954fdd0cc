//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (outcomes, wall-clock duration)
//! - Duration probing (fallbacks)
//! - Tool availability checks

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("leonardo_conversions_total", "Total conversion jobs"),
        &["result"], // "completed", "failed", "cancelled"
    )
    .unwrap()
});

/// Conversion wall-clock duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "leonardo_conversion_duration_seconds",
            "Wall-clock duration of conversion jobs",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Probe Metrics
// =============================================================================

/// Probes that fell back to the default duration.
pub static PROBE_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "leonardo_probe_fallbacks_total",
        "Duration probes that fell back to the default duration",
    )
    .unwrap()
});

// =============================================================================
// Availability Metrics
// =============================================================================

/// Availability checks by result.
pub static AVAILABILITY_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "leonardo_availability_checks_total",
            "Total transcoder availability checks",
        ),
        &["result"], // "available", "unavailable", "timeout"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        // Probing
        Box::new(PROBE_FALLBACKS.clone()),
        // Availability
        Box::new(AVAILABILITY_CHECKS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        CONVERSIONS_TOTAL.with_label_values(&["completed"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"leonardo_conversions_total".to_string()));
    }
}
