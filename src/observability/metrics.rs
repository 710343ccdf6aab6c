//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `movie_rating_reconciliations_total` - Total number of reconciliations
//! - `movie_rating_reconciliation_errors_total` - Total number of reconciliation errors
//! - `movie_rating_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `movie_rating_reconcile_outcomes_total` - Reconcile outcomes by kind
//! - `movie_rating_units_created_total` - Execution units created
//! - `movie_rating_units_already_existing_total` - Create requests that found the unit already present
//! - `movie_rating_extraction_failures_total` - Worker outputs that did not yield a rating
//! - `movie_rating_status_conflicts_total` - Status writes rejected because of a stale version
//! - `movie_rating_wait_timeouts_total` - Completion waits that hit their deadline
//! - `movie_rating_requeues_total` - Requeues by reason

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "movie_rating_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "movie_rating_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "movie_rating_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static RECONCILE_OUTCOMES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "movie_rating_reconcile_outcomes_total",
            "Total number of reconcile outcomes by outcome (done, retry, fatal)",
        ),
        &["outcome"],
    )
    .expect("Failed to create RECONCILE_OUTCOMES_TOTAL metric - this should never happen")
});

static UNITS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "movie_rating_units_created_total",
        "Total number of execution units created",
    )
    .expect("Failed to create UNITS_CREATED_TOTAL metric - this should never happen")
});

static UNITS_ALREADY_EXISTING_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "movie_rating_units_already_existing_total",
        "Total number of create requests for a unit that already existed",
    )
    .expect("Failed to create UNITS_ALREADY_EXISTING_TOTAL metric - this should never happen")
});

static EXTRACTION_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "movie_rating_extraction_failures_total",
        "Total number of worker outputs that did not yield a rating",
    )
    .expect("Failed to create EXTRACTION_FAILURES_TOTAL metric - this should never happen")
});

static STATUS_CONFLICTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "movie_rating_status_conflicts_total",
        "Total number of status writes rejected due to a stale resourceVersion",
    )
    .expect("Failed to create STATUS_CONFLICTS_TOTAL metric - this should never happen")
});

static WAIT_TIMEOUTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "movie_rating_wait_timeouts_total",
        "Total number of completion waits that timed out",
    )
    .expect("Failed to create WAIT_TIMEOUTS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "movie_rating_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(RECONCILE_OUTCOMES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(UNITS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(UNITS_ALREADY_EXISTING_TOTAL.clone()))?;
    REGISTRY.register(Box::new(EXTRACTION_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_CONFLICTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(WAIT_TIMEOUTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

/// Encode every registered metric in the Prometheus text format
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn gather_text() -> Result<String> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_reconcile_outcome(outcome: &str) {
    RECONCILE_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_units_created() {
    UNITS_CREATED_TOTAL.inc();
}

pub fn increment_units_already_existing() {
    UNITS_ALREADY_EXISTING_TOTAL.inc();
}

pub fn increment_extraction_failures() {
    EXTRACTION_FAILURES_TOTAL.inc();
}

pub fn increment_status_conflicts() {
    STATUS_CONFLICTS_TOTAL.inc();
}

pub fn increment_wait_timeouts() {
    WAIT_TIMEOUTS_TOTAL.inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        // Registration happens exactly once per process
        assert!(register_metrics().is_ok());
        let text = gather_text().unwrap();
        assert!(text.contains("movie_rating_reconciliations_total"));
    }

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.get();
        increment_reconciliations();
        let after = RECONCILIATIONS_TOTAL.get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_reconciliation_errors() {
        let before = RECONCILIATION_ERRORS_TOTAL.get();
        increment_reconciliation_errors();
        let after = RECONCILIATION_ERRORS_TOTAL.get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        let before = RECONCILIATION_DURATION.get_sample_count();
        observe_reconciliation_duration(1.5);
        assert_eq!(RECONCILIATION_DURATION.get_sample_count(), before + 1);
    }

    #[test]
    fn test_outcomes_are_labelled() {
        let before = RECONCILE_OUTCOMES_TOTAL.with_label_values(&["done"]).get();
        increment_reconcile_outcome("done");
        let after = RECONCILE_OUTCOMES_TOTAL.with_label_values(&["done"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_requeues_are_labelled_by_reason() {
        let before = REQUEUES_TOTAL.with_label_values(&["conflict"]).get();
        increment_requeues_total("conflict");
        increment_requeues_total("timeout");
        let after = REQUEUES_TOTAL.with_label_values(&["conflict"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_unit_counters() {
        let created = UNITS_CREATED_TOTAL.get();
        let existing = UNITS_ALREADY_EXISTING_TOTAL.get();
        increment_units_created();
        increment_units_already_existing();
        assert_eq!(UNITS_CREATED_TOTAL.get(), created + 1);
        assert_eq!(UNITS_ALREADY_EXISTING_TOTAL.get(), existing + 1);
    }

    #[test]
    fn test_failure_counters() {
        let extraction = EXTRACTION_FAILURES_TOTAL.get();
        let conflicts = STATUS_CONFLICTS_TOTAL.get();
        let timeouts = WAIT_TIMEOUTS_TOTAL.get();
        increment_extraction_failures();
        increment_status_conflicts();
        increment_wait_timeouts();
        assert_eq!(EXTRACTION_FAILURES_TOTAL.get(), extraction + 1);
        assert_eq!(STATUS_CONFLICTS_TOTAL.get(), conflicts + 1);
        assert_eq!(WAIT_TIMEOUTS_TOTAL.get(), timeouts + 1);
    }
}
