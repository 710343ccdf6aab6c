//! # Observability
//!
//! Observability modules for metrics, tracing and logging.
//!
//! - `metrics`: Prometheus metrics collection
//! - `otel`: OpenTelemetry tracing integration
//! - `logging`: tracing subscriber setup

pub mod logging;
pub mod metrics;
pub mod otel;
