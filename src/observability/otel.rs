//! # OpenTelemetry Support
//!
//! Datadog trace export via `datadog-opentelemetry`.
//!
//! Export is enabled only when `DD_API_KEY` is present in the environment. The
//! remaining `DD_*` variables are filled with controller defaults when unset:
//!
//! - `DD_SERVICE` defaults to `movie-rating-controller`
//! - `DD_VERSION` defaults to `<crate version>-<git hash>`
//! - `DD_SITE` defaults to `datadoghq.com`
//! - `DD_TRACE_AGENT_URL` defaults to `http://localhost:8126`

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

/// Tracer provider handle for graceful shutdown
#[derive(Debug)]
pub enum TracerProviderHandle {
    /// Datadog tracer provider (wraps opentelemetry_sdk::trace::SdkTracerProvider)
    Datadog(opentelemetry_sdk::trace::SdkTracerProvider),
}

/// Datadog settings read from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatadogSettings {
    pub service_name: Option<String>,
    pub service_version: Option<String>,
    pub environment: Option<String>,
    pub site: Option<String>,
}

impl DatadogSettings {
    /// `None` unless `DD_API_KEY` is set
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("DD_API_KEY").ok()?;
        Some(Self {
            service_name: std::env::var("DD_SERVICE").ok(),
            service_version: std::env::var("DD_VERSION").ok(),
            environment: std::env::var("DD_ENV").ok(),
            site: std::env::var("DD_SITE").ok(),
        })
    }
}

/// Initialize OpenTelemetry tracing from the environment
///
/// Returns `Ok(None)` when no exporter is configured.
///
/// # Errors
///
/// Returns an error if initialization fails.
pub fn init_otel() -> Result<Option<TracerProviderHandle>> {
    match DatadogSettings::from_env() {
        Some(settings) => {
            info!("DD_API_KEY found in environment, initializing Datadog tracing...");
            init_datadog(&settings)
        }
        None => {
            if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
                warn!("OTEL_EXPORTER_OTLP_ENDPOINT is set but only Datadog export is supported");
            }
            info!("No OpenTelemetry configuration provided, skipping Otel initialization");
            Ok(None)
        }
    }
}

fn init_datadog(settings: &DatadogSettings) -> Result<Option<TracerProviderHandle>> {
    // datadog-opentelemetry reads its configuration from DD_* variables
    let service = settings
        .service_name
        .clone()
        .unwrap_or_else(|| "movie-rating-controller".to_string());
    let version = settings.service_version.clone().unwrap_or_else(|| {
        format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("BUILD_GIT_HASH"))
    });
    let site = settings
        .site
        .clone()
        .unwrap_or_else(|| "datadoghq.com".to_string());

    std::env::set_var("DD_SERVICE", &service);
    std::env::set_var("DD_VERSION", &version);
    std::env::set_var("DD_SITE", &site);
    if let Some(env) = &settings.environment {
        std::env::set_var("DD_ENV", env);
    }
    if std::env::var("DD_TRACE_AGENT_URL").is_err() {
        std::env::set_var("DD_TRACE_AGENT_URL", "http://localhost:8126");
    }

    info!(
        service = service.as_str(),
        version = version.as_str(),
        site = site.as_str(),
        env = ?settings.environment,
        "Initializing Datadog OpenTelemetry tracing"
    );

    let tracer_provider = datadog_opentelemetry::tracing().init();

    info!(
        "Datadog OpenTelemetry tracing initialized, traces go to {}",
        std::env::var("DD_TRACE_AGENT_URL").unwrap_or_default()
    );

    Ok(Some(TracerProviderHandle::Datadog(tracer_provider)))
}

/// Shutdown OpenTelemetry tracer provider gracefully
///
/// Flushes pending spans. Call before process exit.
pub fn shutdown_otel(tracer_provider: Option<TracerProviderHandle>) {
    match tracer_provider {
        Some(TracerProviderHandle::Datadog(provider)) => {
            info!("Shutting down Datadog tracer provider...");
            if let Err(e) = provider.shutdown_with_timeout(Duration::from_secs(5)) {
                warn!("Error shutting down Datadog tracer provider: {}", e);
            } else {
                info!("Datadog tracer provider shut down successfully");
            }
        }
        None => {}
    }
}
