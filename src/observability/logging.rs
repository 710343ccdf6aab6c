//! # Logging
//!
//! Installs the global `tracing` subscriber.
//!
//! The filter comes from `RUST_LOG` (default `movie_rating_controller=info`),
//! the output format from `LOG_FORMAT` (`json` or `text`).

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "movie_rating_controller=info";

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Anything other than `json` (case-insensitive) is text
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Install the subscriber
///
/// When an OpenTelemetry exporter already installed a subscriber, the second
/// install fails; that is logged and otherwise ignored.
pub fn init_tracing(format: LogFormat) {
    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_current_span(true)
            .with_env_filter(env_filter())
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .try_init(),
    };

    if let Err(e) = result {
        tracing::warn!(
            "Tracing subscriber init returned error (may already be initialized by Datadog): {}",
            e
        );
    }
}
