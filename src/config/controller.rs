//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::{env_var_or_default, env_var_or_default_str};
use crate::constants::*;
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Worker image run by every execution unit
    pub worker_image: String,
    /// Name of the worker container inside the pod
    pub worker_container_name: String,
    /// Namespace execution units are created in.
    /// Independent of the Movies resource namespace.
    pub execution_namespace: String,
    /// How long the completion waiter waits for a unit to terminate (seconds)
    pub completion_timeout_secs: u64,
    /// Interval between unit phase polls (milliseconds)
    pub completion_poll_interval_ms: u64,
    /// Deadline for one reconcile invocation (seconds)
    pub reconcile_timeout_secs: u64,
    /// Fibonacci backoff minimum (seconds)
    pub backoff_min_secs: u64,
    /// Fibonacci backoff maximum (seconds)
    pub backoff_max_secs: u64,
    /// Maximum concurrent reconciliations
    /// Limits how many resources can be reconciled simultaneously
    pub max_concurrent_reconciliations: u16,
    /// Watch stream restart delay after unknown errors (seconds)
    pub watch_restart_delay_secs: u64,
    /// Watch stream restart delay after stream ends (seconds)
    pub watch_restart_delay_after_end_secs: u64,
    /// Watch backoff starting value after API throttling (milliseconds)
    pub watch_backoff_start_ms: u64,
    /// Watch backoff ceiling after API throttling (milliseconds)
    pub watch_backoff_max_ms: u64,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            worker_image: DEFAULT_WORKER_IMAGE.to_string(),
            worker_container_name: DEFAULT_WORKER_CONTAINER_NAME.to_string(),
            execution_namespace: DEFAULT_EXECUTION_NAMESPACE.to_string(),
            completion_timeout_secs: DEFAULT_COMPLETION_TIMEOUT_SECS,
            completion_poll_interval_ms: DEFAULT_COMPLETION_POLL_INTERVAL_MS,
            reconcile_timeout_secs: DEFAULT_RECONCILE_TIMEOUT_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            watch_restart_delay_after_end_secs: DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            watch_backoff_start_ms: DEFAULT_WATCH_BACKOFF_START_MS,
            watch_backoff_max_ms: DEFAULT_WATCH_BACKOFF_MAX_MS,
            log_format: "text".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            worker_image: env_var_or_default_str("WORKER_IMAGE", DEFAULT_WORKER_IMAGE),
            worker_container_name: env_var_or_default_str(
                "WORKER_CONTAINER_NAME",
                DEFAULT_WORKER_CONTAINER_NAME,
            ),
            execution_namespace: env_var_or_default_str(
                "EXECUTION_NAMESPACE",
                DEFAULT_EXECUTION_NAMESPACE,
            ),
            completion_timeout_secs: env_var_or_default(
                "COMPLETION_TIMEOUT_SECS",
                DEFAULT_COMPLETION_TIMEOUT_SECS,
            ),
            completion_poll_interval_ms: env_var_or_default(
                "COMPLETION_POLL_INTERVAL_MS",
                DEFAULT_COMPLETION_POLL_INTERVAL_MS,
            ),
            reconcile_timeout_secs: env_var_or_default(
                "RECONCILE_TIMEOUT_SECS",
                DEFAULT_RECONCILE_TIMEOUT_SECS,
            ),
            backoff_min_secs: env_var_or_default("BACKOFF_MIN_SECS", DEFAULT_BACKOFF_MIN_SECS),
            backoff_max_secs: env_var_or_default("BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS),
            max_concurrent_reconciliations: env_var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            watch_restart_delay_after_end_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_AFTER_END_SECS",
                DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            ),
            watch_backoff_start_ms: env_var_or_default(
                "WATCH_BACKOFF_START_MS",
                DEFAULT_WATCH_BACKOFF_START_MS,
            ),
            watch_backoff_max_ms: env_var_or_default(
                "WATCH_BACKOFF_MAX_MS",
                DEFAULT_WATCH_BACKOFF_MAX_MS,
            ),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
        }
    }

    /// Get completion wait timeout duration
    #[must_use]
    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    /// Get completion poll interval, never below 10ms
    #[must_use]
    pub fn completion_poll_interval(&self) -> Duration {
        Duration::from_millis(self.completion_poll_interval_ms.max(10))
    }

    /// Get reconcile invocation deadline duration
    #[must_use]
    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }

    /// Get watch restart delay duration
    #[must_use]
    pub fn watch_restart_delay(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    /// Get watch restart delay after end duration
    #[must_use]
    pub fn watch_restart_delay_after_end(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_after_end_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_worker_contract() {
        let config = ControllerConfig::default();
        assert_eq!(config.worker_image, "26tanishabanik/imdb:v1");
        assert_eq!(config.worker_container_name, "imdb-fetcher");
        assert_eq!(config.execution_namespace, "default");
        assert_eq!(config.completion_timeout(), Duration::from_secs(120));
        assert_eq!(config.completion_poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_poll_interval_has_floor() {
        let config = ControllerConfig {
            completion_poll_interval_ms: 0,
            ..ControllerConfig::default()
        };
        assert_eq!(config.completion_poll_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_env_var_or_default_parses_and_falls_back() {
        std::env::set_var("MOVIE_RATING_TEST_NUMERIC", " 42 ");
        std::env::set_var("MOVIE_RATING_TEST_GARBAGE", "forty-two");
        assert_eq!(env_var_or_default("MOVIE_RATING_TEST_NUMERIC", 7u64), 42);
        assert_eq!(env_var_or_default("MOVIE_RATING_TEST_GARBAGE", 7u64), 7);
        assert_eq!(env_var_or_default("MOVIE_RATING_TEST_UNSET", 7u64), 7);
    }

    #[test]
    fn test_blank_string_falls_back_to_default() {
        std::env::set_var("MOVIE_RATING_TEST_BLANK", "   ");
        assert_eq!(
            env_var_or_default_str("MOVIE_RATING_TEST_BLANK", "default"),
            "default"
        );
    }
}
