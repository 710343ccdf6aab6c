//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::crd::ResourceKey;
use crate::provider::{ExecutionBackend, MovieStore};
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that end a reconcile invocation without an automatic retry
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Movies resource {0} not found")]
    NotFound(ResourceKey),
    #[error("Invalid spec for {key}: {reason}")]
    InvalidSpec { key: ResourceKey, reason: String },
}

impl ReconcilerError {
    /// Label used for metrics and logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::InvalidSpec { .. } => "invalid-spec",
        }
    }
}

/// Why an invocation asked to be run again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryReason {
    /// Store read, unit create or status write failed
    TransientInfra,
    /// Unit did not terminate before the deadline
    Timeout,
    /// Worker output did not contain a rating
    Extraction,
    /// Status write lost against a concurrent writer
    Conflict,
    /// Invocation was cancelled (shutdown)
    Cancelled,
}

impl RetryReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryReason::TransientInfra => "transient-infra",
            RetryReason::Timeout => "timeout",
            RetryReason::Extraction => "extraction",
            RetryReason::Conflict => "conflict",
            RetryReason::Cancelled => "cancelled",
        }
    }

    /// Reasons that wait out a backoff instead of retrying at once
    #[must_use]
    pub fn uses_backoff(&self) -> bool {
        matches!(
            self,
            RetryReason::TransientInfra | RetryReason::Timeout | RetryReason::Extraction
        )
    }
}

/// Result of one reconcile invocation
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// Rating is recorded; nothing left to do
    Done,
    /// Run again after `delay`
    RetryAfter { delay: Duration, reason: RetryReason },
    /// Stop until the resource changes
    Fatal(ReconcilerError),
}

impl ReconcileOutcome {
    /// Metric label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::RetryAfter { .. } => "retry",
            Self::Fatal(_) => "fatal",
        }
    }

    /// Convert to the controller runtime's contract. Fatal outcomes become the
    /// error routed to `error_policy`.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error for `Fatal`.
    pub fn into_action(self) -> Result<Action, ReconcilerError> {
        match self {
            Self::Done => Ok(Action::await_change()),
            Self::RetryAfter { delay, .. } => Ok(Action::requeue(delay)),
            Self::Fatal(error) => Err(error),
        }
    }
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Shared reconcile context
///
/// Holds the two collaborators behind traits, the configuration, per-resource
/// backoff, and the process shutdown token. No resource state is cached here.
pub struct Reconciler {
    pub store: Arc<dyn MovieStore>,
    pub backend: Arc<dyn ExecutionBackend>,
    pub config: Arc<ControllerConfig>,
    // Backoff state per resource, keyed by namespace/name
    pub backoff_states: Mutex<HashMap<ResourceKey, BackoffState>>,
    pub shutdown: CancellationToken,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("execution_namespace", &self.config.execution_namespace)
            .field("worker_image", &self.config.worker_image)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        store: Arc<dyn MovieStore>,
        backend: Arc<dyn ExecutionBackend>,
        config: Arc<ControllerConfig>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            backend,
            config,
            backoff_states: Mutex::new(HashMap::new()),
            shutdown,
        }
    }

    /// Advance the backoff of `key` and return the delay to wait
    pub fn next_backoff(&self, key: &ResourceKey) -> (Duration, u32) {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(key.clone()).or_insert_with(|| {
            BackoffState::new(self.config.backoff_min_secs, self.config.backoff_max_secs)
        });
        state.increment_error();
        (state.backoff.next_backoff(), state.error_count)
    }

    /// Forget the backoff of `key`
    pub fn reset_backoff(&self, key: &ResourceKey) {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Current consecutive failure count of `key`
    #[must_use]
    pub fn error_count(&self, key: &ResourceKey) -> u32 {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(0, |state| state.error_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_slow_failures_use_backoff() {
        assert!(RetryReason::TransientInfra.uses_backoff());
        assert!(RetryReason::Timeout.uses_backoff());
        assert!(RetryReason::Extraction.uses_backoff());
        assert!(!RetryReason::Conflict.uses_backoff());
        assert!(!RetryReason::Cancelled.uses_backoff());
    }

    #[test]
    fn test_outcome_into_action() {
        assert_eq!(
            ReconcileOutcome::Done.into_action().unwrap(),
            Action::await_change()
        );
        assert_eq!(
            ReconcileOutcome::RetryAfter {
                delay: Duration::from_secs(5),
                reason: RetryReason::Timeout,
            }
            .into_action()
            .unwrap(),
            Action::requeue(Duration::from_secs(5))
        );
        let fatal = ReconcileOutcome::Fatal(ReconcilerError::NotFound(ResourceKey::new(
            "default", "gone",
        )));
        assert!(matches!(
            fatal.into_action(),
            Err(ReconcilerError::NotFound(_))
        ));
    }

    #[test]
    fn test_backoff_state_reset() {
        let mut state = BackoffState::new(5, 300);
        state.increment_error();
        state.backoff.next_backoff_seconds();
        state.reset();
        assert_eq!(state.error_count, 0);
        assert_eq!(state.backoff.next_backoff_seconds(), 5);
    }
}
