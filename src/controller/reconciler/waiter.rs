//! # Completion Waiter
//!
//! Polls the unit's phase at a fixed interval until it terminates. The wait is
//! bounded by the earlier of its own timeout and the invocation deadline, and
//! ends promptly when the invocation is cancelled.
//!
//! Everything runs inside the caller's task: returning drops the poll future,
//! so nothing keeps polling after the waiter has answered.

use crate::controller::reconciler::context::ReconcileContext;
use crate::provider::{BackendError, ExecutionBackend, UnitPhase};
use std::time::Duration;
use tokio::time::{timeout_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Lower bound for the poll interval; a zero interval would spin
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Unit reached `Succeeded` or `Failed`
    Terminated(UnitPhase),
    /// Deadline passed first
    TimedOut,
    /// The invocation was cancelled
    Cancelled,
}

/// Wait for the unit `namespace/name` to terminate
///
/// Transient errors while polling are logged and polled again. A missing unit
/// is returned at once: nothing will ever terminate it. `poll_interval` is
/// raised to [`MIN_POLL_INTERVAL`] when shorter.
///
/// # Errors
///
/// `BackendError::UnitNotFound` when the unit disappears.
pub async fn await_completion(
    backend: &dyn ExecutionBackend,
    namespace: &str,
    name: &str,
    timeout: Duration,
    poll_interval: Duration,
    ctx: &ReconcileContext,
) -> Result<WaitOutcome, BackendError> {
    let deadline = (Instant::now() + timeout).min(ctx.deadline);

    let poll = async {
        let mut ticker = tokio::time::interval(poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match backend.unit_phase(namespace, name).await {
                Ok(phase) if phase.is_terminal() => return Ok(phase),
                Ok(phase) => {
                    debug!(unit.name = name, phase = %phase, "Execution unit not finished");
                }
                Err(e @ BackendError::UnitNotFound { .. }) => return Err(e),
                Err(e) => {
                    warn!(unit.name = name, error = %e, "Failed to read unit phase, polling again");
                }
            }
        }
    };

    tokio::select! {
        biased;
        () = ctx.cancel.cancelled() => Ok(WaitOutcome::Cancelled),
        result = timeout_at(deadline, poll) => match result {
            Ok(Ok(phase)) => Ok(WaitOutcome::Terminated(phase)),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(WaitOutcome::TimedOut),
        },
    }
}
