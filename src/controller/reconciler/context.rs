//! Per-invocation context passed explicitly through every reconcile step.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Span;

/// Cancellation, deadline and log span of one reconcile invocation
#[derive(Debug, Clone)]
pub struct ReconcileContext {
    /// Fires on shutdown or when the caller abandons the invocation
    pub cancel: CancellationToken,
    /// No step may outlive this instant
    pub deadline: Instant,
    /// Span every step logs into
    pub span: Span,
}

impl ReconcileContext {
    #[must_use]
    pub fn new(cancel: CancellationToken, timeout: Duration, span: Span) -> Self {
        Self {
            cancel,
            deadline: Instant::now() + timeout,
            span,
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
