//! # Reconciliation Logic
//!
//! One invocation drives a single `Movies` resource one step closer to having
//! a rating:
//!
//! 1. Read the resource fresh. Gone means stop; a read error means retry.
//! 2. A non-empty `status.rating` means done. Nothing else is touched.
//! 3. Create the execution unit under its deterministic name. An existing unit
//!    is our own earlier attempt and is picked up where it left off.
//! 4. Wait for the unit to terminate, bounded and cancellable.
//! 5. Read its output and extract the rating. Failure leaves status untouched.
//! 6. Write the rating conditionally on the version read in step 1.
//!
//! Every step before 6 is side-effect free on the resource, so any crash or
//! retry simply re-enters from step 1.

use crate::controller::reconciler::context::ReconcileContext;
use crate::controller::reconciler::extract::extract;
use crate::controller::reconciler::launcher::{launch, unit_spec};
use crate::controller::reconciler::naming::unit_name;
use crate::controller::reconciler::status::{persist_rating, PersistOutcome};
use crate::controller::reconciler::types::{
    ReconcileOutcome, Reconciler, ReconcilerError, RetryReason,
};
use crate::controller::reconciler::waiter::{await_completion, WaitOutcome};
use crate::crd::ResourceKey;
use crate::observability;
use crate::provider::UnitPhase;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn, Instrument};

/// Reconcile the resource identified by `key`
///
/// Builds a fresh [`ReconcileContext`] bounded by the configured reconcile
/// timeout and tied to the reconciler's shutdown token.
pub async fn reconcile(key: &ResourceKey, reconciler: &Reconciler) -> ReconcileOutcome {
    let span = tracing::info_span!(
        "reconcile",
        resource.name = key.name.as_str(),
        resource.namespace = key.namespace.as_str(),
        resource.kind = "Movies",
        unit.name = tracing::field::Empty,
    );
    let ctx = ReconcileContext::new(
        reconciler.shutdown.child_token(),
        reconciler.config.reconcile_timeout(),
        span,
    );
    reconcile_with_context(key, reconciler, &ctx).await
}

/// Reconcile with a caller-supplied context
pub async fn reconcile_with_context(
    key: &ResourceKey,
    reconciler: &Reconciler,
    ctx: &ReconcileContext,
) -> ReconcileOutcome {
    let start = Instant::now();
    observability::metrics::increment_reconciliations();

    let outcome = match tokio::time::timeout_at(ctx.deadline, run(key, reconciler, ctx))
        .instrument(ctx.span.clone())
        .await
    {
        Ok(outcome) => outcome,
        Err(_elapsed) => {
            ctx.span.in_scope(|| warn!("Reconcile deadline exceeded"));
            Step::Retry(RetryReason::Timeout)
        }
    };

    let outcome = ctx.span.in_scope(|| finish(key, reconciler, outcome));

    observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    observability::metrics::increment_reconcile_outcome(outcome.label());
    outcome
}

/// Internal step result; delays are attached in `finish`
#[derive(Debug)]
enum Step {
    Done,
    Retry(RetryReason),
    Fatal(ReconcilerError),
}

fn finish(key: &ResourceKey, reconciler: &Reconciler, step: Step) -> ReconcileOutcome {
    match step {
        Step::Done => {
            reconciler.reset_backoff(key);
            ReconcileOutcome::Done
        }
        Step::Fatal(error) => {
            if matches!(error, ReconcilerError::NotFound(_)) {
                reconciler.reset_backoff(key);
            }
            ReconcileOutcome::Fatal(error)
        }
        Step::Retry(reason) => {
            let delay = if reason.uses_backoff() {
                let (delay, error_count) = reconciler.next_backoff(key);
                info!(
                    reason = reason.as_str(),
                    error_count,
                    "Retrying in {}s with Fibonacci backoff",
                    delay.as_secs()
                );
                delay
            } else {
                debug!(reason = reason.as_str(), "Retrying immediately");
                Duration::ZERO
            };
            observability::metrics::increment_requeues_total(reason.as_str());
            ReconcileOutcome::RetryAfter { delay, reason }
        }
    }
}

async fn run(key: &ResourceKey, reconciler: &Reconciler, ctx: &ReconcileContext) -> Step {
    if ctx.is_cancelled() {
        return Step::Retry(RetryReason::Cancelled);
    }

    let movie = match reconciler.store.get(key).await {
        Ok(Some(movie)) => movie,
        Ok(None) => {
            info!("Movies resource no longer exists");
            return Step::Fatal(ReconcilerError::NotFound(key.clone()));
        }
        Err(e) => {
            warn!(error = %e, "Failed to read Movies resource");
            return Step::Retry(RetryReason::TransientInfra);
        }
    };

    if let Some(rating) = movie.rating() {
        debug!(rating, "Rating already recorded, nothing to do");
        return Step::Done;
    }

    // Blank check only; the worker receives the name verbatim
    let movie_name = movie.spec.movie_name.as_str();
    if movie_name.trim().is_empty() {
        error!("spec.movieName is blank, refusing to launch a worker");
        return Step::Fatal(ReconcilerError::InvalidSpec {
            key: key.clone(),
            reason: "spec.movieName must not be empty".to_string(),
        });
    }

    let unit = unit_name(key);
    ctx.span.record("unit.name", unit.as_str());
    info!(movie = movie_name, unit.name = unit.as_str(), "Reconciling unrated movie");

    let spec = unit_spec(&reconciler.config, key, &unit, movie_name);
    if let Err(e) = launch(reconciler.backend.as_ref(), &spec).await {
        warn!(error = %e, "Failed to create execution unit");
        return Step::Retry(RetryReason::TransientInfra);
    }

    let waited = await_completion(
        reconciler.backend.as_ref(),
        &spec.namespace,
        &unit,
        reconciler.config.completion_timeout(),
        reconciler.config.completion_poll_interval(),
        ctx,
    )
    .await;
    match waited {
        Ok(WaitOutcome::Terminated(UnitPhase::Failed)) => {
            warn!("Execution unit failed, attempting extraction from its output anyway");
        }
        Ok(WaitOutcome::Terminated(phase)) => {
            debug!(phase = %phase, "Execution unit terminated");
        }
        Ok(WaitOutcome::TimedOut) => {
            warn!("Execution unit did not terminate in time, leaving it running");
            observability::metrics::increment_wait_timeouts();
            return Step::Retry(RetryReason::Timeout);
        }
        Ok(WaitOutcome::Cancelled) => {
            info!("Reconcile cancelled while waiting for execution unit");
            return Step::Retry(RetryReason::Cancelled);
        }
        Err(e) => {
            warn!(error = %e, "Execution unit could not be observed");
            return Step::Retry(RetryReason::TransientInfra);
        }
    }

    let output = match reconciler.backend.read_logs(&spec.namespace, &unit).await {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "Failed to read execution unit output");
            return Step::Retry(RetryReason::TransientInfra);
        }
    };

    let rating = match extract(&output) {
        Ok(rating) => rating,
        Err(e) => {
            warn!(reason = e.reason(), error = %e, "No rating in execution unit output");
            observability::metrics::increment_extraction_failures();
            return Step::Retry(RetryReason::Extraction);
        }
    };

    match persist_rating(reconciler.store.as_ref(), &movie, rating.as_str(), &unit).await {
        Ok(PersistOutcome::Persisted) => Step::Done,
        Ok(PersistOutcome::Conflict) => Step::Retry(RetryReason::Conflict),
        Err(e) => {
            warn!(error = %e, "Failed to write rating");
            Step::Retry(RetryReason::TransientInfra)
        }
    }
}
