//! # Reconcile Tests
//!
//! Drive the full reconcile flow against the in-memory store and execution
//! backend.
//!
//! These tests verify:
//! - End-to-end rating of a fresh resource
//! - Idempotence once a rating is recorded
//! - Not-found and invalid-spec handling
//! - Resumption of an execution unit created by an earlier attempt
//! - Failed worker pods, extraction failures and transient backend errors
//! - Per-resource Fibonacci backoff and its reset

mod common;

use common::{movie, rated_movie, Harness};
use movie_rating_controller::controller::reconciler::launcher::unit_spec;
use movie_rating_controller::controller::reconciler::{
    reconcile, reconcile_with_context, unit_name, ReconcileContext, ReconcileOutcome,
    ReconcilerError, RetryReason,
};
use movie_rating_controller::crd::ResourceKey;
use movie_rating_controller::provider::memory::WorkerBehaviour;
use movie_rating_controller::provider::{ExecutionBackend, UnitPhase};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Span;

fn retry_reason(outcome: &ReconcileOutcome) -> Option<RetryReason> {
    match outcome {
        ReconcileOutcome::RetryAfter { reason, .. } => Some(*reason),
        _ => None,
    }
}

fn retry_delay(outcome: &ReconcileOutcome) -> Option<Duration> {
    match outcome {
        ReconcileOutcome::RetryAfter { delay, .. } => Some(*delay),
        _ => None,
    }
}

#[tokio::test]
async fn test_inception_end_to_end() {
    let h = Harness::new(WorkerBehaviour::succeeding("result-8.8-done"));
    let key = h.add(movie("default", "inception", "Inception"));

    let outcome = reconcile(&key, &h.reconciler).await;

    assert!(matches!(outcome, ReconcileOutcome::Done), "got {outcome:?}");
    assert_eq!(h.rating(&key).as_deref(), Some("8.8"));

    let stored = h.store.snapshot(&key).unwrap();
    let status = stored.status.unwrap();
    assert_eq!(status.execution_unit, Some(unit_name(&key)));
    assert!(status.rated_at.is_some());

    let unit = h
        .backend
        .unit("default", &unit_name(&key))
        .expect("unit exists");
    assert_eq!(unit.args, vec!["Inception".to_string()]);
    assert_eq!(unit.image, "26tanishabanik/imdb:v1");
}

#[tokio::test]
async fn test_rated_resource_is_left_alone() {
    let h = Harness::new(WorkerBehaviour::succeeding("result-1.0-done"));
    let key = h.add(rated_movie("default", "inception", "Inception", "8.8"));

    for _ in 0..2 {
        let outcome = reconcile(&key, &h.reconciler).await;
        assert!(matches!(outcome, ReconcileOutcome::Done));
    }

    assert_eq!(h.backend.create_calls(), 0);
    assert_eq!(h.store.status_writes(), 0);
    assert_eq!(h.rating(&key).as_deref(), Some("8.8"));
}

#[tokio::test]
async fn test_second_invocation_after_success_does_nothing() {
    let h = Harness::new(WorkerBehaviour::succeeding("result-8.8-done"));
    let key = h.add(movie("default", "inception", "Inception"));

    assert!(matches!(
        reconcile(&key, &h.reconciler).await,
        ReconcileOutcome::Done
    ));
    assert!(matches!(
        reconcile(&key, &h.reconciler).await,
        ReconcileOutcome::Done
    ));

    assert_eq!(h.backend.create_calls(), 1);
    assert_eq!(h.store.status_writes(), 1);
}

#[tokio::test]
async fn test_missing_resource_is_fatal_not_found() {
    let h = Harness::new(WorkerBehaviour::succeeding("result-8.8-done"));
    let key = ResourceKey::new("default", "deleted");

    let outcome = reconcile(&key, &h.reconciler).await;

    assert!(matches!(
        outcome,
        ReconcileOutcome::Fatal(ReconcilerError::NotFound(_))
    ));
    assert_eq!(h.backend.create_calls(), 0);
}

#[tokio::test]
async fn test_blank_movie_name_is_invalid_spec() {
    let h = Harness::new(WorkerBehaviour::succeeding("result-8.8-done"));
    let key = h.add(movie("default", "nameless", "   "));

    let outcome = reconcile(&key, &h.reconciler).await;

    assert!(matches!(
        outcome,
        ReconcileOutcome::Fatal(ReconcilerError::InvalidSpec { .. })
    ));
    assert_eq!(h.backend.create_calls(), 0);
    assert_eq!(h.store.status_writes(), 0);
}

#[tokio::test]
async fn test_existing_unit_is_resumed_not_duplicated() {
    let h = Harness::new(WorkerBehaviour::succeeding("result-8.8-done"));
    let key = h.add(movie("default", "inception", "Inception"));

    // Earlier attempt crashed after creating the unit
    let spec = unit_spec(
        &h.reconciler.config,
        &key,
        &unit_name(&key),
        "Inception",
    );
    h.backend.create_unit(&spec).await.unwrap();

    let outcome = reconcile(&key, &h.reconciler).await;

    assert!(matches!(outcome, ReconcileOutcome::Done));
    assert_eq!(h.backend.created(), 1);
    assert_eq!(h.backend.already_existing(), 1);
    assert_eq!(h.backend.unit_count(), 1);
    assert_eq!(h.rating(&key).as_deref(), Some("8.8"));
}

#[tokio::test]
async fn test_failed_unit_with_rating_in_output_is_recorded() {
    let h = Harness::new(WorkerBehaviour::failing("result-7.1-done"));
    let key = h.add(movie("default", "alien", "Alien"));

    let outcome = reconcile(&key, &h.reconciler).await;

    assert!(matches!(outcome, ReconcileOutcome::Done));
    assert_eq!(h.rating(&key).as_deref(), Some("7.1"));
}

#[tokio::test]
async fn test_failed_unit_without_rating_retries_and_keeps_unit() {
    let h = Harness::new(WorkerBehaviour::failing("Traceback: boom"));
    let key = h.add(movie("default", "alien", "Alien"));

    let outcome = reconcile(&key, &h.reconciler).await;

    assert_eq!(retry_reason(&outcome), Some(RetryReason::Extraction));
    assert_eq!(h.rating(&key), None);
    assert_eq!(h.store.status_writes(), 0);
    assert_eq!(h.backend.unit_count(), 1);

    // A second attempt reuses the same unit
    let outcome = reconcile(&key, &h.reconciler).await;
    assert_eq!(retry_reason(&outcome), Some(RetryReason::Extraction));
    assert_eq!(h.backend.created(), 1);
}

#[tokio::test]
async fn test_extraction_failure_leaves_status_empty_then_recovers() {
    let h = Harness::new(WorkerBehaviour::succeeding(""));
    let key = h.add(movie("default", "inception", "Inception"));

    let outcome = reconcile(&key, &h.reconciler).await;
    assert_eq!(retry_reason(&outcome), Some(RetryReason::Extraction));
    assert_eq!(h.rating(&key), None);

    // Log stream flushed later
    h.backend
        .set_logs("default", &unit_name(&key), "result-8.8-done\n");

    let outcome = reconcile(&key, &h.reconciler).await;
    assert!(matches!(outcome, ReconcileOutcome::Done));
    assert_eq!(h.rating(&key).as_deref(), Some("8.8"));
    assert_eq!(h.backend.created(), 1);
}

#[tokio::test]
async fn test_backoff_grows_and_resets_on_done() {
    let h = Harness::new(WorkerBehaviour::succeeding("garbage"));
    let key = h.add(movie("default", "inception", "Inception"));

    let mut delays = Vec::new();
    for _ in 0..4 {
        let outcome = reconcile(&key, &h.reconciler).await;
        delays.push(retry_delay(&outcome).unwrap().as_secs());
    }
    assert_eq!(delays, vec![5, 5, 10, 15]);
    assert_eq!(h.reconciler.error_count(&key), 4);

    h.backend
        .set_logs("default", &unit_name(&key), "result-8.8-done");
    assert!(matches!(
        reconcile(&key, &h.reconciler).await,
        ReconcileOutcome::Done
    ));
    assert_eq!(h.reconciler.error_count(&key), 0);
}

#[tokio::test]
async fn test_backoff_is_per_resource() {
    let h = Harness::new(WorkerBehaviour::succeeding("garbage"));
    let a = h.add(movie("default", "a", "A"));
    let b = h.add(movie("default", "b", "B"));

    reconcile(&a, &h.reconciler).await;
    reconcile(&a, &h.reconciler).await;
    reconcile(&a, &h.reconciler).await;

    let outcome = reconcile(&b, &h.reconciler).await;
    assert_eq!(retry_delay(&outcome), Some(Duration::from_secs(5)));
}

#[tokio::test]
async fn test_transient_read_error_retries() {
    let h = Harness::new(WorkerBehaviour::succeeding("result-8.8-done"));
    let key = h.add(movie("default", "inception", "Inception"));
    h.store.fail_next_gets(1);

    let outcome = reconcile(&key, &h.reconciler).await;
    assert_eq!(retry_reason(&outcome), Some(RetryReason::TransientInfra));
    assert_eq!(retry_delay(&outcome), Some(Duration::from_secs(5)));
    assert_eq!(h.backend.create_calls(), 0);

    assert!(matches!(
        reconcile(&key, &h.reconciler).await,
        ReconcileOutcome::Done
    ));
}

#[tokio::test]
async fn test_transient_create_error_retries() {
    let h = Harness::new(WorkerBehaviour::succeeding("result-8.8-done"));
    let key = h.add(movie("default", "inception", "Inception"));
    h.backend.fail_next_creates(1);

    let outcome = reconcile(&key, &h.reconciler).await;
    assert_eq!(retry_reason(&outcome), Some(RetryReason::TransientInfra));
    assert_eq!(h.backend.unit_count(), 0);
    assert_eq!(h.store.status_writes(), 0);

    assert!(matches!(
        reconcile(&key, &h.reconciler).await,
        ReconcileOutcome::Done
    ));
    assert_eq!(h.backend.created(), 1);
}

#[tokio::test]
async fn test_failed_status_write_retries_without_new_unit() {
    let h = Harness::new(WorkerBehaviour::succeeding("result-8.8-done"));
    let key = h.add(movie("default", "inception", "Inception"));
    h.store.fail_next_writes(1);

    let outcome = reconcile(&key, &h.reconciler).await;
    assert_eq!(retry_reason(&outcome), Some(RetryReason::TransientInfra));
    assert_eq!(h.rating(&key), None);

    assert!(matches!(
        reconcile(&key, &h.reconciler).await,
        ReconcileOutcome::Done
    ));
    assert_eq!(h.backend.created(), 1);
    assert_eq!(h.rating(&key).as_deref(), Some("8.8"));
}

#[tokio::test]
async fn test_wait_timeout_retries_with_backoff_and_keeps_unit() {
    let h = Harness::new(WorkerBehaviour::never_finishing());
    let key = h.add(movie("default", "inception", "Inception"));

    let ctx = ReconcileContext::new(
        CancellationToken::new(),
        Duration::from_millis(100),
        Span::none(),
    );
    let outcome = reconcile_with_context(&key, &h.reconciler, &ctx).await;

    assert_eq!(retry_reason(&outcome), Some(RetryReason::Timeout));
    assert_eq!(retry_delay(&outcome), Some(Duration::from_secs(5)));
    assert_eq!(h.backend.unit_count(), 1);
    assert_eq!(h.store.status_writes(), 0);
}

#[tokio::test]
async fn test_shutdown_cancels_with_immediate_retry() {
    let h = Harness::new(WorkerBehaviour::never_finishing());
    let key = h.add(movie("default", "inception", "Inception"));

    let shutdown = h.shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
    });

    let start = std::time::Instant::now();
    let outcome = reconcile(&key, &h.reconciler).await;

    assert_eq!(retry_reason(&outcome), Some(RetryReason::Cancelled));
    assert_eq!(retry_delay(&outcome), Some(Duration::ZERO));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(h.store.status_writes(), 0);
}

#[tokio::test]
async fn test_units_go_to_configured_execution_namespace() {
    let config = movie_rating_controller::config::ControllerConfig {
        execution_namespace: "rating-workers".to_string(),
        ..common::fast_config()
    };
    let h = Harness::with_config(WorkerBehaviour::succeeding("result-8.8-done"), config);
    let key = h.add(movie("media", "inception", "Inception"));

    assert!(matches!(
        reconcile(&key, &h.reconciler).await,
        ReconcileOutcome::Done
    ));
    assert!(h.backend.unit("rating-workers", &unit_name(&key)).is_some());
    assert!(h.backend.unit("media", &unit_name(&key)).is_none());
}

#[tokio::test]
async fn test_rating_taken_from_last_output_line() {
    let h = Harness::new(WorkerBehaviour::printing(|movie| {
        format!("searching {movie}\nfound 3 candidates\nresult-7.5-done\n\n")
    }));
    let key = h.add(movie("default", "heat", "Heat"));

    assert!(matches!(
        reconcile(&key, &h.reconciler).await,
        ReconcileOutcome::Done
    ));
    assert_eq!(h.rating(&key).as_deref(), Some("7.5"));
}

#[tokio::test]
async fn test_movie_name_is_passed_to_worker_verbatim() {
    let h = Harness::new(WorkerBehaviour::printing(|movie| {
        format!("result-{}-done", movie.len())
    }));
    let key = h.add(movie("default", "padded", "  The Godfather "));

    assert!(matches!(
        reconcile(&key, &h.reconciler).await,
        ReconcileOutcome::Done
    ));

    let unit = h.backend.unit("default", &unit_name(&key)).unwrap();
    assert_eq!(unit.args, vec!["  The Godfather ".to_string()]);
    assert_eq!(h.rating(&key).as_deref(), Some("16"));
}

#[tokio::test]
async fn test_stuck_unit_is_picked_up_once_it_finishes() {
    let h = Harness::new(WorkerBehaviour::never_finishing());
    let key = h.add(movie("default", "inception", "Inception"));

    let ctx = ReconcileContext::new(
        CancellationToken::new(),
        Duration::from_millis(100),
        Span::none(),
    );
    let outcome = reconcile_with_context(&key, &h.reconciler, &ctx).await;
    assert_eq!(retry_reason(&outcome), Some(RetryReason::Timeout));

    // The worker finishes between invocations
    let unit = unit_name(&key);
    h.backend.set_phase("default", &unit, UnitPhase::Succeeded);
    h.backend.set_logs("default", &unit, "result-8.8-done");

    assert!(matches!(
        reconcile(&key, &h.reconciler).await,
        ReconcileOutcome::Done
    ));
    assert_eq!(h.rating(&key).as_deref(), Some("8.8"));
    assert_eq!(h.backend.created(), 1);
    assert_eq!(h.reconciler.error_count(&key), 0);
}
