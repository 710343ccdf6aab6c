//! # Reconciler
//!
//! Reconcile core for `Movies` resources.
//!
//! - `context`: per-invocation cancellation, deadline and span
//! - `extract`: worker output contract
//! - `launcher`: execution unit specification and creation
//! - `naming`: deterministic unit names
//! - `reconcile`: the reconcile flow
//! - `status`: conditional status writes
//! - `types`: outcomes, errors and shared reconciler state
//! - `waiter`: bounded, cancellable completion wait

pub mod context;
pub mod extract;
pub mod launcher;
pub mod naming;
pub mod reconcile;
pub mod status;
pub mod types;
pub mod waiter;

pub use context::ReconcileContext;
pub use extract::{extract, ExtractionError, Rating};
pub use naming::unit_name;
pub use reconcile::{reconcile, reconcile_with_context};
pub use types::{BackoffState, ReconcileOutcome, Reconciler, ReconcilerError, RetryReason};
pub use waiter::{await_completion, WaitOutcome};
