//! # Runtime
//!
//! Process wiring around the reconcile core.
//!
//! - `initialization`: rustls, tracing, metrics, HTTP server, client and reconciler setup
//! - `watch_loop`: kube-runtime `Controller` driving reconciliations
//! - `error_policy`: reconcile error and watch stream error handling

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use initialization::{initialize, InitializationResult};
pub use watch_loop::run_watch_loop;
