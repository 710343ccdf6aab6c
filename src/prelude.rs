//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use movie_rating_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Collaborator traits and their outcomes
pub use crate::provider::{
    BackendError, CreateOutcome, ExecutionBackend, MovieStore, StatusWrite, UnitPhase, UnitSpec,
};

// Reconciler types
pub use crate::controller::reconciler::{
    extract, reconcile, reconcile_with_context, unit_name, ExtractionError, Rating,
    ReconcileContext, ReconcileOutcome, Reconciler, ReconcilerError, RetryReason, WaitOutcome,
};

// Config types
pub use crate::config::{ControllerConfig, ServerConfig};
