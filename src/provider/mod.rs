//! # Provider Modules
//!
//! The reconciler talks to two external collaborators through traits:
//!
//! - `MovieStore` reads `Movies` resources and writes their status
//! - `ExecutionBackend` creates execution units, reports their phase and
//!   returns their log output
//!
//! `kubernetes` implements both against the API server; `memory` implements
//! both in-process with the same semantics.

use crate::crd::{Movies, MoviesStatus, ResourceKey};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub mod kubernetes;
pub mod memory;

/// Errors reported by a store or execution backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("Execution unit {namespace}/{name} not found")]
    UnitNotFound { namespace: String, name: String },
    #[error("Resource {0} has no resourceVersion, refusing unconditional status write")]
    MissingResourceVersion(ResourceKey),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Observed lifecycle phase of an execution unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl UnitPhase {
    /// Map a pod `status.phase` string. Missing or unrecognised values are `Unknown`.
    #[must_use]
    pub fn from_pod_phase(phase: Option<&str>) -> Self {
        match phase {
            Some("Pending") => Self::Pending,
            Some("Running") => Self::Running,
            Some("Succeeded") => Self::Succeeded,
            Some("Failed") => Self::Failed,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for UnitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to create one execution unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub container_name: String,
    pub args: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

/// Result of a create request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// A unit with the same name already exists. Treated as progress.
    AlreadyExists,
}

/// Result of a conditional status write
#[derive(Debug, Clone)]
pub enum StatusWrite {
    /// Write accepted; carries the object as stored afterwards
    Updated(Box<Movies>),
    /// The resource changed since it was read
    Conflict,
}

/// Read and conditionally update `Movies` resources
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Fetch the current object, `None` if it does not exist
    async fn get(&self, key: &ResourceKey) -> Result<Option<Movies>, BackendError>;

    /// Replace the status of `movie`, guarded by `movie.metadata.resourceVersion`
    ///
    /// A stale version yields `StatusWrite::Conflict`, never an overwrite.
    async fn update_status(
        &self,
        movie: &Movies,
        status: &MoviesStatus,
    ) -> Result<StatusWrite, BackendError>;
}

/// Create and observe execution units
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Create the unit in a single request. An existing unit of the same name is
    /// reported as `CreateOutcome::AlreadyExists`.
    async fn create_unit(&self, spec: &UnitSpec) -> Result<CreateOutcome, BackendError>;

    /// Current phase of the unit. A missing unit is `BackendError::UnitNotFound`.
    async fn unit_phase(&self, namespace: &str, name: &str) -> Result<UnitPhase, BackendError>;

    /// Full log output of the unit so far
    async fn read_logs(&self, namespace: &str, name: &str) -> Result<String, BackendError>;
}
