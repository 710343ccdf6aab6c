//! # Kubernetes Provider
//!
//! `MovieStore` and `ExecutionBackend` backed by the Kubernetes API server.
//! Execution units are bare pods; the store operates on the `Movies` CRD and
//! its status subresource.

mod movies;
mod pods;

pub use movies::KubeMovieStore;
pub use pods::{build_pod, PodExecutionBackend};

/// True when the API server answered with the given HTTP status code
pub(crate) fn is_api_status(error: &kube::Error, code: u16) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == code)
}
