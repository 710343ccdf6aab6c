//! # Movies Spec
//!
//! Main CRD specification type.

use serde::{Deserialize, Serialize};

/// Movies Custom Resource Definition
///
/// Declares that a rating should be fetched for `movieName`. The controller
/// runs a worker pod for it once and records the result in `status.rating`.
///
/// # Example
///
/// ```yaml
/// apiVersion: rating.tanisha.banik/v1
/// kind: Movies
/// metadata:
///   name: inception
///   namespace: default
/// spec:
///   movieName: Inception
/// ```
#[derive(kube::CustomResource, Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Movies",
    group = "rating.tanisha.banik",
    version = "v1",
    plural = "movies",
    namespaced,
    status = "crate::crd::MoviesStatus",
    shortname = "mv",
    printcolumn = r#"{"name":"Movie", "type":"string", "jsonPath":".spec.movieName"}, {"name":"Rating", "type":"string", "jsonPath":".status.rating"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct MoviesSpec {
    /// Name of the movie to rate, passed verbatim as the worker's only argument
    pub movie_name: String,
}

impl Movies {
    /// Rating recorded on the status, if one has been computed.
    /// An empty string counts as not computed.
    #[must_use]
    pub fn rating(&self) -> Option<&str> {
        self.status
            .as_ref()
            .map(|s| s.rating.as_str())
            .filter(|r| !r.is_empty())
    }

    #[must_use]
    pub fn is_rated(&self) -> bool {
        self.rating().is_some()
    }
}
