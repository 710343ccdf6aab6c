//! # Movies Store
//!
//! Reads `Movies` resources and writes their status with optimistic concurrency.

use super::is_api_status;
use crate::constants::FIELD_MANAGER;
use crate::crd::{Movies, MoviesStatus, ResourceKey};
use crate::provider::{BackendError, MovieStore, StatusWrite};
use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;

/// `MovieStore` backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeMovieStore {
    client: Client,
}

impl std::fmt::Debug for KubeMovieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeMovieStore").finish_non_exhaustive()
    }
}

impl KubeMovieStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Movies> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Merge patch for the status subresource that only applies at `resource_version`
pub(crate) fn conditional_status_patch(
    resource_version: &str,
    status: &MoviesStatus,
) -> serde_json::Value {
    serde_json::json!({
        "metadata": { "resourceVersion": resource_version },
        "status": status,
    })
}

#[async_trait]
impl MovieStore for KubeMovieStore {
    async fn get(&self, key: &ResourceKey) -> Result<Option<Movies>, BackendError> {
        Ok(self.api(&key.namespace).get_opt(&key.name).await?)
    }

    async fn update_status(
        &self,
        movie: &Movies,
        status: &MoviesStatus,
    ) -> Result<StatusWrite, BackendError> {
        let key = ResourceKey::from_resource(movie);
        // The API server rejects the patch with 409 when this version is stale
        let resource_version = movie
            .metadata
            .resource_version
            .as_deref()
            .ok_or_else(|| BackendError::MissingResourceVersion(key.clone()))?;

        let patch = conditional_status_patch(resource_version, status);
        match self
            .api(&key.namespace)
            .patch_status(&key.name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await
        {
            Ok(updated) => Ok(StatusWrite::Updated(Box::new(updated))),
            Err(e) if is_api_status(&e, 409) => Ok(StatusWrite::Conflict),
            Err(e) => Err(e.into()),
        }
    }
}
