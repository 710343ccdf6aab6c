//! # Pod Execution Backend
//!
//! Runs each execution unit as a single-container pod with `restartPolicy: Never`.

use super::is_api_status;
use crate::provider::{BackendError, CreateOutcome, ExecutionBackend, UnitPhase, UnitSpec};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, LogParams, PostParams};
use kube::Client;
use tracing::debug;

/// Execution backend that creates pods through the Kubernetes API
#[derive(Clone)]
pub struct PodExecutionBackend {
    client: Client,
}

impl std::fmt::Debug for PodExecutionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodExecutionBackend").finish_non_exhaustive()
    }
}

impl PodExecutionBackend {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Build the pod object for a unit spec
#[must_use]
pub fn build_pod(spec: &UnitSpec) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(spec.name.clone()),
            namespace: Some(spec.namespace.clone()),
            labels: Some(spec.labels.clone()),
            ..ObjectMeta::default()
        },
        spec: Some(PodSpec {
            restart_policy: Some("Never".to_string()),
            containers: vec![Container {
                name: spec.container_name.clone(),
                image: Some(spec.image.clone()),
                args: Some(spec.args.clone()),
                ..Container::default()
            }],
            ..PodSpec::default()
        }),
        ..Pod::default()
    }
}

#[async_trait]
impl ExecutionBackend for PodExecutionBackend {
    async fn create_unit(&self, spec: &UnitSpec) -> Result<CreateOutcome, BackendError> {
        let pod = build_pod(spec);
        match self
            .pods(&spec.namespace)
            .create(&PostParams::default(), &pod)
            .await
        {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) if is_api_status(&e, 409) => {
                debug!("Pod {}/{} already exists", spec.namespace, spec.name);
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn unit_phase(&self, namespace: &str, name: &str) -> Result<UnitPhase, BackendError> {
        let pod = self
            .pods(namespace)
            .get_opt(name)
            .await?
            .ok_or_else(|| BackendError::UnitNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        let phase = pod.status.as_ref().and_then(|s| s.phase.as_deref());
        Ok(UnitPhase::from_pod_phase(phase))
    }

    async fn read_logs(&self, namespace: &str, name: &str) -> Result<String, BackendError> {
        match self.pods(namespace).logs(name, &LogParams::default()).await {
            Ok(logs) => Ok(logs),
            Err(e) if is_api_status(&e, 404) => Err(BackendError::UnitNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
