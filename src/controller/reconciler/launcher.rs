//! # Execution Launcher
//!
//! Builds the unit specification for a movie and creates it with a single
//! request. An existing unit with the same deterministic name is progress, not
//! an error: it is usually our own earlier attempt.

use crate::config::ControllerConfig;
use crate::constants::{FIELD_MANAGER, LABEL_MANAGED_BY, LABEL_MOVIE, LABEL_MOVIE_NAMESPACE};
use crate::crd::ResourceKey;
use crate::observability;
use crate::provider::{BackendError, CreateOutcome, ExecutionBackend, UnitSpec};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Unit specification for `movie_name`, owned by `key`
#[must_use]
pub fn unit_spec(
    config: &ControllerConfig,
    key: &ResourceKey,
    unit_name: &str,
    movie_name: &str,
) -> UnitSpec {
    let labels = BTreeMap::from([
        (LABEL_MANAGED_BY.to_string(), FIELD_MANAGER.to_string()),
        (LABEL_MOVIE.to_string(), label_value(&key.name)),
        (LABEL_MOVIE_NAMESPACE.to_string(), label_value(&key.namespace)),
    ]);

    UnitSpec {
        name: unit_name.to_string(),
        namespace: config.execution_namespace.clone(),
        image: config.worker_image.clone(),
        container_name: config.worker_container_name.clone(),
        args: vec![movie_name.to_string()],
        labels,
    }
}

// Label values are limited to 63 characters and must end alphanumeric
fn label_value(value: &str) -> String {
    let truncated: String = value.chars().take(63).collect();
    truncated
        .trim_end_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string()
}

/// Create the unit described by `spec`
///
/// # Errors
///
/// Any backend error other than "already exists".
pub async fn launch(
    backend: &dyn ExecutionBackend,
    spec: &UnitSpec,
) -> Result<CreateOutcome, BackendError> {
    let outcome = backend.create_unit(spec).await?;
    match outcome {
        CreateOutcome::Created => {
            info!(
                unit.name = spec.name.as_str(),
                unit.namespace = spec.namespace.as_str(),
                image = spec.image.as_str(),
                "Created execution unit"
            );
            observability::metrics::increment_units_created();
        }
        CreateOutcome::AlreadyExists => {
            debug!(
                unit.name = spec.name.as_str(),
                unit.namespace = spec.namespace.as_str(),
                "Execution unit already exists, resuming"
            );
            observability::metrics::increment_units_already_existing();
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_spec_uses_configuration() {
        let config = ControllerConfig {
            execution_namespace: "workers".to_string(),
            ..ControllerConfig::default()
        };
        let key = ResourceKey::new("media", "inception");
        let spec = unit_spec(&config, &key, "job-inception-12345678", "Inception");

        assert_eq!(spec.namespace, "workers");
        assert_eq!(spec.image, "26tanishabanik/imdb:v1");
        assert_eq!(spec.container_name, "imdb-fetcher");
        assert_eq!(spec.args, vec!["Inception".to_string()]);
        assert_eq!(spec.labels.get(LABEL_MOVIE).map(String::as_str), Some("inception"));
        assert_eq!(
            spec.labels.get(LABEL_MOVIE_NAMESPACE).map(String::as_str),
            Some("media")
        );
        assert_eq!(
            spec.labels.get(LABEL_MANAGED_BY).map(String::as_str),
            Some("movie-rating-controller")
        );
    }

    #[test]
    fn test_movie_name_is_passed_verbatim() {
        let config = ControllerConfig::default();
        let key = ResourceKey::new("default", "odyssey");
        let spec = unit_spec(&config, &key, "job-odyssey-1", "2001: A Space Odyssey");
        assert_eq!(spec.args, vec!["2001: A Space Odyssey".to_string()]);
    }
}
