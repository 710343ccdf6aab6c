//! # Status Command
//!
//! Command to show the state of one Movies resource and its execution unit.

use anyhow::{Context, Result};
use kube::{api::Api, Client};
use movie_rating_controller::config::ControllerConfig;
use movie_rating_controller::controller::reconciler::unit_name;
use movie_rating_controller::crd::{Movies, ResourceKey};
use movie_rating_controller::provider::kubernetes::PodExecutionBackend;
use movie_rating_controller::provider::{BackendError, ExecutionBackend};

/// Show spec, status and execution unit of a Movies resource
pub async fn status_command(
    client: Client,
    name: &str,
    namespace: &str,
    execution_namespace: Option<String>,
) -> Result<()> {
    let execution_namespace =
        execution_namespace.unwrap_or_else(|| ControllerConfig::from_env().execution_namespace);

    println!("Status for Movies '{namespace}/{name}'");
    println!();

    let api: Api<Movies> = Api::namespaced(client.clone(), namespace);
    let movie = api
        .get(name)
        .await
        .with_context(|| format!("Failed to get Movies '{namespace}/{name}'"))?;

    println!("Spec:");
    println!("  Movie Name: {}", movie.spec.movie_name);

    println!();
    println!("Status:");
    match movie.status.as_ref().filter(|_| movie.is_rated()) {
        Some(status) => {
            println!("  Rating: {}", status.rating);
            if let Some(unit) = &status.execution_unit {
                println!("  Rated By: {unit}");
            }
            if let Some(rated_at) = &status.rated_at {
                println!("  Rated At: {rated_at}");
            }
        }
        None => println!("  Rating: <pending>"),
    }

    let unit = unit_name(&ResourceKey::new(namespace, name));
    println!();
    println!("Execution Unit:");
    println!("  Name: {execution_namespace}/{unit}");

    let backend = PodExecutionBackend::new(client);
    match backend.unit_phase(&execution_namespace, &unit).await {
        Ok(phase) => println!("  Phase: {phase}"),
        Err(BackendError::UnitNotFound { .. }) => println!("  Phase: <not present>"),
        Err(e) => println!("  Phase: <unavailable: {e}>"),
    }

    Ok(())
}
