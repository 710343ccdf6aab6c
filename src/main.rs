//! # Movie Rating Controller
//!
//! A Kubernetes controller that rates `Movies` resources.
//!
//! For every `Movies` resource without a rating it runs one worker pod with
//! the movie name as argument, waits for it to finish, extracts the rating
//! from its output and records it in `status.rating`. Rated resources are
//! never touched again.
//!
//! ## Endpoints
//!
//! - `/metrics` Prometheus metrics
//! - `/healthz` liveness
//! - `/readyz` readiness (ready while the watch loop runs)

use anyhow::Result;
use movie_rating_controller::observability;
use movie_rating_controller::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    let result = run_watch_loop(
        init.movies.clone(),
        init.reconciler.clone(),
        init.server_state.clone(),
        init.controller_config.clone(),
        init.shutdown.clone(),
    )
    .await;

    // Stop the HTTP server and any waiter still running
    init.shutdown.cancel();
    observability::otel::shutdown_otel(init.otel_tracer_provider);

    result
}
