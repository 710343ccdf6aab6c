//! # Watch Loop
//!
//! Controller watch loop that monitors `Movies` resources and triggers
//! reconciliation when changes are detected.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler, ReconcilerError};
use crate::controller::server::ServerState;
use crate::crd::{Movies, ResourceKey};
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{controller, controller::Action, watcher, Controller};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

/// Run the controller watch loop
///
/// Watches `Movies` in all namespaces and reconciles each change with at most
/// `max_concurrent_reconciliations` invocations in flight. The watch restarts
/// after stream errors until `shutdown` fires.
///
/// # Errors
///
/// Currently infallible; the signature leaves room for setup errors.
pub async fn run_watch_loop(
    movies: Api<Movies>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: Arc<ControllerConfig>,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    spawn_shutdown_handler(server_state.clone(), shutdown.clone());

    let backoff_duration_ms = Arc::new(AtomicU64::new(config.watch_backoff_start_ms));

    loop {
        if shutdown.is_cancelled() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );
        watch_span.in_scope(|| {
            info!(
                concurrency = config.max_concurrent_reconciliations,
                "Starting controller watch loop..."
            );
        });
        server_state.set_ready(true);

        let backoff_clone = backoff_duration_ms.clone();
        let filter_config = config.clone();
        let controller_future = Controller::new(
            movies.clone(),
            watcher::Config::default().any_semantic(),
        )
        .with_config(
            controller::Config::default().concurrency(config.max_concurrent_reconciliations),
        )
        .shutdown_on_signal()
        .run(
            reconcile_movie,
            handle_reconciliation_error,
            reconciler.clone(),
        )
        .filter_map(move |x| {
            let backoff = backoff_clone.clone();
            let config = filter_config.clone();
            async move {
                match &x {
                    Ok((object, action)) => {
                        backoff.store(config.watch_backoff_start_ms, Ordering::Relaxed);
                        debug!(object = %object, action = ?action, "watch.event.reconciled");
                        Some(x)
                    }
                    Err(e) => {
                        let error_string = format!("{e:?}");
                        handle_watch_stream_error(
                            &error_string,
                            &backoff,
                            config.watch_backoff_max_ms,
                            config.watch_restart_delay(),
                        )
                        .await
                        .map(|()| x)
                    }
                }
            }
        })
        .for_each(|_| futures::future::ready(()));

        controller_future.instrument(watch_span).await;

        if shutdown.is_cancelled() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let delay = config.watch_restart_delay_after_end();
        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::select! {
            () = shutdown.cancelled() => {}
            () = tokio::time::sleep(delay) => {}
        }
    }

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
    Ok(())
}

/// Adapter from the watched object to the reconcile core, which only takes
/// the identity and re-reads everything else
async fn reconcile_movie(
    obj: Arc<Movies>,
    reconciler: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let key = ResourceKey::from_resource(&obj);
    debug!(
        resource.name = key.name.as_str(),
        resource.namespace = key.namespace.as_str(),
        resource.version = obj.metadata.resource_version.as_deref().unwrap_or("unknown"),
        "watch.event.received"
    );

    let result = reconcile(&key, &reconciler).await.into_action();
    if let Err(e) = &result {
        error!(resource.name = key.name.as_str(), error = %e, "watch.event.reconciliation_failed");
    }
    result
}

/// Mark the server not ready and cancel in-flight waits on SIGINT/SIGTERM
fn spawn_shutdown_handler(server_state: Arc<ServerState>, shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        server_state.set_ready(false);
        shutdown.cancel();
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
