//! # Initialization
//!
//! Controller initialization logic including rustls setup, OpenTelemetry,
//! tracing, metrics, server startup, and Kubernetes client setup.

use crate::config::{ControllerConfig, ServerConfig};
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::{Movies, ResourceKey};
use crate::observability;
use crate::observability::logging::LogFormat;
use crate::provider::kubernetes::{KubeMovieStore, PodExecutionBackend};
use anyhow::{Context, Result};
use kube::{api::Api, api::ListParams, Client};
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// API for the Movies CRD across all namespaces
    pub movies: Api<Movies>,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    /// OpenTelemetry tracer provider (if initialized)
    pub otel_tracer_provider: Option<observability::otel::TracerProviderHandle>,
    /// Controller configuration
    pub controller_config: Arc<ControllerConfig>,
    /// Process-wide shutdown token
    pub shutdown: CancellationToken,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .field("controller_config", &self.controller_config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - OpenTelemetry initialization
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
/// - Reconciler setup
/// - Startup summary of existing resources
///
/// # Errors
///
/// Returns an error when metrics cannot be registered, the HTTP server does
/// not come up, or no Kubernetes client can be built.
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything touches rustls
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    let controller_config = Arc::new(ControllerConfig::from_env());
    let server_config = ServerConfig::from_env();

    let otel_tracer_provider =
        observability::otel::init_otel().context("Failed to initialize OpenTelemetry")?;
    observability::logging::init_tracing(LogFormat::parse(&controller_config.log_format));

    info!("Starting Movie Rating Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        worker_image = controller_config.worker_image.as_str(),
        execution_namespace = controller_config.execution_namespace.as_str(),
        completion_timeout_secs = controller_config.completion_timeout_secs,
        reconcile_timeout_secs = controller_config.reconcile_timeout_secs,
        max_concurrent_reconciliations = controller_config.max_concurrent_reconciliations,
        "Controller configuration loaded"
    );

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let server_state = Arc::new(ServerState::new());
    let shutdown = CancellationToken::new();

    let server_state_clone = server_state.clone();
    let server_shutdown = shutdown.clone();
    let server_port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone, server_shutdown).await {
            error!("HTTP server error: {}", e);
        }
    });

    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let movies: Api<Movies> = Api::all(client.clone());

    let reconciler = Arc::new(Reconciler::new(
        Arc::new(KubeMovieStore::new(client.clone())),
        Arc::new(PodExecutionBackend::new(client)),
        controller_config.clone(),
        shutdown.clone(),
    ));

    log_startup_summary(&movies).await;

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        movies,
        reconciler,
        server_state,
        otel_tracer_provider,
        controller_config,
        shutdown,
    })
}

/// Wait for the HTTP server to bind
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let poll_interval = server_config.poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_serving.load(Ordering::Relaxed) {
            info!("HTTP server is ready and accepting connections");
            break;
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}

/// Per-namespace counts of rated and pending resources
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NamespaceSummary {
    pub rated: usize,
    pub pending: usize,
}

/// Count rated and pending resources by namespace
#[must_use]
pub fn summarize(items: &[Movies]) -> BTreeMap<String, NamespaceSummary> {
    let mut summary: BTreeMap<String, NamespaceSummary> = BTreeMap::new();
    for item in items {
        let key = ResourceKey::from_resource(item);
        let entry = summary.entry(key.namespace).or_default();
        if item.is_rated() {
            entry.rated += 1;
        } else {
            entry.pending += 1;
        }
    }
    summary
}

/// Log what already exists before the watch starts
///
/// The watch's initial list reconciles every resource, so nothing is
/// reconciled here. A failing list only means the CRD is likely missing.
async fn log_startup_summary(movies: &Api<Movies>) {
    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.startup.summary",
        operation = "list_existing_resources"
    );
    let _guard = span.enter();

    match movies.list(&ListParams::default()).await {
        Ok(list) => {
            let summary = summarize(&list.items);
            let (rated, pending) = summary
                .values()
                .fold((0, 0), |(r, p), s| (r + s.rated, p + s.pending));
            info!(
                "CRD is queryable, found {} existing Movies resources ({} rated, {} pending) in {} namespaces",
                list.items.len(),
                rated,
                pending,
                summary.len()
            );
            for (namespace, counts) in &summary {
                info!(
                    "  Namespace {}: {} rated, {} pending",
                    namespace, counts.rated, counts.pending
                );
            }
        }
        Err(e) => {
            error!("CRD is not queryable; {:?}. Is the CRD installed?", e);
            error!("Installation: cargo run --bin crdgen | kubectl apply -f -");
            warn!("Continuing despite CRD queryability check failure - the watch will retry");
        }
    }
}
