//! Common test utilities for reconcile tests
//!
//! Builds reconcilers over the in-memory store and execution backend with
//! short timeouts so every scenario runs in milliseconds.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use movie_rating_controller::config::ControllerConfig;
use movie_rating_controller::controller::reconciler::Reconciler;
use movie_rating_controller::crd::{Movies, MoviesSpec, MoviesStatus, ResourceKey};
use movie_rating_controller::provider::memory::{
    InMemoryExecutionBackend, InMemoryMovieStore, WorkerBehaviour,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Configuration with short waits for tests
pub fn fast_config() -> ControllerConfig {
    ControllerConfig {
        completion_timeout_secs: 2,
        completion_poll_interval_ms: 10,
        reconcile_timeout_secs: 5,
        ..ControllerConfig::default()
    }
}

/// An unrated `Movies` resource
pub fn movie(namespace: &str, name: &str, movie_name: &str) -> Movies {
    let mut movie = Movies::new(
        name,
        MoviesSpec {
            movie_name: movie_name.to_string(),
        },
    );
    movie.metadata.namespace = Some(namespace.to_string());
    movie
}

/// A `Movies` resource that already carries a rating
pub fn rated_movie(namespace: &str, name: &str, movie_name: &str, rating: &str) -> Movies {
    let mut movie = movie(namespace, name, movie_name);
    movie.status = Some(MoviesStatus::rated(rating, "job-earlier"));
    movie
}

/// Reconciler plus handles on its in-memory collaborators
pub struct Harness {
    pub store: Arc<InMemoryMovieStore>,
    pub backend: Arc<InMemoryExecutionBackend>,
    pub reconciler: Arc<Reconciler>,
    pub shutdown: CancellationToken,
}

impl Harness {
    pub fn new(behaviour: WorkerBehaviour) -> Self {
        Self::with_config(behaviour, fast_config())
    }

    pub fn with_config(behaviour: WorkerBehaviour, config: ControllerConfig) -> Self {
        let store = Arc::new(InMemoryMovieStore::new());
        let backend = Arc::new(InMemoryExecutionBackend::new(behaviour));
        let shutdown = CancellationToken::new();
        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            backend.clone(),
            Arc::new(config),
            shutdown.clone(),
        ));
        Self {
            store,
            backend,
            reconciler,
            shutdown,
        }
    }

    /// Store `movie` and return its key
    pub fn add(&self, movie: Movies) -> ResourceKey {
        let stored = self.store.insert(movie);
        ResourceKey::from_resource(&stored)
    }

    /// Rating currently stored for `key`
    pub fn rating(&self, key: &ResourceKey) -> Option<String> {
        self.store
            .snapshot(key)
            .and_then(|m| m.rating().map(str::to_string))
    }
}
