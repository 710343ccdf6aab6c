//! # In-Memory Provider
//!
//! Process-local `MovieStore` and `ExecutionBackend` with the same observable
//! semantics as the Kubernetes implementations:
//!
//! - every stored object carries a `resourceVersion` that changes on each write
//! - status writes with a stale version are rejected as conflicts
//! - creating a unit whose name is taken reports `AlreadyExists`
//! - units move through a scripted list of phases, one step per phase query,
//!   and expose scripted log output
//!
//! Used by the test-suite and for running the reconcile core without a cluster.

use crate::crd::{Movies, MoviesStatus, ResourceKey};
use crate::provider::{
    BackendError, CreateOutcome, ExecutionBackend, MovieStore, StatusWrite, UnitPhase, UnitSpec,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory `Movies` store with optimistic concurrency
#[derive(Debug, Default)]
pub struct InMemoryMovieStore {
    objects: Mutex<HashMap<ResourceKey, Movies>>,
    next_version: AtomicU64,
    get_calls: AtomicUsize,
    status_writes: AtomicUsize,
    conflicts: AtomicUsize,
    failing_gets: AtomicUsize,
    failing_writes: AtomicUsize,
}

impl InMemoryMovieStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_version(&self) -> String {
        (self.next_version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    /// Store `movie` (create or overwrite), assigning a fresh resourceVersion.
    /// Returns the stored copy.
    pub fn insert(&self, mut movie: Movies) -> Movies {
        if movie.metadata.namespace.is_none() {
            movie.metadata.namespace = Some("default".to_string());
        }
        movie.metadata.resource_version = Some(self.bump_version());
        let key = ResourceKey::from_resource(&movie);
        lock(&self.objects).insert(key, movie.clone());
        movie
    }

    /// Remove a resource, as if it had been deleted
    pub fn remove(&self, key: &ResourceKey) -> Option<Movies> {
        lock(&self.objects).remove(key)
    }

    /// Bump the resourceVersion of a stored object, as a concurrent writer would
    pub fn touch(&self, key: &ResourceKey) {
        let version = self.bump_version();
        if let Some(movie) = lock(&self.objects).get_mut(key) {
            movie.metadata.resource_version = Some(version);
        }
    }

    /// Current stored copy
    #[must_use]
    pub fn snapshot(&self, key: &ResourceKey) -> Option<Movies> {
        lock(&self.objects).get(key).cloned()
    }

    /// Make the next `count` reads fail with a transient error
    pub fn fail_next_gets(&self, count: usize) {
        self.failing_gets.store(count, Ordering::SeqCst);
    }

    /// Make the next `count` status writes fail with a transient error
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of accepted status writes
    #[must_use]
    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    /// Number of rejected (stale) status writes
    #[must_use]
    pub fn conflicts(&self) -> usize {
        self.conflicts.load(Ordering::SeqCst)
    }
}

/// Decrement `counter` if positive; true when a failure should be injected
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl MovieStore for InMemoryMovieStore {
    async fn get(&self, key: &ResourceKey) -> Result<Option<Movies>, BackendError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_gets) {
            return Err(BackendError::Unavailable(format!("injected read failure for {key}")));
        }
        Ok(self.snapshot(key))
    }

    async fn update_status(
        &self,
        movie: &Movies,
        status: &MoviesStatus,
    ) -> Result<StatusWrite, BackendError> {
        let key = ResourceKey::from_resource(movie);
        let expected = movie
            .metadata
            .resource_version
            .clone()
            .ok_or_else(|| BackendError::MissingResourceVersion(key.clone()))?;
        if take_failure(&self.failing_writes) {
            return Err(BackendError::Unavailable(format!("injected write failure for {key}")));
        }

        let mut objects = lock(&self.objects);
        let Some(stored) = objects.get_mut(&key) else {
            return Err(BackendError::Unavailable(format!("{key} no longer exists")));
        };
        if stored.metadata.resource_version.as_deref() != Some(expected.as_str()) {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
            return Ok(StatusWrite::Conflict);
        }

        stored.status = Some(status.clone());
        stored.metadata.resource_version = Some(self.bump_version());
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(StatusWrite::Updated(Box::new(stored.clone())))
    }
}

/// How newly created units behave
#[derive(Clone)]
pub struct WorkerBehaviour {
    /// Phases reported by successive phase queries; the last one sticks
    pub phases: Vec<UnitPhase>,
    /// Log output produced for a given movie name
    pub output: Arc<dyn Fn(&str) -> String + Send + Sync>,
}

impl std::fmt::Debug for WorkerBehaviour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerBehaviour")
            .field("phases", &self.phases)
            .finish_non_exhaustive()
    }
}

impl WorkerBehaviour {
    /// Pending, Running, then Succeeded with a fixed log output
    #[must_use]
    pub fn succeeding(output: &str) -> Self {
        let output = output.to_string();
        Self {
            phases: vec![UnitPhase::Pending, UnitPhase::Running, UnitPhase::Succeeded],
            output: Arc::new(move |_| output.clone()),
        }
    }

    /// Running, then Failed with a fixed log output
    #[must_use]
    pub fn failing(output: &str) -> Self {
        let output = output.to_string();
        Self {
            phases: vec![UnitPhase::Running, UnitPhase::Failed],
            output: Arc::new(move |_| output.clone()),
        }
    }

    /// Stays Running forever and prints nothing
    #[must_use]
    pub fn never_finishing() -> Self {
        Self {
            phases: vec![UnitPhase::Running],
            output: Arc::new(|_| String::new()),
        }
    }

    /// Succeeds with output computed from the movie name
    #[must_use]
    pub fn printing(output: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            phases: vec![UnitPhase::Running, UnitPhase::Succeeded],
            output: Arc::new(output),
        }
    }
}

#[derive(Debug)]
struct MemoryUnit {
    spec: UnitSpec,
    phases: VecDeque<UnitPhase>,
    logs: String,
}

/// In-memory execution backend
#[derive(Debug)]
pub struct InMemoryExecutionBackend {
    behaviour: Mutex<WorkerBehaviour>,
    units: Mutex<HashMap<(String, String), MemoryUnit>>,
    create_calls: AtomicUsize,
    created: AtomicUsize,
    already_existing: AtomicUsize,
    phase_queries: AtomicUsize,
    log_reads: AtomicUsize,
    failing_creates: AtomicUsize,
}

impl InMemoryExecutionBackend {
    #[must_use]
    pub fn new(behaviour: WorkerBehaviour) -> Self {
        Self {
            behaviour: Mutex::new(behaviour),
            units: Mutex::new(HashMap::new()),
            create_calls: AtomicUsize::new(0),
            created: AtomicUsize::new(0),
            already_existing: AtomicUsize::new(0),
            phase_queries: AtomicUsize::new(0),
            log_reads: AtomicUsize::new(0),
            failing_creates: AtomicUsize::new(0),
        }
    }

    /// Force the phase of an existing unit
    pub fn set_phase(&self, namespace: &str, name: &str, phase: UnitPhase) {
        if let Some(unit) = lock(&self.units).get_mut(&(namespace.to_string(), name.to_string())) {
            unit.phases = VecDeque::from([phase]);
        }
    }

    /// Replace the log output of an existing unit
    pub fn set_logs(&self, namespace: &str, name: &str, logs: &str) {
        if let Some(unit) = lock(&self.units).get_mut(&(namespace.to_string(), name.to_string())) {
            unit.logs = logs.to_string();
        }
    }

    /// Remove a unit, as garbage collection or a manual delete would
    pub fn remove_unit(&self, namespace: &str, name: &str) {
        lock(&self.units).remove(&(namespace.to_string(), name.to_string()));
    }

    /// Make the next `count` create requests fail with a transient error
    pub fn fail_next_creates(&self, count: usize) {
        self.failing_creates.store(count, Ordering::SeqCst);
    }

    /// Spec of an existing unit
    #[must_use]
    pub fn unit(&self, namespace: &str, name: &str) -> Option<UnitSpec> {
        lock(&self.units)
            .get(&(namespace.to_string(), name.to_string()))
            .map(|u| u.spec.clone())
    }

    #[must_use]
    pub fn unit_count(&self) -> usize {
        lock(&self.units).len()
    }

    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of create requests that actually created a unit
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of create requests answered with `AlreadyExists`
    #[must_use]
    pub fn already_existing(&self) -> usize {
        self.already_existing.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn phase_queries(&self) -> usize {
        self.phase_queries.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn log_reads(&self) -> usize {
        self.log_reads.load(Ordering::SeqCst)
    }

    fn not_found(namespace: &str, name: &str) -> BackendError {
        BackendError::UnitNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl ExecutionBackend for InMemoryExecutionBackend {
    async fn create_unit(&self, spec: &UnitSpec) -> Result<CreateOutcome, BackendError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_creates) {
            return Err(BackendError::Unavailable(format!(
                "injected create failure for {}/{}",
                spec.namespace, spec.name
            )));
        }

        let behaviour = lock(&self.behaviour).clone();
        let mut units = lock(&self.units);
        let key = (spec.namespace.clone(), spec.name.clone());
        if units.contains_key(&key) {
            self.already_existing.fetch_add(1, Ordering::SeqCst);
            return Ok(CreateOutcome::AlreadyExists);
        }

        let movie_name = spec.args.first().map(String::as_str).unwrap_or_default();
        units.insert(
            key,
            MemoryUnit {
                spec: spec.clone(),
                phases: behaviour.phases.iter().copied().collect(),
                logs: (behaviour.output)(movie_name),
            },
        );
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(CreateOutcome::Created)
    }

    async fn unit_phase(&self, namespace: &str, name: &str) -> Result<UnitPhase, BackendError> {
        self.phase_queries.fetch_add(1, Ordering::SeqCst);
        let mut units = lock(&self.units);
        let unit = units
            .get_mut(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| Self::not_found(namespace, name))?;

        let phase = if unit.phases.len() > 1 {
            unit.phases.pop_front()
        } else {
            unit.phases.front().copied()
        };
        Ok(phase.unwrap_or(UnitPhase::Unknown))
    }

    async fn read_logs(&self, namespace: &str, name: &str) -> Result<String, BackendError> {
        self.log_reads.fetch_add(1, Ordering::SeqCst);
        lock(&self.units)
            .get(&(namespace.to_string(), name.to_string()))
            .map(|u| u.logs.clone())
            .ok_or_else(|| Self::not_found(namespace, name))
    }
}
