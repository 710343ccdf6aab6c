//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Field manager name used for status writes
pub const FIELD_MANAGER: &str = "movie-rating-controller";

/// Default worker image that fetches a rating for a movie name
pub const DEFAULT_WORKER_IMAGE: &str = "26tanishabanik/imdb:v1";

/// Default name of the single container in a worker pod
pub const DEFAULT_WORKER_CONTAINER_NAME: &str = "imdb-fetcher";

/// Default namespace worker pods are created in
pub const DEFAULT_EXECUTION_NAMESPACE: &str = "default";

/// Prefix of every deterministic execution unit name
pub const UNIT_NAME_PREFIX: &str = "job";

/// Maximum length of an execution unit name (DNS-1123 label)
pub const MAX_UNIT_NAME_LEN: usize = 63;

/// Label marking pods created by this controller
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Label carrying the owning Movies resource name
pub const LABEL_MOVIE: &str = "rating.tanisha.banik/movie";

/// Label carrying the owning Movies resource namespace
pub const LABEL_MOVIE_NAMESPACE: &str = "rating.tanisha.banik/movie-namespace";

/// Default completion wait timeout (seconds)
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 120;

/// Default interval between unit phase polls (milliseconds)
pub const DEFAULT_COMPLETION_POLL_INTERVAL_MS: u64 = 2000;

/// Default deadline for a whole reconcile invocation (seconds)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 300;

/// Default Fibonacci backoff minimum (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Default Fibonacci backoff maximum (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default maximum number of concurrent reconciliations
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Default HTTP server port for metrics and health checks
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Default watch backoff start after API server throttling (milliseconds)
pub const DEFAULT_WATCH_BACKOFF_START_MS: u64 = 1000;

/// Default watch backoff ceiling after API server throttling (milliseconds)
pub const DEFAULT_WATCH_BACKOFF_MAX_MS: u64 = 30_000;
