//! # Status Persister
//!
//! Records a rating with a conditional write. The version token is the one on
//! the object read at the start of the invocation, so a concurrent writer in
//! between turns this write into a conflict instead of an overwrite.

use crate::crd::{Movies, MoviesStatus};
use crate::observability;
use crate::provider::{BackendError, MovieStore, StatusWrite};
use tracing::{info, warn};

/// Result of persisting a rating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Persisted,
    Conflict,
}

/// Write `rating` (with the producing unit) onto `movie`'s status
///
/// # Errors
///
/// Backend errors other than a version conflict.
pub async fn persist_rating(
    store: &dyn MovieStore,
    movie: &Movies,
    rating: &str,
    unit_name: &str,
) -> Result<PersistOutcome, BackendError> {
    let status = MoviesStatus::rated(rating, unit_name);
    match store.update_status(movie, &status).await? {
        StatusWrite::Updated(_) => {
            info!(rating, unit.name = unit_name, "Rating recorded");
            Ok(PersistOutcome::Persisted)
        }
        StatusWrite::Conflict => {
            warn!(
                resource_version = movie.metadata.resource_version.as_deref().unwrap_or(""),
                "Status write conflicted with a concurrent update"
            );
            observability::metrics::increment_status_conflicts();
            Ok(PersistOutcome::Conflict)
        }
    }
}
