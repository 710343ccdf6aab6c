//! # Movies Status

use serde::{Deserialize, Serialize};

/// Status of the Movies resource
///
/// `rating` moves from empty to its final value exactly once. The other
/// fields are written in the same update and are informational only.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoviesStatus {
    /// Extracted rating, empty until computed
    #[serde(default)]
    pub rating: String,
    /// Name of the execution unit whose output produced the rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_unit: Option<String>,
    /// When the rating was recorded (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_at: Option<String>,
}

impl MoviesStatus {
    #[must_use]
    pub fn rated(rating: impl Into<String>, execution_unit: impl Into<String>) -> Self {
        Self {
            rating: rating.into(),
            execution_unit: Some(execution_unit.into()),
            rated_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }
}
