//! # Result Extractor
//!
//! Turns the worker's log output into a rating.
//!
//! ## Output contract (v1)
//!
//! - The worker prints one or more lines. The **last non-empty line** is
//!   authoritative; earlier lines are progress noise and are ignored.
//! - That line is split on [`FIELD_SEPARATOR`]. The rating is the
//!   **second-to-last** field, with surrounding whitespace removed.
//! - `result-8.8-done` yields `8.8`; `abc-42-xyz` yields `42`.
//!
//! A worker with a different output shape needs a new contract version, not a
//! more lenient parser.

use std::fmt;
use thiserror::Error;

/// Version of the worker output contract implemented here
pub const EXTRACTION_CONTRACT_VERSION: &str = "v1";

/// Separator between fields of the authoritative line
pub const FIELD_SEPARATOR: char = '-';

/// A rating extracted from worker output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating(String);

impl Rating {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("empty output")]
    EmptyOutput,
    #[error("malformed output: {line:?}")]
    MalformedOutput { line: String },
}

impl ExtractionError {
    /// Short reason used in logs and metrics
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyOutput => "empty output",
            Self::MalformedOutput { .. } => "malformed output",
        }
    }
}

/// Extract the rating from raw worker output
///
/// # Errors
///
/// `EmptyOutput` when there is no non-blank line, `MalformedOutput` when the
/// authoritative line has fewer than two fields or a blank rating field.
pub fn extract(log_text: &str) -> Result<Rating, ExtractionError> {
    let line = log_text
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or(ExtractionError::EmptyOutput)?;

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() < 2 {
        return Err(ExtractionError::MalformedOutput {
            line: line.to_string(),
        });
    }

    let rating = fields[fields.len() - 2].trim();
    if rating.is_empty() {
        return Err(ExtractionError::MalformedOutput {
            line: line.to_string(),
        });
    }

    Ok(Rating(rating.to_string()))
}
