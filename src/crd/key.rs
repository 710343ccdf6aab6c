//! # Resource Key
//!
//! Namespace-qualified identity of a `Movies` resource.

use crate::crd::Movies;
use kube::ResourceExt;
use std::fmt;

/// Identity passed to the reconciler. Everything else is re-read from the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Build the key of an observed object, defaulting the namespace
    #[must_use]
    pub fn from_resource(movie: &Movies) -> Self {
        Self::new(
            movie.namespace().unwrap_or_else(|| "default".to_string()),
            movie.name_any(),
        )
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::MoviesSpec;

    #[test]
    fn test_display_is_namespace_slash_name() {
        assert_eq!(ResourceKey::new("media", "inception").to_string(), "media/inception");
    }

    #[test]
    fn test_from_resource_defaults_namespace() {
        let movie = Movies::new(
            "inception",
            MoviesSpec {
                movie_name: "Inception".to_string(),
            },
        );
        assert_eq!(ResourceKey::from_resource(&movie), ResourceKey::new("default", "inception"));
    }
}
