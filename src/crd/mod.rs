//! # Custom Resource Definitions
//!
//! CRD types for the Movie Rating Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - The `Movies` resource and its spec
//! - `status.rs` - Status written once a rating has been extracted
//! - `key.rs` - Namespace-qualified identity of a `Movies` resource

mod key;
mod spec;
mod status;

pub use key::ResourceKey;
pub use spec::{Movies, MoviesSpec};
pub use status::MoviesStatus;
