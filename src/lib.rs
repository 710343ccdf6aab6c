//! Movie Rating Controller Library
//!
//! Reconciles `Movies` resources: for each unrated resource a worker pod is
//! run once, its output is parsed into a rating, and the rating is recorded on
//! the resource status.
//!
//! ## Quick Start
//!
//! ```rust
//! use movie_rating_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
