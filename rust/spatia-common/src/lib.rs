//! Common utilities and configurations for Spatia.
//!
//! This crate contains shared components that are used across the geometry,
//! statistics, index and GeoParquet crates, including configuration options.

pub mod error;
pub mod option;

pub use option::*;
