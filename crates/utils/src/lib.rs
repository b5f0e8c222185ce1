//! Shared utilities for lampsmith
//!
//! Atomic file writes used by the build cache and the tracing setup used by
//! the command line front end.

pub mod atomic_file;
pub mod tracing;

pub use atomic_file::*;
