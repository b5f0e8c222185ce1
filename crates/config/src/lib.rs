//! Configuration management for lampsmith
//!
//! This crate turns command line flags and environment variables into the
//! immutable `BuildConfig` shared by the runner.

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::*;
