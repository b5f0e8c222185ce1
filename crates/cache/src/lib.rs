//! Build cache for lampsmith
//!
//! This crate provides the content hashing used to detect script changes
//! and the JSON cache that remembers digests between runs.

pub mod build_cache;
pub mod hashing;

pub use build_cache::{BuildCache, CacheEntry, CacheState};
pub use hashing::*;
