//! Error types for lampsmith operations

mod builders;
mod types;

pub use types::{Error, Result};
