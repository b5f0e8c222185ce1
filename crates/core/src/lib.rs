//! Core domain types, errors, and constants for the `lampsmith` build tool.
//!
//! ## Key Components
//!
//! - **`errors`**: The primary `Error` enum and `Result` alias shared by every
//!   workspace crate.
//! - **`types`**: Run-scoped domain values such as `ScriptEntry`,
//!   `OutputMapping` and `RunDecision`.
//! - **`constants`**: File names, naming patterns and host invocation flags.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::*,
};
