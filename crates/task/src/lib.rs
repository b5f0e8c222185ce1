//! Script discovery and change-gated execution for lampsmith
//!
//! This crate finds generator scripts, infers their outputs, locates the
//! host application and runs the scripts whose inputs changed.

pub mod command_executor;
pub mod host;
pub mod locator;
pub mod runner;

pub use command_executor::*;
pub use host::*;
pub use locator::{build_mapping, discover, infer_output_name};
pub use runner::*;
