//! Run configuration for lampsmith
//!
//! `BuildConfig` is immutable once constructed and is handed to the runner
//! and the host locator by reference.

use std::path::PathBuf;

/// Immutable configuration for one build run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Directory scanned for generator scripts
    pub working_directory: PathBuf,

    /// Directory the generators export meshes into
    pub output_directory: PathBuf,

    /// JSON file holding script hashes between runs
    pub cache_file: PathBuf,

    /// Host settings used when a script has to be executed
    pub host: HostSettings,

    /// Runtime behavior switches
    pub runtime: RuntimeOptions,
}

/// How the host modeling application is found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSettings {
    /// Path given on the command line; must exist when set
    pub explicit_path: Option<PathBuf>,

    /// Path taken from the `BLENDER_PATH` environment variable
    pub env_path: Option<PathBuf>,

    /// Whether the user may be prompted for a path
    pub interactive: bool,
}

/// Runtime options that alter run decisions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Rebuild every script regardless of cache state
    pub force: bool,
}

impl BuildConfig {
    /// Absolute path of the mapped output file for `output_name`
    #[must_use]
    pub fn output_path(&self, output_name: &str) -> PathBuf {
        self.output_directory.join(output_name)
    }
}
