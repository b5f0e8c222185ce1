//! Configuration loader for lampsmith
//!
//! Resolves command line overrides and environment variables into a
//! `BuildConfig`. Relative paths are anchored at the working directory.

use crate::config::{BuildConfig, HostSettings, RuntimeOptions};
use lampsmith_core::{
    constants::{CACHE_FILE_NAME, HOST_PATH_VAR, OUTPUT_DIR_NAME},
    Error, Result,
};
use std::path::{Path, PathBuf};

/// Builder that produces the run configuration at startup
#[derive(Debug, Default)]
pub struct ConfigLoader {
    directory: Option<PathBuf>,
    output_directory: Option<PathBuf>,
    cache_file: Option<PathBuf>,
    host: Option<PathBuf>,
    interactive: bool,
    runtime: RuntimeOptions,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            interactive: true,
            ..Self::default()
        }
    }

    /// Set the directory to scan (defaults to the current directory)
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    /// Override the output directory
    pub fn output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(dir.into());
        self
    }

    /// Override the cache file location
    pub fn cache_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(file.into());
        self
    }

    /// Use an explicit host executable
    pub fn host(mut self, path: impl Into<PathBuf>) -> Self {
        self.host = Some(path.into());
        self
    }

    /// Allow or forbid prompting for the host path
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Rebuild every script
    pub fn force(mut self, force: bool) -> Self {
        self.runtime.force = force;
        self
    }

    /// Load the configuration
    pub fn load(self) -> Result<BuildConfig> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::file_system(".", "determine current directory", e))?;

        let working_directory = match self.directory {
            Some(dir) => anchor(&cwd, dir),
            None => cwd,
        };

        if !working_directory.is_dir() {
            return Err(Error::configuration(format!(
                "working directory '{}' does not exist or is not a directory",
                working_directory.display()
            )));
        }

        let output_directory = anchor(
            &working_directory,
            self.output_directory
                .unwrap_or_else(|| PathBuf::from(OUTPUT_DIR_NAME)),
        );
        let cache_file = anchor(
            &working_directory,
            self.cache_file
                .unwrap_or_else(|| PathBuf::from(CACHE_FILE_NAME)),
        );

        let env_path = std::env::var_os(HOST_PATH_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        tracing::debug!(
            working_directory = %working_directory.display(),
            output_directory = %output_directory.display(),
            cache_file = %cache_file.display(),
            "loaded build configuration"
        );

        Ok(BuildConfig {
            working_directory,
            output_directory,
            cache_file,
            host: HostSettings {
                explicit_path: self.host,
                env_path,
                interactive: self.interactive,
            },
            runtime: self.runtime,
        })
    }
}

fn anchor(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
