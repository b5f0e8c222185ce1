//! Locating the host modeling application
//!
//! Probing order: explicit `--host` path, `BLENDER_PATH`, the platform's
//! usual install locations, `blender` on `PATH`, and finally an interactive
//! prompt. Failing every step aborts the run before any script is touched.

use lampsmith_config::HostSettings;
use lampsmith_core::{constants::HOST_BINARY_NAME, Error, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// Source of a manually entered host path
pub trait HostPrompt: Send + Sync {
    /// Ask for a path, `None` when no answer is available
    fn ask_path(&self) -> Option<String>;
}

/// Prompt on the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl HostPrompt for StdinPrompt {
    fn ask_path(&self) -> Option<String> {
        print!("Please enter the full path to your Blender executable: ");
        io::stdout().flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

/// Never answers; used for non-interactive runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl HostPrompt for NoPrompt {
    fn ask_path(&self) -> Option<String> {
        None
    }
}

/// Finds the host executable according to `HostSettings`
#[derive(Debug, Clone)]
pub struct HostLocator {
    settings: HostSettings,
    candidates: Vec<PathBuf>,
    search_path: bool,
}

impl HostLocator {
    pub fn new(settings: HostSettings) -> Self {
        Self {
            settings,
            candidates: default_candidates(),
            search_path: true,
        }
    }

    /// Replace the platform install locations
    pub fn with_candidates(mut self, candidates: Vec<PathBuf>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Enable or disable the `PATH` lookup
    pub fn search_path(mut self, enabled: bool) -> Self {
        self.search_path = enabled;
        self
    }

    #[must_use]
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Resolve the host executable
    pub fn locate(&self, prompt: &dyn HostPrompt) -> Result<PathBuf> {
        if let Some(explicit) = &self.settings.explicit_path {
            if explicit.exists() {
                return Ok(explicit.clone());
            }
            return Err(Error::host_not_found(format!(
                "no Blender executable at '{}'",
                explicit.display()
            )));
        }

        if let Some(from_env) = &self.settings.env_path {
            if from_env.exists() {
                tracing::debug!(path = %from_env.display(), "using host from environment");
                return Ok(from_env.clone());
            }
            tracing::warn!(path = %from_env.display(), "BLENDER_PATH does not exist, probing defaults");
        }

        if let Some(found) = self.candidates.iter().find(|path| path.exists()) {
            return Ok(found.clone());
        }

        if self.search_path {
            if let Ok(found) = which::which(HOST_BINARY_NAME) {
                tracing::debug!(path = %found.display(), "found host on PATH");
                return Ok(found);
            }
        }

        if !self.settings.interactive {
            return Err(Error::host_not_found(
                "no Blender executable found; pass --host or set BLENDER_PATH",
            ));
        }

        println!("Could not automatically find Blender executable.");
        let manual = prompt.ask_path().unwrap_or_default();
        let manual_path = PathBuf::from(&manual);
        if !manual.is_empty() && manual_path.exists() {
            Ok(manual_path)
        } else {
            Err(Error::host_not_found(format!(
                "Could not find Blender executable at {manual}"
            )))
        }
    }
}

/// Usual install locations for the current platform, in probe order
#[must_use]
pub fn default_candidates() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let home = dirs::home_dir().unwrap_or_default();
        vec![
            PathBuf::from("/Applications/Blender.app/Contents/MacOS/Blender"),
            home.join("Applications/Blender.app/Contents/MacOS/Blender"),
            PathBuf::from("/Applications/Blender.app/Contents/MacOS/blender"),
            home.join("Applications/Blender.app/Contents/MacOS/blender"),
        ]
    }

    #[cfg(windows)]
    {
        vec![
            PathBuf::from(r"C:\Program Files\Blender Foundation\Blender\blender.exe"),
            PathBuf::from(r"C:\Program Files\Blender Foundation\Blender 4.0\blender.exe"),
        ]
    }

    #[cfg(not(any(target_os = "macos", windows)))]
    {
        vec![
            PathBuf::from("/usr/bin/blender"),
            PathBuf::from("/usr/local/bin/blender"),
        ]
    }
}
