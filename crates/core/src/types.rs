use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A generator script discovered during a directory scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    filename: String,
    path: PathBuf,
}

impl ScriptEntry {
    /// Create an entry from a file name and its absolute path
    pub fn new(filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            path: path.into(),
        }
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Script file name to inferred output file name, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMapping(IndexMap<String, String>);

impl OutputMapping {
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, script: impl Into<String>, output: impl Into<String>) {
        self.0.insert(script.into(), output.into());
    }

    #[must_use]
    pub fn get(&self, script: &str) -> Option<&str> {
        self.0.get(script).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, o)| (s.as_str(), o.as_str()))
    }
}

/// Why a script is (or is not) executed during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunDecision {
    /// Hash unchanged and output present
    Skip,
    /// No cache entry for the script
    RunNew,
    /// Cached hash differs from the current one
    RunModified,
    /// Hash unchanged but the output file is absent
    RunOutputMissing,
    /// Rebuild requested regardless of cache state
    RunForced,
}

impl RunDecision {
    #[must_use]
    pub const fn should_run(&self) -> bool {
        !matches!(self, Self::Skip)
    }

    /// Human readable reason for a run, `None` when skipped
    #[must_use]
    pub const fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Skip => None,
            Self::RunNew => Some("new"),
            Self::RunModified => Some("modified"),
            Self::RunOutputMissing => Some("missing STL"),
            Self::RunForced => Some("forced"),
        }
    }
}

impl fmt::Display for RunDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "run ({reason})"),
            None => write!(f, "skip"),
        }
    }
}

/// Result of invoking the host application for one script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failure { reason: String },
}

impl RunOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}
