//! Discovery of generator scripts and inference of their output files

use lampsmith_core::{
    constants::{
        BASE_SCRIPT_NAME, DEFAULT_OUTPUT_SUFFIX, OUTPUT_EXTENSION, OUTPUT_MARKER_TOKENS,
        SCRIPT_EXTENSION, SCRIPT_INFIX, SCRIPT_NAME_PATTERN, SCRIPT_PREFIX,
    },
    Error, OutputMapping, Result, ScriptEntry,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

lazy_static! {
    static ref SCRIPT_NAME_REGEX: Regex = Regex::new(SCRIPT_NAME_PATTERN).unwrap();
    static ref EXPORT_PATH_REGEX: Regex =
        Regex::new(r#"(?s)export_filepath\s*=.*?['"].*?/([^/]+\.stl)['"]"#).unwrap();
}

/// Whether `filename` follows the generator script naming convention
#[must_use]
pub fn is_generator_script(filename: &str) -> bool {
    let has_extension = Path::new(filename)
        .extension()
        .is_some_and(|ext| ext == SCRIPT_EXTENSION);

    has_extension && (SCRIPT_NAME_REGEX.is_match(filename) || filename == BASE_SCRIPT_NAME)
}

/// List generator scripts directly inside `dir`, sorted by file name
pub fn discover(dir: &Path) -> Result<Vec<ScriptEntry>> {
    let mut scripts = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            Error::file_system(dir, "list scripts directory", std::io::Error::from(e))
        })?;

        let Some(filename) = entry.file_name().to_str() else {
            continue;
        };

        if !is_generator_script(filename) || !entry.path().is_file() {
            continue;
        }

        scripts.push(ScriptEntry::new(filename, entry.path()));
    }

    scripts.sort_by(|a, b| a.filename().cmp(b.filename()));

    tracing::debug!(dir = %dir.display(), count = scripts.len(), "discovered generator scripts");
    Ok(scripts)
}

/// Infer the mesh file a generator script exports
///
/// An explicit `export_filepath` literal wins; otherwise the name is derived
/// from the script's file name. Read failures fall back to the derivation.
#[must_use]
pub fn infer_output_name(script_path: &Path) -> String {
    if let Ok(content) = fs::read_to_string(script_path) {
        if let Some(name) = explicit_output_name(&content) {
            return name;
        }
    }

    let stem = script_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    derive_output_name(&stem)
}

/// Extract the output file name from an `export_filepath = "..."` assignment
#[must_use]
pub fn explicit_output_name(content: &str) -> Option<String> {
    EXPORT_PATH_REGEX
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Derive an output file name from a script's file stem
#[must_use]
pub fn derive_output_name(stem: &str) -> String {
    let mut name = if let Some(stripped) = stem.strip_prefix(SCRIPT_PREFIX) {
        stripped.to_string()
    } else if stem.contains(SCRIPT_INFIX) {
        stem.replace(SCRIPT_INFIX, "")
    } else {
        stem.to_string()
    };

    let lowered = name.to_lowercase();
    if !OUTPUT_MARKER_TOKENS
        .iter()
        .any(|token| lowered.contains(token))
    {
        name.push_str(DEFAULT_OUTPUT_SUFFIX);
    }

    format!("{name}.{OUTPUT_EXTENSION}")
}

/// Map every discovered script to its inferred output file
#[must_use]
pub fn build_mapping(scripts: &[ScriptEntry]) -> OutputMapping {
    let mut mapping = OutputMapping::new();
    for script in scripts {
        mapping.insert(script.filename(), infer_output_name(script.path()));
    }
    mapping
}
