// src/util.rs

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resolve a path relative to the location of `config.yaml`.
///
/// Example:
/// config.yaml at `/project/config.yaml`
/// form = "fixtures/form.json"
/// → resolves to `/project/fixtures/form.json`
pub fn resolve_relative_to_config(config_path: &Path, rel: &str) -> PathBuf {
    let rel = Path::new(rel);
    if rel.is_absolute() {
        return rel.to_path_buf();
    }

    config_path
        .parent()
        .map(|base| base.join(rel))
        .unwrap_or_else(|| rel.to_path_buf())
}

/// Read a UTF-8 file into a String with a clear error message.
pub fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Ensure a directory exists (create it if missing).
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {:?}", path))
}
