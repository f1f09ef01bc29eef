// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

/// Root configuration loaded from `config.yaml`.
///
/// Everything here is optional. A missing file means defaults, and CLI flags
/// override whatever the file says.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Default form fixture (JSON object of field name to value).
    ///
    /// Resolved relative to the location of config.yaml.
    #[serde(default)]
    pub form: Option<String>,

    /// Simulated redemption service settings
    #[serde(default)]
    pub simulation: Simulation,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Simulated service section.
///
/// Example in config.yaml:
///
/// simulation:
///   seed: 42
///
/// Latency (2000 ms) and success rate (90%) are fixed; only the random
/// source can be pinned.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Simulation {
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_mode")]
    pub mode: OutputMode,

    /// Only used when mode = file
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: default_output_mode(),
            file: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One JSON line on stdout
    Stdout,
    /// Indented JSON on stdout
    Pretty,
    /// Human-readable lines, rendered as they happen
    Simple,
    /// JSON written to output.file
    File,
}

fn default_output_mode() -> OutputMode {
    OutputMode::Simple
}

impl Config {
    /// Load and parse `config.yaml` from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&raw)
    }

    /// Like `load`, but a file that does not exist yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        Self::load(path)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        // an empty document is "null" to serde_yaml
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let cfg: Config = serde_yaml::from_str(raw).context("Failed to parse YAML config")?;

        Ok(cfg)
    }
}
