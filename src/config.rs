//! Run configuration.
//!
//! Handles YAML loading of the bank list, shuffle seed and spot-check
//! settings, plus glob-based bank discovery.

use crate::bank::{backup_path, is_backup_path};
use crate::verify::SpotCheckConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Sample fraction must be in (0, 1], got {0}")]
    InvalidSampleFraction(f64),

    #[error("No question banks configured")]
    NoBanks,

    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),
}

/// One bank to process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BankEntry {
    /// Display name (e.g. "People Domain")
    pub name: String,
    /// Path to the bank JSON file
    pub path: PathBuf,
}

impl BankEntry {
    /// Create an entry
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Entry named after the file stem
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().to_string());
        Self { name, path }
    }

    /// Where this bank's pre-shuffle backup lives
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        backup_path(&self.path)
    }
}

/// Balance run configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceConfig {
    /// Shuffle seed
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Spot-check settings
    #[serde(default)]
    pub verification: SpotCheckConfig,
    /// Banks to process, in order
    #[serde(default)]
    pub banks: Vec<BankEntry>,
}

const fn default_seed() -> u64 {
    42
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            verification: SpotCheckConfig::default(),
            banks: Vec::new(),
        }
    }
}

impl BalanceConfig {
    /// Load configuration from a YAML file
    ///
    /// Relative bank paths are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            for bank in &mut config.banks {
                if bank.path.is_relative() {
                    bank.path = base.join(&bank.path);
                }
            }
        }
        Ok(config)
    }

    /// Load configuration from a YAML string
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Replace the bank list with the banks matching `pattern`
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid.
    pub fn with_bank_glob(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.banks = discover_banks(pattern)?;
        Ok(self)
    }

    /// Check the configuration can drive a run
    ///
    /// # Errors
    ///
    /// Returns an error for an empty bank list or an invalid sample fraction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.banks.is_empty() {
            return Err(ConfigError::NoBanks);
        }
        self.verification
            .validate()
            .map_err(|_| ConfigError::InvalidSampleFraction(self.verification.sample_fraction))
    }
}

/// Bank files matching `pattern`, sorted, with backup files skipped
///
/// # Errors
///
/// Returns an error if the glob pattern is invalid or a match is unreadable.
pub fn discover_banks(pattern: &str) -> Result<Vec<BankEntry>, ConfigError> {
    let paths = glob::glob(pattern).map_err(|e| ConfigError::InvalidGlob(e.to_string()))?;

    let mut banks = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| ConfigError::IoError(std::io::Error::other(format!("Glob error: {e}"))))?;
        if !is_backup_path(&path) {
            banks.push(BankEntry::from_path(path));
        }
    }
    banks.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(banks)
}
