//! Configuration for pagetrail.
//!
//! This module turns CLI arguments into validated settings for the two
//! halves of the tool:
//! - [`Config`] drives a merge (inputs, output, compression, concurrency)
//! - [`AuditConfig`] locates the durable audit log

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PageTrailError, Result};

/// Environment variable that overrides the audit data directory.
pub const DATA_DIR_ENV: &str = "PAGETRAIL_DATA_DIR";

/// Data directory used when nothing else is configured.
pub const DEFAULT_DATA_DIR: &str = ".pagetrail";

/// Fixed storage key the audit log lives under.
pub const AUDIT_LOG_KEY: &str = "pagetrail-auditlog";

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// No compression - streams are written as they were read.
    None,
    /// Compress uncompressed streams.
    #[default]
    Standard,
    /// Drop unreachable objects, then compress.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = PageTrailError;

    /// Parse compression level from "none", "standard" or "maximum".
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(PageTrailError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// Complete configuration for a merge run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input PDF file paths (in merge order).
    pub inputs: Vec<PathBuf>,

    /// Output file path. `.pdf` is appended when missing.
    pub output: PathBuf,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// Number of concurrent loads (None = auto-detect).
    pub jobs: Option<usize>,
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Fewer than two inputs are specified
    /// - Verbose and quiet modes are both enabled
    /// - Jobs count is zero
    /// - The output path is also an input
    pub fn validate(&self) -> Result<()> {
        if self.inputs.len() < 2 {
            return Err(PageTrailError::InsufficientInputs {
                count: self.inputs.len(),
            });
        }

        if self.verbose && self.quiet {
            return Err(PageTrailError::invalid_config(
                "Cannot use both --verbose and --quiet",
            ));
        }

        if self.jobs == Some(0) {
            return Err(PageTrailError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        let has_name = self
            .output
            .file_name()
            .is_some_and(|name| !name.to_string_lossy().trim().is_empty());
        if !has_name {
            return Err(PageTrailError::invalid_config(
                "Output file name cannot be empty",
            ));
        }

        let output = self.output_path();
        if self.inputs.iter().any(|input| input == &output) {
            return Err(PageTrailError::invalid_config(format!(
                "Output file cannot be the same as an input file: {}",
                output.display()
            )));
        }

        Ok(())
    }

    /// Output path with the `.pdf` extension applied.
    pub fn output_path(&self) -> PathBuf {
        let file_name = self
            .output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.output
            .with_file_name(crate::merge::normalize_output_name(&file_name))
    }

    /// Get the effective number of concurrent loads.
    ///
    /// Returns the configured job count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Check if status output should be displayed.
    pub fn should_print(&self) -> bool {
        !self.quiet
    }
}

/// Location of the durable audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    /// Directory holding the key-value files.
    pub data_dir: PathBuf,

    /// Key the log is stored under.
    pub storage_key: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: AUDIT_LOG_KEY.to_string(),
        }
    }
}

impl AuditConfig {
    /// Audit config rooted at `data_dir` with the fixed storage key.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Resolve the data directory from an explicit value, then
    /// `PAGETRAIL_DATA_DIR`, then the default.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let data_dir = explicit
            .or_else(|| {
                std::env::var_os(DATA_DIR_ENV)
                    .filter(|value| !value.is_empty())
                    .map(PathBuf::from)
            })
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self::new(data_dir)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.storage_key.is_empty() {
            return Err(PageTrailError::invalid_config(
                "Audit storage key cannot be empty",
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(PageTrailError::invalid_config(
                "Audit data directory cannot be empty",
            ));
        }
        Ok(())
    }
}
