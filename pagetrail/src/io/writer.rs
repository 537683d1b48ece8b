//! Output writing.
//!
//! Merged bytes and the audit log both reach disk through [`write_atomic`]:
//! the data goes to a sibling temp file which is flushed, synced and then
//! renamed over the target. A crash or a failed write leaves the previous
//! file untouched.
//!
//! # Examples
//!
//! ```no_run
//! use pagetrail::io::PdfWriter;
//! use std::path::Path;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = PdfWriter::new();
//! let stats = writer.save(&bytes, Path::new("merged.pdf")).await?;
//! println!("wrote {}", stats.format_file_size());
//! # Ok(())
//! # }
//! ```

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::task;
use tracing::debug;

use crate::error::{PageTrailError, Result};
use crate::utils::format_file_size;

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Writes serialized documents to disk.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    atomic: bool,
}

impl PdfWriter {
    /// Create a writer that replaces outputs atomically.
    pub fn new() -> Self {
        Self { atomic: true }
    }

    /// Create a writer that writes in place (faster but not crash-safe).
    pub fn non_atomic() -> Self {
        Self { atomic: false }
    }

    /// Write `bytes` to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PageTrailError::FailedToWrite`] if the file cannot be
    /// created, written or renamed into place.
    pub async fn save(&self, bytes: &[u8], path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let data = bytes.to_vec();
        let atomic = self.atomic;

        task::spawn_blocking(move || {
            let start = Instant::now();

            let written = if atomic {
                write_atomic(&path_buf, &data)
            } else {
                fs::write(&path_buf, &data)
            };
            written.map_err(|source| PageTrailError::FailedToWrite {
                path: path_buf.clone(),
                source,
            })?;

            let write_time = start.elapsed();
            debug!(path = %path_buf.display(), bytes = data.len(), ?write_time, "output written");

            Ok(WriteStatistics {
                write_time,
                file_size: data.len() as u64,
                output_path: path_buf,
            })
        })
        .await
        .map_err(|e| PageTrailError::other(format!("Write task failed: {e}")))?
    }

    /// Check if a file can be written to the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory doesn't exist or is read-only.
    pub async fn can_write(&self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        let metadata = tokio::fs::metadata(parent).await.map_err(|_| {
            PageTrailError::invalid_config(format!(
                "Output directory does not exist: {}",
                parent.display()
            ))
        })?;

        if metadata.permissions().readonly() {
            return Err(PageTrailError::invalid_config(format!(
                "Output directory is not writable: {}",
                parent.display()
            )));
        }

        Ok(())
    }

    /// Check if output file exists.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Replace `path` with `bytes` via write-to-temp and rename.
///
/// The temp file is removed again if anything fails before the rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = temp_path(path);

    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}
