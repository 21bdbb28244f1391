//! The file handed to the pipeline: a path with a known total size.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::decompression::DecompressionReader;
use crate::error_handling::PipelineError;
use crate::readers::{ByteCounter, CountingReader};

/// Reader type produced for every parse pass over a file
pub type InputReader = DecompressionReader<CountingReader<File>>;

/// Checks applied before a file is accepted
#[derive(Debug, Clone, Copy)]
pub struct InputLimits {
    pub max_size: Option<u64>,
    pub require_csv_extension: bool,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_size: Some(crate::config::DEFAULT_MAX_SIZE),
            require_csv_extension: true,
        }
    }
}

/// A validated input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInput {
    path: PathBuf,
    name: String,
    size: u64,
}

impl FileInput {
    /// Validate `path` against `limits` and capture its size
    pub fn open<P: AsRef<Path>>(path: P, limits: &InputLimits) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if limits.require_csv_extension && !has_csv_extension(&name) {
            return Err(PipelineError::InvalidInput(
                "Please select a CSV file.".to_string(),
            ));
        }

        let metadata = fs::metadata(path).map_err(|e| {
            PipelineError::InvalidInput(format!("Cannot open '{}': {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(PipelineError::InvalidInput(format!(
                "'{}' is not a regular file",
                path.display()
            )));
        }

        let size = metadata.len();
        if let Some(max) = limits.max_size {
            if size > max {
                return Err(PipelineError::InvalidInput(format!(
                    "File is too large. Maximum size is {}.",
                    format_size(max)
                )));
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total size on disk, the denominator for progress
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Open a fresh reader for one parse pass
    pub fn reader(&self) -> Result<(InputReader, ByteCounter)> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open '{}'", self.path.display()))?;
        let counting = CountingReader::new(file);
        let counter = counting.counter();
        let reader = DecompressionReader::new(counting)
            .with_context(|| format!("Failed to read '{}'", self.path.display()))?;
        Ok((reader, counter))
    }
}

/// `.csv`, optionally followed by `.gz` or `.zst`, case-insensitive
pub fn has_csv_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let stem = lower
        .strip_suffix(".gz")
        .or_else(|| lower.strip_suffix(".zst"))
        .unwrap_or(&lower);
    stem.ends_with(".csv")
}

/// `10485760` -> `10MB`, `1536` -> `1.5KB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [(&str, u64); 3] = [("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];
    for (unit, scale) in UNITS {
        if bytes >= scale {
            let value = bytes as f64 / scale as f64;
            return if bytes % scale == 0 {
                format!("{}{}", bytes / scale, unit)
            } else {
                format!("{:.1}{}", value, unit)
            };
        }
    }
    format!("{}B", bytes)
}
