use anyhow::{anyhow, Result};
use clap::ValueEnum;

use crate::input::InputLimits;
use crate::tty;

/// Default upper bound on input size (10 MiB)
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of rows read for header detection
pub const DEFAULT_PREVIEW_ROWS: usize = 2;

/// Main configuration struct for serialblocks
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

/// Input configuration
#[derive(Debug, Clone)]
pub struct InputConfig {
    pub files: Vec<String>,
    pub delimiter: u8,
    pub header: HeaderMode,
    pub preview_rows: usize,
    /// None disables the size check
    pub max_size: Option<u64>,
    pub any_extension: bool,
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color: ColorMode,
    pub stats: bool,
    pub quiet: bool,
    pub progress: bool,
    pub output_file: Option<String>,
}

/// Processing configuration
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub on_error: SkippedRowReport,
    pub verbose: u8,
    pub interactive: bool,
}

/// How the header row is decided
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderMode {
    /// Look at the first cell of the first row
    #[default]
    Auto,
    /// Always treat row 0 as a header
    Yes,
    /// Never treat row 0 as a header
    No,
}

/// Block output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Color output mode
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// What to do with parse problems that were tolerated because rows were captured
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SkippedRowReport {
    /// Absorb silently
    #[default]
    Ignore,
    /// One count line after the results
    Summary,
    /// Every problem as it is seen, plus the count line
    Print,
}

impl SerialConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let max_size = match cli.max_size.as_deref() {
            Some(raw) => parse_size(raw)?,
            None => Some(DEFAULT_MAX_SIZE),
        };

        if cli.preview_rows == 0 {
            return Err(anyhow!("--preview-rows must be at least 1"));
        }

        Ok(Self {
            input: InputConfig {
                files: cli.files.clone(),
                delimiter: parse_delimiter(&cli.delimiter)?,
                header: cli.header,
                preview_rows: cli.preview_rows,
                max_size,
                any_extension: cli.any_extension,
            },
            output: OutputConfig {
                format: cli.output_format,
                color: cli.color,
                stats: cli.stats,
                quiet: cli.quiet,
                progress: !cli.no_progress && !cli.quiet,
                output_file: cli.output_file.clone(),
            },
            processing: ProcessingConfig {
                on_error: cli.on_error,
                verbose: cli.verbose,
                interactive: cli.interactive,
            },
        })
    }

    pub fn input_limits(&self) -> InputLimits {
        InputLimits {
            max_size: self.input.max_size,
            require_csv_extension: !self.input.any_extension,
        }
    }

    /// Whether stdout output should be colored
    pub fn use_colors(&self) -> bool {
        self.output.output_file.is_none() && tty::should_use_colors_with_mode(&self.output.color)
    }

    /// Format an error line for stderr
    pub fn format_error_message(&self, message: &str) -> String {
        format_error_line(message, tty::should_use_stderr_colors(&self.output.color))
    }

    /// Format an informational line for stderr
    pub fn format_info_message(&self, message: &str) -> String {
        format!("serialblocks: {}", message)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            input: InputConfig {
                files: Vec::new(),
                delimiter: b',',
                header: HeaderMode::Auto,
                preview_rows: DEFAULT_PREVIEW_ROWS,
                max_size: Some(DEFAULT_MAX_SIZE),
                any_extension: false,
            },
            output: OutputConfig {
                format: OutputFormat::Table,
                color: ColorMode::Auto,
                stats: false,
                quiet: false,
                progress: true,
                output_file: None,
            },
            processing: ProcessingConfig {
                on_error: SkippedRowReport::Ignore,
                verbose: 0,
                interactive: false,
            },
        }
    }
}

/// Error line for places that run before a config exists (signal thread, CLI parsing)
pub fn format_error_message_auto(message: &str) -> String {
    format_error_line(message, tty::should_use_stderr_colors(&ColorMode::Auto))
}

fn format_error_line(message: &str, colored: bool) -> String {
    let (red, reset) = if colored {
        ("\x1b[91m", "\x1b[0m")
    } else {
        ("", "")
    };
    format!("{}serialblocks: error:{} {}", red, reset, message)
}

/// Parse a delimiter argument: a single ASCII character, `tab` or `\t`
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" => Ok(b','),
        "semicolon" => Ok(b';'),
        "pipe" => Ok(b'|'),
        _ => {
            let bytes = raw.as_bytes();
            if bytes.len() == 1 && bytes[0].is_ascii() && bytes[0] != b'"' && bytes[0] != b'\n' {
                Ok(bytes[0])
            } else {
                Err(anyhow!(
                    "Invalid delimiter '{}': expected a single ASCII character or 'tab'",
                    raw
                ))
            }
        }
    }
}

/// Parse a size like `512`, `64K`, `10M`, `1G`; `0` means unlimited
pub fn parse_size(raw: &str) -> Result<Option<u64>> {
    let trimmed = raw.trim();
    let upper = trimmed.to_ascii_uppercase();
    let number = upper
        .trim_end_matches("IB")
        .trim_end_matches('B');
    let (digits, multiplier) = match number.chars().last() {
        Some('K') => (&number[..number.len() - 1], 1024u64),
        Some('M') => (&number[..number.len() - 1], 1024 * 1024),
        Some('G') => (&number[..number.len() - 1], 1024 * 1024 * 1024),
        _ => (number, 1),
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid size '{}': expected e.g. 500K, 10M or 0", raw))?;
    let bytes = value
        .checked_mul(multiplier)
        .ok_or_else(|| anyhow!("Invalid size '{}': too large", raw))?;

    Ok(if bytes == 0 { None } else { Some(bytes) })
}
