mod csv;
mod json;
mod table;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::table::TableFormatter;

use anyhow::Result;

use crate::config::OutputFormat;
use crate::orchestrator::PipelineOutput;

/// Render the result of one file
pub trait Formatter {
    fn format(&self, output: &PipelineOutput) -> Result<String>;
}

/// What goes around the blocks themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    pub use_colors: bool,
    /// Name the file (several files in one run)
    pub show_file: bool,
    /// Include the `N rows parsed` status line
    pub show_summary: bool,
    /// Embed processing statistics where the format allows
    pub include_stats: bool,
}

pub fn create_formatter(format: OutputFormat, options: FormatOptions) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter::new(options)),
        OutputFormat::Json => Box::new(JsonFormatter::new(options)),
        OutputFormat::Csv => Box::new(CsvFormatter::new(options)),
    }
}
