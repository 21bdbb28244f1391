// Command-line interface definition

use clap::Parser;

use crate::config::{ColorMode, HeaderMode, OutputFormat, SkippedRowReport};

#[derive(Parser, Debug)]
#[command(name = "serialblocks")]
#[command(about = "Group the identifiers of a CSV file into runs of consecutive numbers")]
#[command(
    long_about = "Group the identifiers of a CSV file into runs of consecutive numbers\n\nThe first column of every row is reduced to its digits (555-123-4567 -> 5551234567)\nand the resulting sorted sequence is printed as blocks of consecutive values.\nA header row is detected from the first cell of the file.\n\nINTERACTIVE MODE:\n  Run 'serialblocks -i' to enter file paths one after another at a prompt.\n  Ctrl-C cancels the file being parsed; :clear resets, :quit leaves.\n\nCOMMON EXAMPLES:\n  serialblocks serials.csv\n  serialblocks -F json --stats serials.csv.gz\n  serialblocks --header no -d ';' export.csv"
)]
#[command(author)]
#[command(version)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Input files (.csv, .csv.gz or .csv.zst); later files supersede earlier ones
    pub files: Vec<String>,

    /// Field delimiter: a single character, or tab, comma, semicolon, pipe
    #[arg(
        short = 'd',
        long = "delimiter",
        default_value = ",",
        help_heading = "Input Options"
    )]
    pub delimiter: String,

    /// Header row handling: auto detects from the first cell
    #[arg(
        long = "header",
        value_enum,
        default_value = "auto",
        help_heading = "Input Options"
    )]
    pub header: HeaderMode,

    /// Number of rows read for header detection
    #[arg(
        long = "preview-rows",
        default_value_t = crate::config::DEFAULT_PREVIEW_ROWS,
        help_heading = "Input Options"
    )]
    pub preview_rows: usize,

    /// Maximum input size (e.g. 500K, 10M, 1G; 0 disables the check) [default: 10M]
    #[arg(long = "max-size", help_heading = "Input Options")]
    pub max_size: Option<String>,

    /// Accept files without a .csv extension
    #[arg(long = "any-extension", help_heading = "Input Options")]
    pub any_extension: bool,

    /// How to report rows the parser had trouble with once others were read
    #[arg(
        long = "on-error",
        value_enum,
        default_value = "ignore",
        help_heading = "Error Handling"
    )]
    pub on_error: SkippedRowReport,

    /// Increase log detail on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Error Handling")]
    pub verbose: u8,

    /// Output format for the blocks
    #[arg(
        short = 'F',
        long = "output-format",
        value_enum,
        default_value = "table",
        help_heading = "Output Options"
    )]
    pub output_format: OutputFormat,

    /// Write blocks to a file instead of stdout
    #[arg(short = 'o', long = "output-file", help_heading = "Output Options")]
    pub output_file: Option<String>,

    /// Print processing statistics
    #[arg(short = 's', long = "stats", help_heading = "Output Options")]
    pub stats: bool,

    /// Suppress progress and status lines
    #[arg(short = 'q', long = "quiet", help_heading = "Output Options")]
    pub quiet: bool,

    /// Do not draw the progress indicator
    #[arg(long = "no-progress", help_heading = "Display Options")]
    pub no_progress: bool,

    /// When to use colors
    #[arg(
        long = "color",
        value_enum,
        default_value = "auto",
        help_heading = "Display Options"
    )]
    pub color: ColorMode,

    /// Prompt for file paths instead of taking them from the command line
    #[arg(short = 'i', long = "interactive", help_heading = "Mode Options")]
    pub interactive: bool,

    /// Use a specific configuration file
    #[arg(long = "config-file", help_heading = "Configuration Options")]
    pub config_file: Option<String>,

    /// Do not read any configuration file
    #[arg(long = "ignore-config", help_heading = "Configuration Options")]
    pub ignore_config: bool,

    /// Use alias from configuration file
    #[arg(short = 'a', long = "alias", help_heading = "Configuration Options")]
    pub alias: Vec<String>,

    /// Show configuration file locations and contents, then exit
    #[arg(long = "show-config", help_heading = "Configuration Options")]
    pub show_config: bool,
}
