use anyhow::Result;
use clap::{CommandFactory, Parser};
use crossbeam_channel::unbounded;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use serialblocks::cli::Cli;
use serialblocks::config::{format_error_message_auto, OutputFormat, SerialConfig};
use serialblocks::config_file::ConfigFile;
use serialblocks::driver::DriverSettings;
use serialblocks::error_handling::{IssueReporter, PipelineError};
use serialblocks::formatters::{create_formatter, FormatOptions, Formatter};
use serialblocks::interactive;
use serialblocks::model::ParseIssue;
use serialblocks::orchestrator::{PipelineOrchestrator, PipelineOutput, Presenter, Settled};
use serialblocks::parsers::CsvOptions;
use serialblocks::platform::{
    termination_exit_code, Ctrl, ExitCode, SafeFileOut, SafeStderr, SafeStdout, SignalHandler,
};
use serialblocks::state::{OperationId, PipelineState, PipelineStatus};
use serialblocks::tty;

/// Environment variable overriding the `-v` log level
const LOG_ENV: &str = "SERIALBLOCKS_LOG";

/// Where formatted blocks go
enum Sink {
    Stdout(SafeStdout),
    File(SafeFileOut),
}

impl Sink {
    fn open(output_file: Option<&str>) -> Result<Self> {
        Ok(match output_file {
            Some(path) => Sink::File(SafeFileOut::new(path)?),
            None => Sink::Stdout(SafeStdout::new()),
        })
    }

    fn writeln(&mut self, data: &str) -> Result<()> {
        match self {
            Sink::Stdout(out) => out.writeln(data),
            Sink::File(out) => out.writeln(data),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match self {
            Sink::Stdout(out) => out.flush(),
            Sink::File(out) => out.flush(),
        }
    }
}

/// Presenter for the command line: progress on stderr, blocks on stdout
struct TerminalPresenter {
    config: SerialConfig,
    formatter: Box<dyn Formatter>,
    sink: Sink,
    stderr: SafeStderr,
    issues: IssueReporter,
    current_file: String,
    draw_progress: bool,
    progress_visible: bool,
    last_progress: Option<String>,
    failures: usize,
}

impl TerminalPresenter {
    fn new(config: SerialConfig, show_file: bool) -> Result<Self> {
        let options = FormatOptions {
            use_colors: config.use_colors(),
            show_file,
            show_summary: !config.output.quiet,
            include_stats: config.output.stats,
        };
        let formatter = create_formatter(config.output.format, options);
        let sink = Sink::open(config.output.output_file.as_deref())?;
        let draw_progress = config.output.progress && tty::is_stderr_tty();

        Ok(Self {
            issues: IssueReporter::new(config.processing.on_error),
            config,
            formatter,
            sink,
            stderr: SafeStderr::new(),
            current_file: String::new(),
            draw_progress,
            progress_visible: false,
            last_progress: None,
            failures: 0,
        })
    }

    fn failures(&self) -> usize {
        self.failures
    }

    fn clear_progress(&mut self) {
        if self.progress_visible {
            let _ = self.stderr.rewrite_line("");
            self.progress_visible = false;
        }
        self.last_progress = None;
    }

    fn draw(&mut self, line: String) {
        if self.last_progress.as_deref() == Some(line.as_str()) {
            return;
        }
        let _ = self.stderr.rewrite_line(&line);
        self.progress_visible = true;
        self.last_progress = Some(line);
    }

    fn info(&mut self, message: &str) {
        self.clear_progress();
        let line = self.config.format_info_message(message);
        let _ = self.stderr.writeln(&line);
    }

    fn error(&mut self, message: &str) {
        self.clear_progress();
        let line = self.config.format_error_message(message);
        let _ = self.stderr.writeln(&line);
    }

    fn write_output(&mut self, output: &PipelineOutput) -> Result<()> {
        let text = self.formatter.format(output)?;
        if !text.is_empty() {
            self.sink.writeln(&text)?;
        }
        self.sink.flush()
    }

    fn finish(&mut self) {
        self.clear_progress();
        if let Err(e) = self.sink.flush() {
            self.error(&e.to_string());
            self.failures += 1;
        }
    }
}

impl Presenter for TerminalPresenter {
    fn on_file_selected(&mut self, _op: OperationId, path: &Path) {
        self.current_file = path.display().to_string();
        self.issues = IssueReporter::new(self.config.processing.on_error);
    }

    fn on_state(&mut self, state: &PipelineState) {
        if !self.draw_progress {
            return;
        }
        match state.status {
            PipelineStatus::Detecting => self.draw("Checking for headers…".to_string()),
            PipelineStatus::Parsing => {
                self.draw(format!("Processing file… {:.0}%", state.progress))
            }
            PipelineStatus::Idle | PipelineStatus::Success | PipelineStatus::Error => {
                self.clear_progress()
            }
        }
    }

    fn on_issue(&mut self, issue: &ParseIssue) {
        if let Some(line) = self.issues.report(issue) {
            self.info(&line);
        }
    }

    fn on_result(&mut self, output: &PipelineOutput) {
        self.clear_progress();
        if let Err(e) = self.write_output(output) {
            self.error(&format!("{:#}", e));
            self.failures += 1;
            return;
        }

        if let Some(summary) = self.issues.summary() {
            self.info(&summary);
        }
        // JSON embeds the stats in the document itself
        if self.config.output.stats && self.config.output.format != OutputFormat::Json {
            let stats = output.stats.format_stats();
            self.info(&stats);
        }
    }

    fn on_error(&mut self, error: &PipelineError) {
        let message = format!("{}: {}", self.current_file, error);
        self.error(&message);
        self.failures += 1;
    }

    fn on_cleared(&mut self) {
        self.clear_progress();
    }

    fn on_status_request(&mut self, state: &PipelineState) {
        let message = format!(
            "{} {} ({:.0}%)",
            self.current_file, state.status, state.progress
        );
        self.info(&message);
    }
}

fn main() {
    let mut stderr = SafeStderr::new();

    let cli = process_args_with_config(&mut stderr);

    let config = match SerialConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            stderr
                .writeln(&format_error_message_auto(&e.to_string()))
                .unwrap_or(());
            ExitCode::InvalidUsage.exit();
        }
    };

    init_tracing(config.processing.verbose);

    let interactive = config.processing.interactive;
    if config.input.files.is_empty() && !interactive {
        if tty::is_stdin_tty() {
            println!("{}", Cli::command().render_usage());
            println!("Group the identifiers of a CSV file into runs of consecutive numbers");
            println!("Try 'serialblocks --help' for more information.");
            ExitCode::Success.exit();
        }
        stderr
            .writeln(&config.format_error_message(
                "No input files given (reading CSV from stdin is not supported)",
            ))
            .unwrap_or(());
        ExitCode::InvalidUsage.exit();
    }

    // Signal handler feeds Ctrl messages to whichever loop is waiting
    let (ctrl_tx, ctrl_rx) = unbounded::<Ctrl>();
    let _signal_handler = match SignalHandler::new(ctrl_tx, interactive) {
        Ok(handler) => handler,
        Err(e) => {
            stderr
                .writeln(&config.format_error_message(&format!(
                    "Failed to initialize signal handling: {}",
                    e
                )))
                .unwrap_or(());
            ExitCode::GeneralError.exit();
        }
    };

    let settings = DriverSettings {
        csv: CsvOptions {
            delimiter: config.input.delimiter,
        },
        header: config.input.header,
        preview_rows: config.input.preview_rows,
    };
    let limits = config.input_limits();
    let show_file = config.input.files.len() > 1;

    let presenter = match TerminalPresenter::new(config.clone(), show_file) {
        Ok(presenter) => presenter,
        Err(e) => {
            stderr
                .writeln(&config.format_error_message(&format!("{:#}", e)))
                .unwrap_or(());
            ExitCode::GeneralError.exit();
        }
    };
    let mut pipeline = PipelineOrchestrator::new(settings, limits, presenter);

    if interactive {
        // Command-line files are processed first, then the prompt takes over
        for file in &config.input.files {
            if pipeline.process(file, Some(&ctrl_rx)) == Settled::Cancelled {
                break;
            }
        }
        if let Err(e) = interactive::run_interactive_mode(&mut pipeline, &ctrl_rx) {
            stderr
                .writeln(&config.format_error_message(&format!("{:#}", e)))
                .unwrap_or(());
            ExitCode::GeneralError.exit();
        }
        pipeline.presenter_mut().finish();
        ExitCode::Success.exit();
    }

    for file in &config.input.files {
        if pipeline.process(file, Some(&ctrl_rx)) == Settled::Cancelled {
            pipeline.presenter_mut().finish();
            stderr
                .writeln(&config.format_info_message("cancelled"))
                .unwrap_or(());
            termination_exit_code().exit();
        }
    }

    pipeline.presenter_mut().finish();
    if SignalHandler::terminated() {
        termination_exit_code().exit();
    }
    if pipeline.presenter().failures() > 0 {
        ExitCode::GeneralError.exit();
    }
    ExitCode::Success.exit();
}

/// Route diagnostics to stderr; `SERIALBLOCKS_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("serialblocks={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Extract --config-file argument from raw args
fn extract_config_file_arg(args: &[String]) -> Option<String> {
    args.iter().enumerate().find_map(|(i, arg)| {
        if arg == "--config-file" {
            args.get(i + 1).cloned()
        } else {
            arg.strip_prefix("--config-file=").map(str::to_string)
        }
    })
}

/// Process command line arguments with config file support
fn process_args_with_config(stderr: &mut SafeStderr) -> Cli {
    let raw_args: Vec<String> = std::env::args().collect();

    // --show-config runs before any file is loaded so a broken file can be inspected
    if raw_args.iter().any(|arg| arg == "--show-config") {
        print!("{}", ConfigFile::describe());
        ExitCode::Success.exit();
    }

    let processed_args = if raw_args.iter().any(|arg| arg == "--ignore-config") {
        raw_args
    } else {
        let config_file_path = extract_config_file_arg(&raw_args);
        match ConfigFile::load_with_custom_path(config_file_path.as_deref()) {
            Ok(config_file) => match config_file.process_args(raw_args) {
                Ok(processed) => processed,
                Err(e) => {
                    stderr
                        .writeln(&format_error_message_auto(&format!("Config error: {}", e)))
                        .unwrap_or(());
                    ExitCode::InvalidUsage.exit();
                }
            },
            Err(e) => {
                stderr
                    .writeln(&format_error_message_auto(&format!(
                        "Config file error: {:#}",
                        e
                    )))
                    .unwrap_or(());
                ExitCode::GeneralError.exit();
            }
        }
    };

    // clap prints its own usage errors and exits with status 2
    Cli::parse_from(processed_args)
}
