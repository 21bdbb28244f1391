// Interactive mode: a readline prompt that feeds file paths to one pipeline

use anyhow::Result;
use crossbeam_channel::Receiver;
use rustyline::completion::{Completer, FilenameCompleter};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};
use std::path::PathBuf;

use crate::orchestrator::{PipelineOrchestrator, Presenter, Settled};
use crate::platform::Ctrl;

/// Helper for interactive mode with file completion
#[derive(Default)]
struct SerialBlocksHelper {
    completer: FilenameCompleter,
}

impl Completer for SerialBlocksHelper {
    type Candidate = <FilenameCompleter as Completer>::Candidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for SerialBlocksHelper {
    type Hint = String;
}

impl Highlighter for SerialBlocksHelper {}

impl Validator for SerialBlocksHelper {}

impl Helper for SerialBlocksHelper {}

/// One line entered at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Paths to process in order; each supersedes the previous one
    Files(Vec<String>),
    Clear,
    Status,
    Help,
    Quit,
    Empty,
}

/// Parse a prompt line; paths may be quoted like in a shell
pub fn parse_command(line: &str) -> Result<Command> {
    let trimmed = line.trim();
    let command = match trimmed {
        "" => Command::Empty,
        ":quit" | ":q" | ":exit" => Command::Quit,
        ":clear" | ":c" => Command::Clear,
        ":status" | ":s" => Command::Status,
        ":help" | ":h" | "?" => Command::Help,
        other if other.starts_with(':') => {
            return Err(anyhow::anyhow!(
                "Unknown command '{}' (try :help)",
                other
            ))
        }
        other => {
            let words = shell_words::split(other)?;
            if words.is_empty() {
                Command::Empty
            } else {
                Command::Files(words)
            }
        }
    };
    Ok(command)
}

fn print_help() {
    let eof_key = if cfg!(windows) { "Ctrl-Z" } else { "Ctrl-D" };
    println!("Enter the path of a CSV file to group its identifiers into blocks.");
    println!();
    println!("  TAB          Complete files/directories");
    println!("  'my file.csv'  Use quotes when a path contains spaces");
    println!("  a.csv b.csv  Several paths are processed one after another");
    println!();
    println!("  :status      Show the pipeline state");
    println!("  :clear       Forget the current file and its blocks");
    println!("  Ctrl-C       Cancel the file being parsed");
    println!("  :quit        Exit (or :q, :exit, {})", eof_key);
}

/// Run the prompt until the user quits
pub fn run_interactive_mode<P: Presenter>(
    pipeline: &mut PipelineOrchestrator<P>,
    ctrl_rx: &Receiver<Ctrl>,
) -> Result<()> {
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(SerialBlocksHelper::default()));

    let history_path = get_history_path();
    if let Some(ref path) = history_path {
        // Missing history is fine on first run
        let _ = rl.load_history(path);
    }

    println!("serialblocks interactive mode - :quit to exit, :help for help\n");

    loop {
        match rl.readline("serialblocks> ") {
            Ok(line) => {
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}", crate::config::format_error_message_auto(&e.to_string()));
                        continue;
                    }
                };
                if command != Command::Empty {
                    let _ = rl.add_history_entry(line.trim());
                }

                match command {
                    Command::Empty => {}
                    Command::Quit => break,
                    Command::Help => print_help(),
                    Command::Clear => pipeline.clear(),
                    Command::Status => {
                        let state = pipeline.state();
                        println!("status: {} ({:.0}%)", state.status, state.progress);
                        if let Some(error) = &state.error {
                            println!("error: {}", error);
                        }
                    }
                    Command::Files(paths) => {
                        // Signals that arrived while the prompt was idle
                        while ctrl_rx.try_recv().is_ok() {}

                        for path in paths {
                            if pipeline.process(&path, Some(ctrl_rx)) == Settled::Cancelled {
                                eprintln!("serialblocks: cancelled");
                                break;
                            }
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!(
                    "{}",
                    crate::config::format_error_message_auto(&format!(
                        "Error reading line: {}",
                        err
                    ))
                );
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

/// History lives next to the user configuration
fn get_history_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("serialblocks");
    std::fs::create_dir_all(&path).ok()?;
    path.push("interactive_history.txt");
    Some(path)
}
