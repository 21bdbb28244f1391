use anyhow::Result;
use crossbeam_channel::Sender;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::thread;

// Cross-platform signal handling
#[cfg(unix)]
use signal_hook::{consts::SIGINT, consts::SIGPIPE, consts::SIGTERM, iterator::Signals};

// Status request signal on BSD-like systems (Ctrl-T)
#[cfg(all(
    unix,
    any(
        target_os = "macos",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    )
))]
use signal_hook::consts::SIGINFO;

#[cfg(unix)]
use signal_hook::consts::SIGUSR1;

#[cfg(windows)]
use signal_hook::{consts::SIGINT, flag};

/// Standard Unix exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidUsage = 2,
    SignalInt = 130,  // 128 + SIGINT (2)
    SignalPipe = 141, // 128 + SIGPIPE (13)
    SignalTerm = 143, // 128 + SIGTERM (15)
}

impl ExitCode {
    pub fn exit(self) -> ! {
        process::exit(self as i32)
    }
}

/// Set once a terminating signal arrived outside interactive mode
pub static TERMINATED_BY_SIGNAL: AtomicBool = AtomicBool::new(false);
static TERMINATION_CODE: AtomicI32 = AtomicI32::new(ExitCode::SignalInt as i32);

/// Exit code matching the signal that stopped processing
pub fn termination_exit_code() -> ExitCode {
    match TERMINATION_CODE.load(Ordering::Relaxed) {
        143 => ExitCode::SignalTerm,
        _ => ExitCode::SignalInt,
    }
}

fn mark_terminated(code: ExitCode) {
    TERMINATION_CODE.store(code as i32, Ordering::Relaxed);
    TERMINATED_BY_SIGNAL.store(true, Ordering::Relaxed);
}

/// Control messages sent by the signal handler to the orchestrator
#[derive(Debug, Clone)]
pub enum Ctrl {
    /// Cancel the active file; `immediate` is set on a repeated signal
    Shutdown { immediate: bool },
    PrintStats,
}

/// Signal handler feeding [`Ctrl`] messages into a channel
pub struct SignalHandler {
    _handle: thread::JoinHandle<()>,
}

impl SignalHandler {
    /// Start the signal thread.
    ///
    /// In `interactive` mode SIGINT only cancels the file being parsed; the
    /// prompt stays alive. Otherwise a second SIGINT/SIGTERM exits at once.
    pub fn new(ctrl_sender: Sender<Ctrl>, interactive: bool) -> Result<Self> {
        #[cfg(unix)]
        {
            #[allow(unused_mut)]
            let mut signals_to_handle = vec![SIGINT, SIGPIPE, SIGTERM, SIGUSR1];

            #[cfg(all(
                unix,
                any(
                    target_os = "macos",
                    target_os = "freebsd",
                    target_os = "openbsd",
                    target_os = "netbsd",
                    target_os = "dragonfly"
                )
            ))]
            signals_to_handle.push(SIGINFO);

            let mut signals = Signals::new(&signals_to_handle)?;

            let sender = ctrl_sender.clone();
            let handle = thread::spawn(move || {
                let mut shutdown_count = 0;
                for sig in signals.forever() {
                    match sig {
                        SIGINT if interactive => {
                            let _ = sender.send(Ctrl::Shutdown { immediate: false });
                        }
                        SIGINT => {
                            mark_terminated(ExitCode::SignalInt);
                            shutdown_count += 1;
                            let immediate = shutdown_count > 1;
                            let _ = sender.send(Ctrl::Shutdown { immediate });
                            if immediate {
                                ExitCode::SignalInt.exit();
                            }
                        }
                        SIGPIPE => {
                            // Broken pipe - exit quietly (normal for Unix pipes)
                            ExitCode::SignalPipe.exit();
                        }
                        SIGTERM => {
                            eprintln!(
                                "{}",
                                crate::config::format_error_message_auto(
                                    "Received SIGTERM, shutting down gracefully..."
                                )
                            );
                            mark_terminated(ExitCode::SignalTerm);
                            shutdown_count += 1;
                            let immediate = shutdown_count > 1;
                            let _ = sender.send(Ctrl::Shutdown { immediate });
                            if immediate || interactive {
                                ExitCode::SignalTerm.exit();
                            }
                        }
                        SIGUSR1 => {
                            let _ = sender.send(Ctrl::PrintStats);
                        }
                        #[cfg(all(
                            unix,
                            any(
                                target_os = "macos",
                                target_os = "freebsd",
                                target_os = "openbsd",
                                target_os = "netbsd",
                                target_os = "dragonfly"
                            )
                        ))]
                        SIGINFO => {
                            let _ = sender.send(Ctrl::PrintStats);
                        }
                        _ => {
                            eprintln!(
                                "{}",
                                crate::config::format_error_message_auto(&format!(
                                    "Received unexpected signal: {}",
                                    sig
                                ))
                            );
                        }
                    }
                }
            });

            Ok(SignalHandler { _handle: handle })
        }

        #[cfg(windows)]
        {
            let term_flag = std::sync::Arc::new(AtomicBool::new(false));
            flag::register(SIGINT, std::sync::Arc::clone(&term_flag))?;

            let sender = ctrl_sender.clone();
            let handle = thread::spawn(move || {
                let mut shutdown_count = 0;
                loop {
                    thread::sleep(std::time::Duration::from_millis(100));
                    if term_flag.swap(false, Ordering::Relaxed) {
                        if interactive {
                            let _ = sender.send(Ctrl::Shutdown { immediate: false });
                            continue;
                        }
                        mark_terminated(ExitCode::SignalInt);
                        shutdown_count += 1;
                        let immediate = shutdown_count > 1;
                        let _ = sender.send(Ctrl::Shutdown { immediate });
                        if immediate {
                            ExitCode::SignalInt.exit();
                        }
                    }
                }
            });

            Ok(SignalHandler { _handle: handle })
        }
    }

    /// Whether a terminating signal was received
    pub fn terminated() -> bool {
        TERMINATED_BY_SIGNAL.load(Ordering::Relaxed)
    }
}

/// Safe wrapper for writing to stdout that handles broken pipes and other I/O errors
pub struct SafeStdout {
    stdout: io::Stdout,
}

impl Default for SafeStdout {
    fn default() -> Self {
        Self::new()
    }
}

impl SafeStdout {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
        }
    }

    /// Write a line to stdout, handling broken pipes gracefully (cross-platform)
    pub fn writeln(&mut self, data: &str) -> Result<()> {
        match writeln!(self.stdout, "{}", data) {
            Ok(()) => Ok(()),
            Err(e) if is_broken_pipe(&e) => {
                // Broken pipe is normal in pipelines - exit quietly
                ExitCode::SignalPipe.exit();
            }
            Err(e) => Err(anyhow::anyhow!("Failed to write to stdout: {}", e)),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        match self.stdout.flush() {
            Ok(()) => Ok(()),
            Err(e) if is_broken_pipe(&e) => {
                ExitCode::SignalPipe.exit();
            }
            Err(e) => Err(anyhow::anyhow!("Failed to flush stdout: {}", e)),
        }
    }
}

/// Cross-platform broken pipe detection
fn is_broken_pipe(e: &io::Error) -> bool {
    #[cfg(unix)]
    {
        e.kind() == io::ErrorKind::BrokenPipe
    }
    #[cfg(windows)]
    {
        e.kind() == io::ErrorKind::BrokenPipe
            || e.raw_os_error() == Some(232) // ERROR_NO_DATA "The pipe is being closed"
            || e.raw_os_error() == Some(109) // ERROR_BROKEN_PIPE "The pipe has been ended"
    }
}

impl std::io::Write for SafeStdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdout.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

/// Safe wrapper for writing to stderr
pub struct SafeStderr {
    stderr: io::Stderr,
}

impl Default for SafeStderr {
    fn default() -> Self {
        Self::new()
    }
}

impl SafeStderr {
    pub fn new() -> Self {
        Self {
            stderr: io::stderr(),
        }
    }

    /// Write a line to stderr; a failing stderr ends the process
    pub fn writeln(&mut self, data: &str) -> Result<()> {
        match writeln!(self.stderr, "{}", data) {
            Ok(()) => Ok(()),
            Err(_) => ExitCode::GeneralError.exit(),
        }
    }

    /// Redraw the current terminal line (`\r` + clear) without a newline
    pub fn rewrite_line(&mut self, data: &str) -> Result<()> {
        match write!(self.stderr, "\r\x1b[2K{}", data).and_then(|_| self.stderr.flush()) {
            Ok(()) => Ok(()),
            Err(_) => ExitCode::GeneralError.exit(),
        }
    }
}

/// Create a helpful error message for file creation failures
fn create_helpful_error_message(path: &Path, error: &io::Error) -> String {
    let base_msg = format!("Cannot create output file '{}': {}", path.display(), error);

    let suggestion = match error.kind() {
        io::ErrorKind::PermissionDenied => {
            if path.parent().is_some_and(|p| !p.exists()) {
                "Suggestion: Parent directory does not exist, create it first"
            } else {
                "Suggestion: Check file permissions or choose a writable location"
            }
        }
        io::ErrorKind::NotFound => "Suggestion: Parent directory does not exist, create it first",
        _ if path.is_dir() => {
            "Suggestion: Path points to a directory, specify a filename instead"
        }
        _ => return base_msg,
    };

    format!("{}\n{}", base_msg, suggestion)
}

/// Output file for `--output-file`
pub struct SafeFileOut {
    file: File,
    path: String,
}

impl SafeFileOut {
    /// Create the file, truncating it if it exists
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match File::create(path_ref) {
            Ok(file) => Ok(Self {
                file,
                path: path_ref.to_string_lossy().to_string(),
            }),
            Err(e) => Err(anyhow::anyhow!(
                "{}",
                create_helpful_error_message(path_ref, &e)
            )),
        }
    }

    pub fn writeln(&mut self, data: &str) -> Result<()> {
        writeln!(self.file, "{}", data)
            .map_err(|e| anyhow::anyhow!("Output file write failed '{}': {}", self.path, e))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.file
            .flush()
            .map_err(|e| anyhow::anyhow!("Output file flush failed '{}': {}", self.path, e))
    }
}

impl std::io::Write for SafeFileOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
