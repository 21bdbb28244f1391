use crate::config::ColorMode;
use std::io::IsTerminal;

/// Check if stdin is connected to a TTY
pub fn is_stdin_tty() -> bool {
    std::io::stdin().is_terminal()
}

/// Check if stdout is connected to a TTY
pub fn is_stdout_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Check if stderr is connected to a TTY (progress is drawn there)
pub fn is_stderr_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Determine if stdout colors should be used based on CLI color mode and environment
pub fn should_use_colors_with_mode(color_mode: &ColorMode) -> bool {
    resolve(color_mode, is_stdout_tty())
}

/// Same decision for stderr messages
pub fn should_use_stderr_colors(color_mode: &ColorMode) -> bool {
    resolve(color_mode, is_stderr_tty())
}

fn resolve(color_mode: &ColorMode, is_tty: bool) -> bool {
    match color_mode {
        ColorMode::Never => false,
        // Even with Always, respect NO_COLOR (https://no-color.org/)
        ColorMode::Always => std::env::var_os("NO_COLOR").is_none(),
        ColorMode::Auto => {
            if !is_tty || std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            !matches!(std::env::var("TERM").as_deref(), Ok("dumb"))
        }
    }
}
