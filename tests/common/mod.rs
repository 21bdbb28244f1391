// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::{Builder, NamedTempFile};

/// Path of the built binary; tests run it directly to avoid cargo output
pub fn binary_path() -> &'static str {
    if cfg!(debug_assertions) {
        "./target/debug/serialblocks"
    } else {
        "./target/release/serialblocks"
    }
}

/// Run serialblocks exactly with `args`; configuration files are honored
pub fn run_serialblocks_raw(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(binary_path())
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute serialblocks");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

/// Run serialblocks with `args`, ignoring any user or project configuration
pub fn run_serialblocks(args: &[&str]) -> (String, String, i32) {
    let mut full_args = vec!["--ignore-config"];
    full_args.extend_from_slice(args);
    run_serialblocks_raw(&full_args)
}

/// Temporary file with the given suffix and contents
pub fn temp_file_with_suffix(suffix: &str, content: &[u8]) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content).expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Temporary `.csv` file with the given contents
pub fn temp_csv(content: &str) -> NamedTempFile {
    temp_file_with_suffix(".csv", content.as_bytes())
}

/// Run serialblocks on a temporary `.csv` file appended after `args`
pub fn run_serialblocks_with_file(args: &[&str], file_content: &str) -> (String, String, i32) {
    let file = temp_csv(file_content);
    run_serialblocks_with_path(args, file.path())
}

/// Run serialblocks on an existing path appended after `args`
pub fn run_serialblocks_with_path(args: &[&str], path: &Path) -> (String, String, i32) {
    let path = path.to_str().expect("temp path is not UTF-8");
    let mut full_args = args.to_vec();
    full_args.push(path);
    run_serialblocks(&full_args)
}

/// Parse stdout as a JSON document
pub fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout.trim()).expect("stdout is not valid JSON")
}

/// Find the `Rows parsed:` stats line on stderr
pub fn stats_line(stderr: &str) -> Option<&str> {
    stderr.lines().find(|line| line.contains("Rows parsed:"))
}
