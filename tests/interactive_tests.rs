mod common;
use common::*;

use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Drive `serialblocks -i` with piped prompt input
fn run_interactive(script: &str) -> (String, String, i32) {
    let home = TempDir::new().unwrap();
    let mut child = Command::new(binary_path())
        .args(["--ignore-config", "-i", "-F", "csv"])
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start serialblocks");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();
    let output = child.wait_with_output().expect("Failed to read output");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_interactive_processes_entered_paths() {
    let first = temp_csv("1\n2\n");
    let second = temp_csv("8\n9\n10\n");
    let script = format!(
        "{}\n{}\n:status\n:quit\n",
        first.path().display(),
        second.path().display()
    );

    let (stdout, _stderr, exit_code) = run_interactive(&script);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("start,end,count\n1,2,2\n"));
    assert!(stdout.contains("start,end,count\n8,10,3\n"));
    assert!(stdout.contains("status: success (100%)"));
}

#[test]
fn test_interactive_reports_errors_and_continues() {
    let good = temp_csv("4\n");
    let script = format!(":bogus\nnot-a-csv.txt\n{}\n", good.path().display());

    let (stdout, stderr, exit_code) = run_interactive(&script);

    assert_eq!(exit_code, 0);
    assert!(stderr.contains("Unknown command ':bogus'"));
    assert!(stderr.contains("Please select a CSV file."));
    assert!(stdout.contains("4,4,1"));
}

#[test]
fn test_interactive_clear_resets_status() {
    let good = temp_csv("4\n");
    let script = format!("{}\n:clear\n:status\n", good.path().display());

    let (stdout, _stderr, exit_code) = run_interactive(&script);

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("status: idle (0%)"));
}
