mod common;
use common::*;

use std::io::Write;

const RAGGED: &str = "serial,name\n1,a\n2\n3,c,extra\n4,d\n";

#[test]
fn test_field_count_mismatch_keeps_rows() {
    let (stdout, stderr, exit_code) = run_serialblocks_with_file(&["-F", "csv"], RAGGED);

    assert_eq!(exit_code, 0);
    assert_eq!(stdout, "start,end,count\n1,4,4\n");
    assert!(!stderr.contains("parse issue"));
}

#[test]
fn test_on_error_summary() {
    let (_stdout, stderr, exit_code) =
        run_serialblocks_with_file(&["-F", "csv", "--on-error", "summary"], RAGGED);

    assert_eq!(exit_code, 0);
    assert!(
        stderr.contains("2 parse issues ignored (2 with a field count different from the header)"),
        "stderr: {}",
        stderr
    );
    assert!(stderr.contains("first: record 3: expected 2 fields, found 1"));
}

#[test]
fn test_on_error_print() {
    let (_stdout, stderr, exit_code) =
        run_serialblocks_with_file(&["-F", "csv", "--on-error", "print"], RAGGED);

    assert_eq!(exit_code, 0);
    let printed = stderr
        .lines()
        .filter(|line| line.contains("parse issue ignored: record"))
        .count();
    assert_eq!(printed, 2);
    assert!(stderr.contains("2 parse issues ignored"));
}

#[test]
fn test_stats_count_issues() {
    let (_stdout, stderr, exit_code) = run_serialblocks_with_file(&["--stats"], RAGGED);

    assert_eq!(exit_code, 0);
    let line = stats_line(&stderr).expect("stats line missing");
    assert!(line.contains("2 parse issues"));
}

#[test]
fn test_corrupt_gzip_is_an_error() {
    let file = temp_file_with_suffix(".csv.gz", b"\x1f\x8b\x08\x00\x00\x00\x00\x00\x00\xffnot deflate");
    let (stdout, stderr, exit_code) = run_serialblocks_with_path(&[], file.path());

    assert_eq!(exit_code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("serialblocks: error:"));
}

#[test]
fn test_truncated_gzip_keeps_rows_read_so_far() {
    let mut body = String::from("serial\n");
    for i in 0..20_000 {
        body.push_str(&format!("{}\n", 100_000 + i));
    }
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(body.as_bytes()).unwrap();
    let mut data = encoder.finish().unwrap();
    data.truncate(data.len() / 2);
    let file = temp_file_with_suffix(".csv.gz", &data);

    let (stdout, stderr, exit_code) =
        run_serialblocks_with_path(&["-F", "json", "--on-error", "summary"], file.path());

    assert_eq!(exit_code, 0, "stderr: {}", stderr);
    let value = parse_json(&stdout);
    assert!(value["row_count"].as_u64().unwrap() > 0);
    // The cut may leave a partial last row, so look for the leading run anywhere
    let blocks = value["blocks"].as_array().unwrap();
    assert!(blocks.iter().any(|b| b["start"] == 100_000));
}
