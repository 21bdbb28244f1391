//! Header detection from a small positional preview.
//!
//! The heuristic only looks at the first cell of the first row: any ASCII
//! letter means "header". Numeric-looking headers (`001`) are therefore read
//! as data, and alphanumeric identifiers (`A123`) are read as a header.
//! Use `--header yes|no` when a file hits either case.

use crate::config::HeaderMode;

/// Outcome of header detection for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderDecision {
    pub has_header: bool,
    /// False when the decision came from `--header yes|no` instead of the preview
    pub detected: bool,
}

/// Returns true if the cell contains at least one ASCII letter
pub fn looks_like_header(first_cell: &str) -> bool {
    let value = first_cell.trim();
    if value.is_empty() {
        return false;
    }
    value.chars().any(|c| c.is_ascii_alphabetic())
}

/// Decide whether row 0 of the preview is a header
pub fn detect_header(preview: &[Vec<String>]) -> bool {
    preview
        .first()
        .and_then(|row| row.first())
        .is_some_and(|cell| looks_like_header(cell))
}

/// Apply the configured header mode to a preview
pub fn decide_header(mode: HeaderMode, preview: &[Vec<String>]) -> HeaderDecision {
    match mode {
        HeaderMode::Auto => HeaderDecision {
            has_header: detect_header(preview),
            detected: true,
        },
        HeaderMode::Yes => HeaderDecision {
            has_header: true,
            detected: false,
        },
        HeaderMode::No => HeaderDecision {
            has_header: false,
            detected: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_alphabetic_first_cell_is_header() {
        assert!(looks_like_header("PhoneNumber"));
        assert!(detect_header(&preview(&[&["PhoneNumber"], &["5551234567"]])));
    }

    #[test]
    fn test_numeric_first_cell_is_data() {
        assert!(!looks_like_header("5551234567"));
        assert!(!detect_header(&preview(&[&["5551234567", "Alice"]])));
    }

    #[test]
    fn test_empty_first_cell_is_data() {
        assert!(!looks_like_header(""));
        assert!(!looks_like_header("   \t"));
        assert!(!detect_header(&preview(&[&["", "name"]])));
    }

    #[test]
    fn test_empty_preview_is_data() {
        assert!(!detect_header(&[]));
        assert!(!detect_header(&[Vec::new()]));
    }

    #[test]
    fn test_known_misclassifications() {
        // numeric header reads as data
        assert!(!looks_like_header("001"));
        // alphanumeric identifier reads as header
        assert!(looks_like_header("A123"));
    }

    #[test]
    fn test_non_ascii_letters_do_not_count() {
        assert!(!looks_like_header("№ 123"));
        assert!(looks_like_header("Nº 123"));
    }

    #[test]
    fn test_header_mode_override() {
        let data = preview(&[&["123"]]);
        let forced = decide_header(HeaderMode::Yes, &data);
        assert!(forced.has_header);
        assert!(!forced.detected);

        let header = preview(&[&["id"]]);
        let forced = decide_header(HeaderMode::No, &header);
        assert!(!forced.has_header);

        let auto = decide_header(HeaderMode::Auto, &header);
        assert!(auto.has_header);
        assert!(auto.detected);
    }
}
