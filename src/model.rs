//! Data types shared by the parse, detection and grouping stages.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;

/// One parsed CSV record.
///
/// Keyed rows are produced when the file has a header row; the map keeps the
/// header's declaration order so the first entry is always the first column.
/// Positional rows are produced otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Keyed(IndexMap<String, String>),
    Positional(Vec<String>),
}

impl Row {
    /// Build a keyed row from header names and record values.
    ///
    /// Missing trailing values are left out of the map and extra values
    /// beyond the header are dropped. When a header name repeats, the first
    /// column keeps its value so the identifier column is never shadowed.
    pub fn keyed<'a, H, V>(headers: H, values: V) -> Self
    where
        H: IntoIterator<Item = &'a str>,
        V: IntoIterator<Item = String>,
    {
        let mut map = IndexMap::new();
        for (name, value) in headers.into_iter().zip(values) {
            map.entry(name.to_string()).or_insert(value);
        }
        Row::Keyed(map)
    }

    /// The candidate identifier cell: first declared column or index 0.
    pub fn first_cell(&self) -> Option<&str> {
        match self {
            Row::Keyed(map) => map.values().next().map(String::as_str),
            Row::Positional(values) => values.first().map(String::as_str),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Row::Keyed(map) => map.len(),
            Row::Positional(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<String>> for Row {
    fn from(values: Vec<String>) -> Self {
        Row::Positional(values)
    }
}

impl From<Vec<&str>> for Row {
    fn from(values: Vec<&str>) -> Self {
        Row::Positional(values.into_iter().map(str::to_string).collect())
    }
}

/// Everything the full parse of one file produced.
///
/// Immutable once built; `row_count` always equals `rows.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileResult {
    rows: Vec<Row>,
    has_header: bool,
    row_count: usize,
}

impl ParsedFileResult {
    pub fn new(rows: Vec<Row>, has_header: bool) -> Self {
        let row_count = rows.len();
        Self {
            rows,
            has_header,
            row_count,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Human readable status line, e.g. `3 rows parsed (header row detected).`
    pub fn summary_line(&self) -> String {
        format!(
            "{} row{} parsed{}.",
            self.row_count,
            if self.row_count == 1 { "" } else { "s" },
            if self.has_header {
                " (header row detected)"
            } else {
                ""
            }
        )
    }
}

/// A maximal run of consecutive identifiers.
///
/// Invariant: `end >= start` and `count == end - start + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SerialBlock {
    pub start: u64,
    pub end: u64,
    pub count: u64,
}

impl SerialBlock {
    /// A block holding a single identifier.
    pub fn single(value: u64) -> Self {
        Self {
            start: value,
            end: value,
            count: 1,
        }
    }

    /// Extend the block by one identifier (`end + 1`).
    pub(crate) fn extend(&mut self) {
        self.end += 1;
        self.count += 1;
    }

    /// Every identifier covered by the block, in ascending order.
    pub fn values(&self) -> RangeInclusive<u64> {
        self.start..=self.end
    }
}

impl fmt::Display for SerialBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{} ({})", self.start, self.end, self.count)
        }
    }
}

/// Kind of a tolerated parse problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// A keyed record had fewer or more fields than the header.
    FieldCount { expected: usize, found: usize },
    /// The underlying reader failed (I/O or decompression error).
    Read,
}

/// A problem reported by the parse capability while rows were being captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    pub kind: IssueKind,
    /// 1-based record number within the file, when known.
    pub record: Option<u64>,
    pub message: String,
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record {
            Some(record) => write!(f, "record {}: {}", record, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_row_first_cell_follows_header_order() {
        let row = Row::keyed(
            ["phone", "name"],
            vec!["555-0100".to_string(), "Alice".to_string()],
        );
        assert_eq!(row.first_cell(), Some("555-0100"));
    }

    #[test]
    fn test_keyed_row_duplicate_header_keeps_first_value() {
        let row = Row::keyed(
            ["id", "name", "id"],
            vec!["1".to_string(), "Bob".to_string(), "99".to_string()],
        );
        assert_eq!(row.first_cell(), Some("1"));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_keyed_row_short_record() {
        let row = Row::keyed(["id", "name", "city"], vec!["7".to_string()]);
        assert_eq!(row.len(), 1);
        assert_eq!(row.first_cell(), Some("7"));
    }

    #[test]
    fn test_positional_row_empty() {
        let row = Row::Positional(Vec::new());
        assert!(row.is_empty());
        assert_eq!(row.first_cell(), None);
    }

    #[test]
    fn test_parsed_result_row_count_matches_rows() {
        let result = ParsedFileResult::new(vec![Row::from(vec!["1"]), Row::from(vec!["2"])], false);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.rows().len(), result.row_count());
    }

    #[test]
    fn test_summary_line() {
        let one = ParsedFileResult::new(vec![Row::from(vec!["1"])], true);
        assert_eq!(one.summary_line(), "1 row parsed (header row detected).");

        let none = ParsedFileResult::new(Vec::new(), false);
        assert_eq!(none.summary_line(), "0 rows parsed.");
    }

    #[test]
    fn test_serial_block_values() {
        let block = SerialBlock {
            start: 5,
            end: 7,
            count: 3,
        };
        assert_eq!(block.values().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(block.to_string(), "5-7 (3)");
        assert_eq!(SerialBlock::single(9).to_string(), "9");
    }
}
