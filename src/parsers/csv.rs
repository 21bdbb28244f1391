use csv::{ByteRecord, Reader, ReaderBuilder, Trim};
use std::io::{BufRead, BufReader, Read};

use crate::model::{IssueKind, ParseIssue, Row};
use crate::readers::ByteCounter;

const UTF8_BOM: char = '\u{feff}';
const UTF8_BOM_BYTES: &[u8] = b"\xef\xbb\xbf";

/// Tokenizer settings shared by the preview and the streaming pass
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvOptions {
    fn reader<R: Read>(&self, input: R) -> Reader<R> {
        ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true) // Allow rows with different lengths
            .trim(Trim::None)
            .from_reader(input)
    }
}

/// Result of a bounded preview parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preview {
    /// Up to `max_rows` positional rows, no header interpretation
    pub rows: Vec<Vec<String>>,
    pub errors: Vec<String>,
}

impl Preview {
    /// A preview is fatal only when it errored and yielded nothing
    pub fn is_fatal(&self) -> bool {
        self.rows.is_empty() && !self.errors.is_empty()
    }
}

/// Read up to `max_rows` positional rows from the start of `input`
///
/// Blank lines are skipped by the tokenizer, except a leading one: it comes
/// back as a single empty cell so that header detection sees an empty first
/// cell, not whatever line follows it.
pub fn preview<R: Read>(input: R, options: CsvOptions, max_rows: usize) -> Preview {
    let mut input = BufReader::new(input);
    let mut preview = Preview::default();

    // A failed peek is reported again by the tokenizer below
    if let Ok(head) = input.fill_buf() {
        if max_rows > 0 && starts_with_blank_line(head) {
            preview.rows.push(vec![String::new()]);
        }
    }

    let mut reader = options.reader(input);
    let mut record = ByteRecord::new();

    while preview.rows.len() < max_rows {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {
                let first = preview.rows.is_empty();
                preview.rows.push(decode_record(&record, first));
            }
            Ok(false) => break,
            Err(e) => {
                preview.errors.push(e.to_string());
                // Only I/O failures leave the reader unusable
                if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                    break;
                }
            }
        }
    }

    preview
}

/// True when the first line of `head` is empty (after an optional BOM)
fn starts_with_blank_line(head: &[u8]) -> bool {
    let head = head.strip_prefix(UTF8_BOM_BYTES).unwrap_or(head);
    matches!(head.first(), Some(b'\n' | b'\r'))
}

/// One item produced by a [`RowStream`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    /// A data row, the byte cursor after it, and any problem found in it
    Row {
        row: Row,
        cursor: u64,
        issue: Option<ParseIssue>,
    },
    /// A record-less problem; after a read failure the stream ends
    Issue(ParseIssue),
}

/// Incremental, row-by-row parse of a whole file
///
/// Empty lines are skipped. With `has_header` the first record becomes the
/// column names and data rows come out keyed, otherwise positional.
pub struct RowStream<R: Read> {
    reader: Reader<R>,
    record: ByteRecord,
    has_header: bool,
    headers: Option<Vec<String>>,
    counter: ByteCounter,
    exact_cursor: bool,
    records_seen: u64,
    finished: bool,
}

impl<R: Read> RowStream<R> {
    /// `counter` tracks bytes pulled from the file. When `exact_cursor` is
    /// set (plain input) the reader's own record position is used instead,
    /// since it does not run ahead of the parse by a buffer's worth.
    pub fn new(
        input: R,
        options: CsvOptions,
        has_header: bool,
        counter: ByteCounter,
        exact_cursor: bool,
    ) -> Self {
        Self {
            reader: options.reader(input),
            record: ByteRecord::new(),
            has_header,
            headers: None,
            counter,
            exact_cursor,
            records_seen: 0,
            finished: false,
        }
    }

    /// Bytes consumed so far
    pub fn cursor(&self) -> u64 {
        if self.exact_cursor {
            self.reader.position().byte()
        } else {
            self.counter.get()
        }
    }

    fn build_row(&self) -> (Row, Option<ParseIssue>) {
        let first = self.records_seen == 1;
        let values = decode_record(&self.record, first);

        match &self.headers {
            Some(headers) => {
                let issue = (values.len() != headers.len()).then(|| ParseIssue {
                    kind: IssueKind::FieldCount {
                        expected: headers.len(),
                        found: values.len(),
                    },
                    record: Some(self.records_seen),
                    message: format!(
                        "expected {} fields, found {}",
                        headers.len(),
                        values.len()
                    ),
                });
                (
                    Row::keyed(headers.iter().map(String::as_str), values),
                    issue,
                )
            }
            None => (Row::Positional(values), None),
        }
    }
}

impl<R: Read> Iterator for RowStream<R> {
    type Item = StreamItem;

    fn next(&mut self) -> Option<StreamItem> {
        while !self.finished {
            match self.reader.read_byte_record(&mut self.record) {
                Ok(false) => self.finished = true,
                Ok(true) => {
                    self.records_seen += 1;
                    if is_empty_record(&self.record) {
                        continue;
                    }

                    if self.has_header && self.headers.is_none() {
                        let first = self.records_seen == 1;
                        self.headers = Some(decode_record(&self.record, first));
                        continue;
                    }

                    let (row, issue) = self.build_row();
                    return Some(StreamItem::Row {
                        row,
                        cursor: self.cursor(),
                        issue,
                    });
                }
                Err(e) => {
                    // Only I/O failures leave the reader unusable
                    if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                        self.finished = true;
                    }
                    return Some(StreamItem::Issue(ParseIssue {
                        kind: IssueKind::Read,
                        record: e.position().map(|p| p.record() + 1),
                        message: e.to_string(),
                    }));
                }
            }
        }
        None
    }
}

/// A line holding nothing but a single empty field
fn is_empty_record(record: &ByteRecord) -> bool {
    record.is_empty() || (record.len() == 1 && record[0].is_empty())
}

/// Decode fields lossily; strip a UTF-8 BOM from the very first field of the file
fn decode_record(record: &ByteRecord, first_of_file: bool) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let value = String::from_utf8_lossy(field);
            if first_of_file && i == 0 {
                value.trim_start_matches(UTF8_BOM).to_string()
            } else {
                value.into_owned()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    fn stream(input: &str, has_header: bool) -> RowStream<Cursor<Vec<u8>>> {
        RowStream::new(
            Cursor::new(input.as_bytes().to_vec()),
            CsvOptions::default(),
            has_header,
            ByteCounter::new(),
            true,
        )
    }

    fn rows(input: &str, has_header: bool) -> Vec<Row> {
        stream(input, has_header)
            .filter_map(|item| match item {
                StreamItem::Row { row, .. } => Some(row),
                StreamItem::Issue(_) => None,
            })
            .collect()
    }

    /// Yields `data`, then fails every later read
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt deflate stream")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_preview_limits_rows() {
        let result = preview(Cursor::new("id\n1\n2\n3\n"), CsvOptions::default(), 2);
        assert_eq!(result.rows, vec![vec!["id".to_string()], vec!["1".to_string()]]);
        assert!(result.errors.is_empty());
        assert!(!result.is_fatal());
    }

    #[test]
    fn test_preview_keeps_leading_blank_line() {
        let result = preview(
            Cursor::new("\nPhoneNumber\n5551234567\n"),
            CsvOptions::default(),
            2,
        );
        assert_eq!(
            result.rows,
            vec![vec![String::new()], vec!["PhoneNumber".to_string()]]
        );

        let crlf = preview(Cursor::new("\u{feff}\r\nid\n1\n"), CsvOptions::default(), 1);
        assert_eq!(crlf.rows, vec![vec![String::new()]]);
    }

    #[test]
    fn test_preview_skips_later_blank_lines() {
        let result = preview(Cursor::new("id\n\n1\n"), CsvOptions::default(), 2);
        assert_eq!(result.rows, vec![vec!["id".to_string()], vec!["1".to_string()]]);
    }

    #[test]
    fn test_preview_of_empty_input() {
        let result = preview(Cursor::new(""), CsvOptions::default(), 2);
        assert!(result.rows.is_empty());
        assert!(!result.is_fatal());
    }

    #[test]
    fn test_preview_failure_without_rows_is_fatal() {
        let reader = FailingReader {
            data: Cursor::new(Vec::new()),
        };
        let result = preview(reader, CsvOptions::default(), 2);
        assert!(result.is_fatal());
        assert!(result.errors[0].contains("corrupt deflate stream"));
    }

    #[test]
    fn test_preview_failure_after_rows_is_tolerated() {
        let reader = FailingReader {
            data: Cursor::new(b"123\n".to_vec()),
        };
        let result = preview(reader, CsvOptions::default(), 2);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(!result.is_fatal());
    }

    #[test]
    fn test_positional_rows_without_header() {
        let parsed = rows("1,a\n2,b\n", false);
        assert_eq!(
            parsed,
            vec![Row::from(vec!["1", "a"]), Row::from(vec!["2", "b"])]
        );
    }

    #[test]
    fn test_keyed_rows_with_header() {
        let parsed = rows("phone,name\n555-0100,Alice\n", true);
        assert_eq!(parsed.len(), 1);
        match &parsed[0] {
            Row::Keyed(map) => {
                assert_eq!(map.get("phone").map(String::as_str), Some("555-0100"));
                assert_eq!(map.get("name").map(String::as_str), Some("Alice"));
            }
            other => panic!("expected keyed row, got {:?}", other),
        }
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        let mut s = stream("id,name\n", true);
        assert!(s.next().is_none());
        assert_eq!(s.cursor(), 8);
    }

    #[test]
    fn test_empty_lines_are_skipped() {
        let parsed = rows("1\n\n2\n\r\n\n3\n", false);
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_empty_lines_before_header_are_skipped() {
        let parsed = rows("\n\nid\n7\n", true);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].first_cell(), Some("7"));
    }

    #[test]
    fn test_quoted_fields() {
        let parsed = rows("\"12,345\",\"Smith, John\"\n", false);
        assert_eq!(parsed[0], Row::from(vec!["12,345", "Smith, John"]));
    }

    #[test]
    fn test_bom_is_stripped_from_first_field() {
        let parsed = rows("\u{feff}id\n1\n", true);
        assert_eq!(parsed.len(), 1);
        match &parsed[0] {
            Row::Keyed(map) => assert!(map.contains_key("id")),
            other => panic!("expected keyed row, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let input = Cursor::new(b"12\xff3\n".to_vec());
        let mut s = RowStream::new(input, CsvOptions::default(), false, ByteCounter::new(), true);
        match s.next() {
            Some(StreamItem::Row { row, .. }) => assert_eq!(row.first_cell(), Some("12\u{fffd}3")),
            other => panic!("expected row, got {:?}", other),
        }
    }

    #[test]
    fn test_field_count_mismatch_is_reported_with_row() {
        let items: Vec<StreamItem> = stream("id,name\n1,a,extra\n2\n", true).collect();
        assert_eq!(items.len(), 2);
        match &items[0] {
            StreamItem::Row { row, issue, .. } => {
                assert_eq!(row.first_cell(), Some("1"));
                let issue = issue.as_ref().expect("issue for long record");
                assert_eq!(
                    issue.kind,
                    IssueKind::FieldCount {
                        expected: 2,
                        found: 3
                    }
                );
                assert_eq!(issue.record, Some(2));
            }
            other => panic!("expected row, got {:?}", other),
        }
        match &items[1] {
            StreamItem::Row { issue, .. } => assert!(issue.is_some()),
            other => panic!("expected row, got {:?}", other),
        }
    }

    #[test]
    fn test_cursor_is_monotonic_and_reaches_end() {
        let input = "1\n2\n3\n";
        let cursors: Vec<u64> = stream(input, false)
            .filter_map(|item| match item {
                StreamItem::Row { cursor, .. } => Some(cursor),
                StreamItem::Issue(_) => None,
            })
            .collect();
        assert_eq!(cursors, vec![2, 4, 6]);
    }

    #[test]
    fn test_read_failure_ends_stream() {
        let reader = FailingReader {
            data: Cursor::new(b"1\n2\n".to_vec()),
        };
        let items: Vec<StreamItem> =
            RowStream::new(reader, CsvOptions::default(), false, ByteCounter::new(), true)
                .collect();
        assert!(matches!(items.last(), Some(StreamItem::Issue(issue)) if issue.kind == IssueKind::Read));
        let row_count = items
            .iter()
            .filter(|item| matches!(item, StreamItem::Row { .. }))
            .count();
        assert!(row_count <= 2);
    }

    #[test]
    fn test_tab_delimiter() {
        let input = Cursor::new(b"id\tname\n9\tZed\n".to_vec());
        let options = CsvOptions { delimiter: b'\t' };
        let parsed: Vec<StreamItem> =
            RowStream::new(input, options, true, ByteCounter::new(), true).collect();
        match &parsed[0] {
            StreamItem::Row { row, .. } => assert_eq!(row.first_cell(), Some("9")),
            other => panic!("expected row, got {:?}", other),
        }
    }
}
