//! The parse worker for one file: preview, header decision, full parse.
//!
//! A driver never touches pipeline state. It reports through a message sink,
//! normally a channel tagged with its operation id, and stops between rows as
//! soon as its cancel token is set.

use crossbeam_channel::Sender;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace};

use crate::config::{HeaderMode, DEFAULT_PREVIEW_ROWS};
use crate::detection::{decide_header, HeaderDecision};
use crate::input::FileInput;
use crate::model::{ParseIssue, ParsedFileResult};
use crate::parsers::{self, CsvOptions, Preview, RowStream, StreamItem};
use crate::state::{parsing_progress, OperationId, PARSING_FLOOR};
use crate::stats::ProcessingStats;

/// Shared stop flag for one operation
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Parse settings that stay fixed across files
#[derive(Debug, Clone, Copy)]
pub struct DriverSettings {
    pub csv: CsvOptions,
    pub header: HeaderMode,
    pub preview_rows: usize,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            csv: CsvOptions::default(),
            header: HeaderMode::Auto,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

/// What a driver reports back, in order
#[derive(Debug, Clone, PartialEq)]
pub enum DriverMessage {
    Preview(HeaderDecision),
    PreviewFailed(String),
    /// Sent whenever the whole-percent progress value grows
    Progress { cursor: u64, total: u64 },
    /// A tolerated problem; only sent once at least one row was captured
    Issue(ParseIssue),
    Completed {
        result: ParsedFileResult,
        stats: ProcessingStats,
    },
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOutcome {
    Completed,
    Failed,
    /// Cancel token set, or nobody is listening any more
    Cancelled,
}

pub struct ParseDriver {
    input: FileInput,
    settings: DriverSettings,
    cancel: CancelToken,
}

impl ParseDriver {
    pub fn new(input: FileInput, settings: DriverSettings, cancel: CancelToken) -> Self {
        Self {
            input,
            settings,
            cancel,
        }
    }

    /// Run on a named worker thread, sending `(op, message)` pairs to `tx`
    pub fn spawn(
        self,
        op: OperationId,
        tx: Sender<(OperationId, DriverMessage)>,
    ) -> io::Result<thread::JoinHandle<DriverOutcome>> {
        thread::Builder::new()
            .name(format!("parse-{}", op))
            .spawn(move || {
                let outcome = self.run(|message| tx.send((op, message)).is_ok());
                trace!(op, ?outcome, "driver finished");
                outcome
            })
    }

    /// Run to completion on the current thread
    ///
    /// `emit` returns false once the receiving side is gone, which is
    /// treated the same as cancellation.
    pub fn run<F>(&self, mut emit: F) -> DriverOutcome
    where
        F: FnMut(DriverMessage) -> bool,
    {
        let name = self.input.name();
        let total = self.input.size();
        let mut stats = ProcessingStats::new();

        let preview = self.read_preview();
        if self.cancel.is_cancelled() {
            return DriverOutcome::Cancelled;
        }
        if preview.is_fatal() {
            let message = preview.errors.join("; ");
            debug!(file = name, error = %message, "preview failed");
            emit(DriverMessage::PreviewFailed(message));
            return DriverOutcome::Failed;
        }
        for error in &preview.errors {
            debug!(file = name, error = %error, "preview error tolerated");
        }

        let decision = decide_header(self.settings.header, &preview.rows);
        debug!(
            file = name,
            has_header = decision.has_header,
            detected = decision.detected,
            "header decided"
        );
        if !emit(DriverMessage::Preview(decision)) {
            return DriverOutcome::Cancelled;
        }

        let (reader, counter) = match self.input.reader() {
            Ok(pair) => pair,
            Err(e) => {
                emit(DriverMessage::Failed(format!("{:#}", e)));
                return DriverOutcome::Failed;
            }
        };
        let exact_cursor = !reader.is_compressed();
        let stream = RowStream::new(
            reader,
            self.settings.csv,
            decision.has_header,
            counter.clone(),
            exact_cursor,
        );

        let mut rows = Vec::new();
        // Problems seen before the first row decide between failure and tolerance
        let mut pending: Vec<ParseIssue> = Vec::new();
        let mut last_percent = PARSING_FLOOR as u64;

        for item in stream {
            if self.cancel.is_cancelled() {
                debug!(file = name, rows = rows.len(), "parse cancelled");
                return DriverOutcome::Cancelled;
            }

            match item {
                StreamItem::Row { row, cursor, issue } => {
                    rows.push(row);
                    for held in pending.drain(..) {
                        if !emit(DriverMessage::Issue(held)) {
                            return DriverOutcome::Cancelled;
                        }
                    }
                    if let Some(issue) = issue {
                        stats.issues += 1;
                        if !emit(DriverMessage::Issue(issue)) {
                            return DriverOutcome::Cancelled;
                        }
                    }

                    let percent = parsing_progress(cursor, total) as u64;
                    if percent > last_percent {
                        last_percent = percent;
                        if !emit(DriverMessage::Progress { cursor, total }) {
                            return DriverOutcome::Cancelled;
                        }
                    }
                }
                StreamItem::Issue(issue) => {
                    stats.issues += 1;
                    debug!(file = name, issue = %issue, "parse issue");
                    if rows.is_empty() {
                        pending.push(issue);
                    } else if !emit(DriverMessage::Issue(issue)) {
                        return DriverOutcome::Cancelled;
                    }
                }
            }
        }

        if self.cancel.is_cancelled() {
            return DriverOutcome::Cancelled;
        }

        if rows.is_empty() {
            if let Some(first) = pending.first() {
                debug!(file = name, error = %first, "parse failed without rows");
                emit(DriverMessage::Failed(first.message.clone()));
                return DriverOutcome::Failed;
            }
        }

        stats.rows_parsed = rows.len();
        stats.bytes_read = counter.get();
        stats.finish_processing();
        debug!(
            file = name,
            rows = stats.rows_parsed,
            bytes = stats.bytes_read,
            "parse completed"
        );

        let result = ParsedFileResult::new(rows, decision.has_header);
        if emit(DriverMessage::Completed { result, stats }) {
            DriverOutcome::Completed
        } else {
            DriverOutcome::Cancelled
        }
    }

    fn read_preview(&self) -> Preview {
        match self.input.reader() {
            Ok((reader, _)) => {
                parsers::preview(reader, self.settings.csv, self.settings.preview_rows)
            }
            Err(e) => Preview {
                rows: Vec::new(),
                errors: vec![format!("{:#}", e)],
            },
        }
    }
}
