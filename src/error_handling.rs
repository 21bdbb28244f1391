use thiserror::Error;

use crate::config::SkippedRowReport;
use crate::model::{IssueKind, ParseIssue};

/// Terminal failures of the pipeline. Each one ends the file's lifecycle in `error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The selected path failed validation (extension, size, not a file)
    #[error("{0}")]
    InvalidInput(String),
    /// The preview parse failed without producing a single row
    #[error("{0}")]
    PreviewFailure(String),
    /// The full parse failed without producing a single row
    #[error("{0}")]
    ParseFailure(String),
}

impl PipelineError {
    pub fn message(&self) -> &str {
        match self {
            PipelineError::InvalidInput(msg)
            | PipelineError::PreviewFailure(msg)
            | PipelineError::ParseFailure(msg) => msg,
        }
    }
}

/// Collects tolerated parse problems for one file and reports them per the configured style
#[derive(Debug)]
pub struct IssueReporter {
    style: SkippedRowReport,
    field_count_issues: usize,
    read_issues: usize,
    /// First issue seen, quoted by the `summary` style
    first: Option<String>,
}

impl IssueReporter {
    pub fn new(style: SkippedRowReport) -> Self {
        Self {
            style,
            field_count_issues: 0,
            read_issues: 0,
            first: None,
        }
    }

    /// Record an issue; returns the line to print right away, if any
    pub fn report(&mut self, issue: &ParseIssue) -> Option<String> {
        match issue.kind {
            IssueKind::FieldCount { .. } => self.field_count_issues += 1,
            IssueKind::Read => self.read_issues += 1,
        }
        if self.first.is_none() {
            self.first = Some(issue.to_string());
        }

        match self.style {
            SkippedRowReport::Print => Some(format!("parse issue ignored: {}", issue)),
            SkippedRowReport::Ignore | SkippedRowReport::Summary => None,
        }
    }

    pub fn count(&self) -> usize {
        self.field_count_issues + self.read_issues
    }

    pub fn has_issues(&self) -> bool {
        self.count() > 0
    }

    /// Summary line for the end of a file, unless the style is `ignore`
    pub fn summary(&self) -> Option<String> {
        if !self.has_issues() || self.style == SkippedRowReport::Ignore {
            return None;
        }

        let mut parts = Vec::new();
        if self.field_count_issues > 0 {
            parts.push(format!(
                "{} with a field count different from the header",
                self.field_count_issues
            ));
        }
        if self.read_issues > 0 {
            parts.push(format!("{} read error", self.read_issues));
        }

        let mut line = format!(
            "{} parse issue{} ignored ({})",
            self.count(),
            if self.count() == 1 { "" } else { "s" },
            parts.join(", ")
        );
        if self.style == SkippedRowReport::Summary {
            if let Some(first) = &self.first {
                line.push_str(&format!("; first: {}", first));
            }
        }
        Some(line)
    }
}
