use serde::Serialize;
use std::time::{Duration, Instant};

use crate::model::SerialBlock;

/// Statistics collected while one file is parsed and grouped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub rows_parsed: usize,
    pub rows_with_number: usize,
    pub rows_without_number: usize,
    pub blocks: usize,
    pub largest_block: u64,
    pub issues: usize,
    pub bytes_read: u64,
    #[serde(skip)]
    pub processing_time: Duration,
    #[serde(skip)]
    pub start_time: Option<Instant>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn finish_processing(&mut self) {
        if let Some(start) = self.start_time {
            self.processing_time = start.elapsed();
        }
    }

    /// Fill in the identifier and block figures once grouping is done
    pub fn record_grouping(&mut self, rows_with_number: usize, blocks: &[SerialBlock]) {
        self.rows_with_number = rows_with_number;
        self.rows_without_number = self.rows_parsed.saturating_sub(rows_with_number);
        self.blocks = blocks.len();
        self.largest_block = blocks.iter().map(|b| b.count).max().unwrap_or(0);
    }

    pub fn format_stats(&self) -> String {
        let mut output = format!(
            "Rows parsed: {} total, {} with identifier, {} without",
            self.rows_parsed, self.rows_with_number, self.rows_without_number
        );

        output.push_str(&format!("; Blocks: {}", self.blocks));
        if self.largest_block > 1 {
            output.push_str(&format!(" (largest {})", self.largest_block));
        }

        if self.issues > 0 {
            output.push_str(&format!(", {} parse issues", self.issues));
        }

        let processing_time_ms = self.processing_time.as_millis();
        output.push_str(&format!(" in {}ms", processing_time_ms));

        if processing_time_ms > 0 && self.rows_parsed > 0 {
            let rows_per_sec = (self.rows_parsed as f64 * 1000.0) / processing_time_ms as f64;
            output.push_str(&format!(" ({:.0} rows/s)", rows_per_sec));
        }

        output
    }
}
