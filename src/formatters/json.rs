use anyhow::{Context, Result};
use serde::Serialize;

use super::{FormatOptions, Formatter};
use crate::model::SerialBlock;
use crate::orchestrator::PipelineOutput;
use crate::stats::ProcessingStats;

#[derive(Serialize)]
struct JsonReport<'a> {
    file: &'a str,
    row_count: usize,
    has_header: bool,
    blocks: &'a [SerialBlock],
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a ProcessingStats>,
}

/// One JSON object per file, on a single line
pub struct JsonFormatter {
    options: FormatOptions,
}

impl JsonFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, output: &PipelineOutput) -> Result<String> {
        let report = JsonReport {
            file: &output.file,
            row_count: output.result.row_count(),
            has_header: output.result.has_header(),
            blocks: &output.blocks,
            stats: self.options.include_stats.then_some(&output.stats),
        };
        serde_json::to_string(&report).context("Failed to serialize blocks as JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::test_support::{output, sample};

    #[test]
    fn test_json_report_field_order() {
        let text = JsonFormatter::new(FormatOptions::default())
            .format(&sample())
            .unwrap();
        assert_eq!(
            text,
            r#"{"file":"serials.csv","row_count":6,"has_header":true,"blocks":[{"start":1,"end":3,"count":3},{"start":5,"end":6,"count":2},{"start":9,"end":9,"count":1}]}"#
        );
    }

    #[test]
    fn test_json_empty_blocks() {
        let text = JsonFormatter::new(FormatOptions::default())
            .format(&output(Vec::new(), false))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["row_count"], 0);
        assert_eq!(value["blocks"], serde_json::json!([]));
        assert!(value.get("stats").is_none());
    }

    #[test]
    fn test_json_with_stats() {
        let options = FormatOptions {
            include_stats: true,
            ..Default::default()
        };
        let text = JsonFormatter::new(options).format(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["stats"]["rows_parsed"], 6);
        assert_eq!(value["stats"]["blocks"], 3);
    }
}
