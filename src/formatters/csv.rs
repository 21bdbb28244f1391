use anyhow::{anyhow, Context, Result};

use super::{FormatOptions, Formatter};
use crate::orchestrator::PipelineOutput;

/// `start,end,count` records, prefixed by a `file` column when several files are shown
pub struct CsvFormatter {
    options: FormatOptions,
}

impl CsvFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }
}

impl Formatter for CsvFormatter {
    fn format(&self, output: &PipelineOutput) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        let mut header = vec!["start", "end", "count"];
        if self.options.show_file {
            header.insert(0, "file");
        }
        writer.write_record(&header)?;

        for block in &output.blocks {
            let mut record = vec![
                block.start.to_string(),
                block.end.to_string(),
                block.count.to_string(),
            ];
            if self.options.show_file {
                record.insert(0, output.file.clone());
            }
            writer.write_record(&record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to finish CSV output: {}", e.error()))?;
        let text = String::from_utf8(bytes).context("CSV output is not valid UTF-8")?;
        Ok(text.trim_end_matches('\n').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::test_support::{output, sample};

    #[test]
    fn test_csv_blocks() {
        let text = CsvFormatter::new(FormatOptions::default())
            .format(&sample())
            .unwrap();
        assert_eq!(text, "start,end,count\n1,3,3\n5,6,2\n9,9,1");
    }

    #[test]
    fn test_csv_header_only_when_empty() {
        let text = CsvFormatter::new(FormatOptions::default())
            .format(&output(Vec::new(), false))
            .unwrap();
        assert_eq!(text, "start,end,count");
    }

    #[test]
    fn test_csv_file_column_is_quoted_when_needed() {
        let mut out = sample();
        out.file = "my, serials.csv".to_string();
        let options = FormatOptions {
            show_file: true,
            ..Default::default()
        };
        let text = CsvFormatter::new(options).format(&out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("file,start,end,count"));
        assert_eq!(lines.next(), Some("\"my, serials.csv\",1,3,3"));
    }
}
