use anyhow::Result;

use super::{FormatOptions, Formatter};
use crate::colors::ColorScheme;
use crate::orchestrator::PipelineOutput;

const COLUMNS: [&str; 3] = ["Start", "End", "Count"];

/// Right-aligned `Start End Count` table, one row per block
pub struct TableFormatter {
    options: FormatOptions,
    colors: ColorScheme,
}

impl TableFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self {
            colors: ColorScheme::new(options.use_colors),
            options,
        }
    }
}

impl Formatter for TableFormatter {
    fn format(&self, output: &PipelineOutput) -> Result<String> {
        let mut lines = Vec::new();

        if self.options.show_file {
            lines.push(self.colors.paint(self.colors.file, &output.file));
        }
        if self.options.show_summary {
            lines.push(
                self.colors
                    .paint(self.colors.dim, &output.result.summary_line()),
            );
        }
        if output.blocks.is_empty() {
            return Ok(lines.join("\n"));
        }

        let cells: Vec<[String; 3]> = output
            .blocks
            .iter()
            .map(|b| [b.start.to_string(), b.end.to_string(), b.count.to_string()])
            .collect();

        let mut widths = COLUMNS.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.len());
            }
        }

        let header = COLUMNS
            .iter()
            .zip(widths)
            .map(|(name, width)| format!("{:>width$}", name, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(self.colors.paint(self.colors.header, &header));

        for (row, block) in cells.iter().zip(&output.blocks) {
            let line = row
                .iter()
                .zip(widths)
                .map(|(cell, width)| format!("{:>width$}", cell, width = width))
                .collect::<Vec<_>>()
                .join("  ");
            let color = if block.count > 1 {
                self.colors.range
            } else {
                self.colors.single
            };
            lines.push(self.colors.paint(color, &line));
        }

        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::test_support::{output, sample};
    use crate::model::SerialBlock;

    fn plain() -> FormatOptions {
        FormatOptions {
            show_summary: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_table_layout() {
        let text = TableFormatter::new(plain()).format(&sample()).unwrap();
        let expected = "6 rows parsed (header row detected).\n\
                        Start  End  Count\n\
                        \x20   1    3      3\n\
                        \x20   5    6      2\n\
                        \x20   9    9      1";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_wide_values_stretch_columns() {
        let out = output(
            vec![SerialBlock {
                start: 5551234567,
                end: 5551234569,
                count: 3,
            }],
            false,
        );
        let text = TableFormatter::new(FormatOptions::default())
            .format(&out)
            .unwrap();
        assert_eq!(
            text,
            "     Start         End  Count\n5551234567  5551234569      3"
        );
    }

    #[test]
    fn test_empty_blocks_only_status_line() {
        let out = output(Vec::new(), false);
        let text = TableFormatter::new(plain()).format(&out).unwrap();
        assert_eq!(text, "0 rows parsed.");
    }

    #[test]
    fn test_file_heading_and_colors() {
        let options = FormatOptions {
            use_colors: true,
            show_file: true,
            ..Default::default()
        };
        let text = TableFormatter::new(options).format(&sample()).unwrap();
        let first = text.lines().next().unwrap();
        assert_eq!(first, "\x1b[36mserials.csv\x1b[0m");
        assert!(text.contains("\x1b[1mStart  End  Count\x1b[0m"));
        assert!(text.contains("\x1b[32m    1    3      3\x1b[0m"));
    }
}
