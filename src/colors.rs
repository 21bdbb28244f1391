/// ANSI color codes for block table output
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: &'static str, // Bold for column titles
    pub file: &'static str,   // Cyan for file headings
    pub range: &'static str,  // Green for multi-value blocks
    pub single: &'static str, // No color for single-value blocks
    pub dim: &'static str,    // Dim for the status line
    pub reset: &'static str,  // Reset to default color
}

impl ColorScheme {
    pub fn new(use_colors: bool) -> Self {
        if use_colors {
            Self {
                header: "\x1b[1m",
                file: "\x1b[36m",
                range: "\x1b[32m",
                single: "",
                dim: "\x1b[2m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                header: "",
                file: "",
                range: "",
                single: "",
                dim: "",
                reset: "",
            }
        }
    }

    /// Wrap `text` in `color`, skipping the reset when there is no color
    pub fn paint(&self, color: &str, text: &str) -> String {
        if color.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", color, text, self.reset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_scheme_leaves_text_alone() {
        let scheme = ColorScheme::new(false);
        assert_eq!(scheme.paint(scheme.header, "Start"), "Start");
    }

    #[test]
    fn test_colored_scheme_resets() {
        let scheme = ColorScheme::new(true);
        assert_eq!(scheme.paint(scheme.range, "1"), "\x1b[32m1\x1b[0m");
        assert_eq!(scheme.paint(scheme.single, "9"), "9");
    }
}
