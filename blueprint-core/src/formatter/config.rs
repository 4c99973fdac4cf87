//! Formatting configuration

/// One level of indentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
    Tab,
}

/// Formatting options
#[derive(Debug, Clone)]
pub struct FormatConfig {
    pub indent: Indent,

    /// Blank lines written after each top-level block
    pub blank_lines_between_blocks: usize,

    /// Pad keys so the `=` of consecutive attributes line up
    pub align_equals: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent: Indent::Spaces(2),
            blank_lines_between_blocks: 1,
            align_equals: true,
        }
    }
}

impl FormatConfig {
    /// Leading whitespace for a line at nesting `level`
    pub fn indent_for(&self, level: usize) -> String {
        match self.indent {
            Indent::Spaces(n) => " ".repeat(n * level),
            Indent::Tab => "\t".repeat(level),
        }
    }
}
