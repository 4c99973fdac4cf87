//! Pest parser for the formatter grammar

use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "formatter/hcl_fmt.pest"]
pub struct HclFmtParser;

/// Error type for format parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Parse error at {line}:{column}: {message}")]
pub struct FormatParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<pest::error::Error<Rule>> for FormatParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let (line, column) = match err.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c),
            pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        FormatParseError {
            message: err.variant.message().to_string(),
            line,
            column,
        }
    }
}

/// Parse source code for formatting
pub fn parse(source: &str) -> Result<pest::iterators::Pairs<'_, Rule>, FormatParseError> {
    HclFmtParser::parse(Rule::file, source).map_err(FormatParseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resource_block() {
        let input = "resource \"test_instance\" \"new\" {\n  value = null\n}\n";
        assert!(parse(input).is_ok());
    }

    #[test]
    fn test_parse_nested_values() {
        let input = r#"terraform {
  required_providers {
    test = {
      source = "happycorp/test"
    }
  }
}
locals {
  list = ["a", 1, true, [null]]
  ref  = var.name
  call = file("x.txt")
}
"#;
        assert!(parse(input).is_ok());
    }

    #[test]
    fn test_parse_with_comment() {
        let input = "# Header comment\nresource \"a\" \"b\" {} // trailing\n";
        assert!(parse(input).is_ok());
    }

    #[test]
    fn test_parse_unterminated_heredoc_is_an_error() {
        assert!(parse("x = <<EOT\nno end marker\n").is_err());
    }

    #[test]
    fn test_parse_unbalanced_brackets_are_an_error() {
        assert!(parse("x = (var.a + 1\n").is_err());
    }

    #[test]
    fn test_parse_error_position() {
        let err = parse("resource \"a\" \"b\" {\n  value = \n}\n").unwrap_err();
        assert!(err.line >= 2, "unexpected line {}", err.line);
    }
}
