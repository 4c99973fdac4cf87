//! Main formatting logic

use super::config::FormatConfig;
use super::cst::{Cst, CstChild, CstNode, NodeKind, Trivia};
use super::cst_builder::build_cst;
use super::parser::{self, FormatParseError};

/// Format configuration source text
pub fn format(source: &str, config: &FormatConfig) -> Result<String, FormatParseError> {
    let cst = parse_cst(source)?;
    let formatter = Formatter::new(config.clone());
    Ok(formatter.format(&cst))
}

/// Parse source text into a CST
pub(crate) fn parse_cst(source: &str) -> Result<Cst, FormatParseError> {
    let pairs = parser::parse(source)?;
    Ok(build_cst(source, pairs))
}

/// One output line of a block body
enum Line<'a> {
    Attribute {
        node: &'a CstNode,
        comment: Option<&'a str>,
    },
    Block(&'a CstNode),
    Comment(&'a str),
    Blank,
}

/// Children between the braces of a block or object; the whole file for the root
fn body_children(node: &CstNode) -> &[CstChild] {
    if node.kind == NodeKind::File {
        return &node.children;
    }
    let is_token = |child: &CstChild, text: &str| matches!(child, CstChild::Token(t) if t.text == text);
    let open = node.children.iter().position(|c| is_token(c, "{"));
    let close = node.children.iter().rposition(|c| is_token(c, "}"));
    match (open, close) {
        (Some(open), Some(close)) if open < close => &node.children[open + 1..close],
        _ => &[],
    }
}

/// Group body children into lines, collapsing runs of blank lines into one
fn collect_lines(children: &[CstChild]) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut newlines = 0;

    for child in children {
        match child {
            CstChild::Trivia(Trivia::Newline) => {
                newlines += 1;
                if newlines == 2 && !lines.is_empty() && !matches!(lines.last(), Some(Line::Blank))
                {
                    lines.push(Line::Blank);
                }
            }
            CstChild::Trivia(Trivia::LineComment(text)) => {
                // A comment on the same line as an attribute stays inline
                if newlines == 0
                    && let Some(Line::Attribute { comment, .. }) = lines.last_mut()
                    && comment.is_none()
                {
                    *comment = Some(text.as_str());
                    continue;
                }
                lines.push(Line::Comment(text));
                newlines = 0;
            }
            CstChild::Node(node) => {
                if node.kind == NodeKind::Block {
                    lines.push(Line::Block(node));
                } else {
                    lines.push(Line::Attribute {
                        node,
                        comment: None,
                    });
                }
                newlines = 0;
            }
            CstChild::Trivia(Trivia::Whitespace(_)) | CstChild::Token(_) => {}
        }
    }

    while matches!(lines.last(), Some(Line::Blank)) {
        lines.pop();
    }
    lines
}

struct Formatter {
    config: FormatConfig,
    output: String,
    current_indent: usize,
}

impl Formatter {
    fn new(config: FormatConfig) -> Self {
        Self {
            config,
            output: String::new(),
            current_indent: 0,
        }
    }

    fn format(mut self, cst: &Cst) -> String {
        let lines = collect_lines(body_children(&cst.root));
        self.write_lines(&lines, true);

        // Ensure file ends with exactly one newline
        let trimmed = self.output.trim_end();
        format!("{}\n", trimmed)
    }

    fn write_lines(&mut self, lines: &[Line<'_>], top_level: bool) {
        let mut after_block = false;
        let mut i = 0;

        while i < lines.len() {
            let line = &lines[i];
            if top_level && after_block {
                if matches!(line, Line::Blank) {
                    i += 1;
                    continue;
                }
                self.write_newlines(self.config.blank_lines_between_blocks);
            }
            after_block = false;

            match line {
                Line::Blank => {
                    self.write_newline();
                    i += 1;
                }
                Line::Comment(text) => {
                    self.write_indent();
                    self.write(text);
                    self.write_newline();
                    i += 1;
                }
                Line::Block(node) => {
                    self.format_block(node);
                    after_block = true;
                    i += 1;
                }
                Line::Attribute { .. } => {
                    // Consecutive attributes share one alignment column
                    let end = lines[i..]
                        .iter()
                        .position(|l| !matches!(l, Line::Attribute { .. }))
                        .map_or(lines.len(), |p| i + p);
                    let run = &lines[i..end];
                    let width = if self.config.align_equals {
                        run.iter()
                            .filter_map(|l| match l {
                                Line::Attribute { node, .. } => node.key_text(),
                                _ => None,
                            })
                            .map(|k| k.chars().count())
                            .max()
                            .unwrap_or(0)
                    } else {
                        0
                    };
                    for l in run {
                        if let Line::Attribute { node, comment } = l {
                            self.format_attribute(node, width, *comment);
                        }
                    }
                    i = end;
                }
            }
        }
    }

    fn format_block(&mut self, node: &CstNode) {
        self.write_indent();
        let header: Vec<&str> = node
            .block_header()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        self.write(&header.join(" "));
        self.write(" {");
        self.write_newline();

        self.current_indent += 1;
        let lines = collect_lines(body_children(node));
        self.write_lines(&lines, false);
        self.current_indent -= 1;

        self.write_indent();
        self.write("}");
        self.write_newline();
    }

    fn format_attribute(&mut self, node: &CstNode, align_to: usize, comment: Option<&str>) {
        self.write_indent();

        let key = node.key_text().unwrap_or_default();
        self.write(key);
        let key_len = key.chars().count();
        if key_len < align_to {
            self.write(&" ".repeat(align_to - key_len));
        }

        self.write(" = ");
        if let Some(value) = node.value() {
            self.format_expr(value);
        }

        if let Some(comment) = comment {
            self.write("  ");
            self.write(comment);
        }
        self.write_newline();
    }

    fn format_expr(&mut self, child: &CstChild) {
        match child {
            CstChild::Token(token) => self.write(&token.text),
            CstChild::Node(node) => match node.kind {
                NodeKind::List => {
                    self.write("[");
                    self.format_items(node.children.iter());
                    self.write("]");
                }
                NodeKind::FunctionCall => {
                    let mut children = node.children.iter();
                    if let Some(CstChild::Token(name)) = children.next() {
                        self.write(&name.text);
                    }
                    self.write("(");
                    self.format_items(children);
                    self.write(")");
                }
                NodeKind::Object => self.format_object(node),
                _ => {}
            },
            CstChild::Trivia(_) => {}
        }
    }

    /// Write list elements or call arguments separated by `, `
    fn format_items<'c>(&mut self, children: impl Iterator<Item = &'c CstChild>) {
        let mut first = true;
        for child in children {
            let is_item = match child {
                CstChild::Token(token) => !matches!(token.text.as_str(), "[" | "]" | "(" | ")" | ","),
                CstChild::Node(_) => true,
                CstChild::Trivia(_) => false,
            };
            if !is_item {
                continue;
            }
            if !first {
                self.write(", ");
            }
            self.format_expr(child);
            first = false;
        }
    }

    fn format_object(&mut self, node: &CstNode) {
        let lines = collect_lines(body_children(node));
        if lines.is_empty() {
            self.write("{}");
            return;
        }

        self.write("{");
        self.write_newline();
        self.current_indent += 1;
        self.write_lines(&lines, false);
        self.current_indent -= 1;
        self.write_indent();
        self.write("}");
    }

    // Helper methods

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn write_indent(&mut self) {
        let indent = self.config.indent_for(self.current_indent);
        self.output.push_str(&indent);
    }

    fn write_newline(&mut self) {
        self.output.push('\n');
    }

    fn write_newlines(&mut self, count: usize) {
        for _ in 0..count {
            self.write_newline();
        }
    }
}
