//! Concrete Syntax Tree for formatting
//! Preserves all source information including trivia (whitespace and comments)

use crate::diagnostics::Pos;

/// Source location information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Trivia types (whitespace and comments)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trivia {
    /// Spaces and tabs (not including newlines)
    Whitespace(String),
    /// Single newline
    Newline,
    /// Line comment including the `#` or `//` prefix
    LineComment(String),
}

/// A token with its text and position
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(text: String, span: Span) -> Self {
        Self { text, span }
    }

    pub fn is_string(&self) -> bool {
        self.text.starts_with('"')
    }
}

/// CST node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Block,
    Attribute,
    Object,
    ObjectItem,
    List,
    FunctionCall,
}

/// CST node - preserves all source information
#[derive(Debug, Clone)]
pub struct CstNode {
    pub kind: NodeKind,
    pub span: Span,
    pub children: Vec<CstChild>,
}

impl CstNode {
    pub fn with_children(kind: NodeKind, span: Span, children: Vec<CstChild>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    /// Child nodes, skipping tokens and trivia
    pub fn nodes(&self) -> impl Iterator<Item = &CstNode> {
        self.children.iter().filter_map(|child| match child {
            CstChild::Node(node) => Some(node),
            _ => None,
        })
    }

    fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter_map(|child| match child {
            CstChild::Token(token) => Some(token),
            _ => None,
        })
    }

    /// Block type and raw labels (tokens before the opening brace)
    pub fn block_header(&self) -> Vec<&Token> {
        self.tokens().take_while(|t| t.text != "{").collect()
    }

    /// Span of the block header: block type through the last label
    pub fn block_def_span(&self) -> Span {
        let end = self
            .block_header()
            .last()
            .map_or(self.span.end, |t| t.span.end);
        Span::new(self.span.start, end)
    }

    /// Key of an attribute or object item, unquoted
    pub fn key(&self) -> Option<String> {
        let token = self.tokens().next()?;
        if token.is_string() {
            unquote(&token.text)
        } else {
            Some(token.text.clone())
        }
    }

    /// Raw key token text of an attribute or object item
    pub fn key_text(&self) -> Option<&str> {
        self.tokens().next().map(|t| t.text.as_str())
    }

    /// Value expression of an attribute or object item
    pub fn value(&self) -> Option<&CstChild> {
        self.children
            .iter()
            .skip_while(|child| !matches!(child, CstChild::Token(t) if t.text == "=" || t.text == ":"))
            .skip(1)
            .find(|child| !matches!(child, CstChild::Trivia(_)))
    }
}

/// Child of a CST node - can be a node, token, or trivia
#[derive(Debug, Clone)]
pub enum CstChild {
    Node(CstNode),
    Token(Token),
    Trivia(Trivia),
}

impl CstChild {
    /// String literal value, if this child is a quoted string token
    pub fn as_string(&self) -> Option<String> {
        match self {
            CstChild::Token(token) if token.is_string() => unquote(&token.text),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&CstNode> {
        match self {
            CstChild::Node(node) => Some(node),
            _ => None,
        }
    }
}

/// Complete CST for a file
#[derive(Debug)]
pub struct Cst {
    pub root: CstNode,
    pub source: String,
}

impl Cst {
    pub fn new(root: CstNode, source: String) -> Self {
        Self { root, source }
    }

    /// 1-based line and column of a byte offset
    pub fn position(&self, offset: usize) -> Pos {
        let before = &self.source[..offset.min(self.source.len())];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Pos {
            line,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

/// Decode a quoted string literal
///
/// Returns `None` for anything that is not a single literal, including
/// expressions that merely start and end with a quote (`"a" == "b"`) and
/// templates with quoted strings inside an interpolation.
pub fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '"' {
            return None;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            other => out.push(other),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""plain""#).as_deref(), Some("plain"));
        assert_eq!(unquote(r#""a\"b\n""#).as_deref(), Some("a\"b\n"));
        assert_eq!(unquote("bare"), None);
        assert_eq!(unquote(r#""a" == "b""#), None);
    }

    #[test]
    fn test_position() {
        let cst = Cst::new(
            CstNode::with_children(NodeKind::File, Span::new(0, 0), Vec::new()),
            "ab\ncd\n".to_string(),
        );
        assert_eq!(cst.position(0), Pos { line: 1, column: 1 });
        assert_eq!(cst.position(4), Pos { line: 2, column: 2 });
    }
}
