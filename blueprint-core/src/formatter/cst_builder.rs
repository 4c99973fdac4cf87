//! Build CST from pest parse tree

use pest::iterators::Pair;

use super::cst::{Cst, CstChild, CstNode, NodeKind, Span, Token, Trivia};
use super::parser::Rule;

/// Build a CST from pest parse result
pub fn build_cst(source: &str, pairs: pest::iterators::Pairs<'_, Rule>) -> Cst {
    let builder = CstBuilder::new(source);
    builder.build(pairs)
}

struct CstBuilder<'a> {
    source: &'a str,
}

impl<'a> CstBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn build(self, pairs: pest::iterators::Pairs<'a, Rule>) -> Cst {
        let mut children = Vec::new();

        for pair in pairs {
            if pair.as_rule() == Rule::file {
                for inner in pair.into_inner() {
                    if let Some(child) = self.build_child(inner) {
                        children.push(child);
                    }
                }
            }
        }

        let root =
            CstNode::with_children(NodeKind::File, Span::new(0, self.source.len()), children);

        Cst::new(root, self.source.to_string())
    }

    fn build_child(&self, pair: Pair<'a, Rule>) -> Option<CstChild> {
        let span = self.pair_span(&pair);

        match pair.as_rule() {
            // Trivia
            Rule::trivia => {
                let inner = pair.into_inner().next()?;
                self.build_child(inner)
            }
            Rule::ws => Some(CstChild::Trivia(Trivia::Whitespace(
                pair.as_str().to_string(),
            ))),
            Rule::newline => Some(CstChild::Trivia(Trivia::Newline)),
            Rule::comment => Some(CstChild::Trivia(Trivia::LineComment(
                pair.as_str().to_string(),
            ))),

            // Structure
            Rule::block => Some(CstChild::Node(self.build_node(NodeKind::Block, pair))),
            Rule::attribute => Some(CstChild::Node(self.build_node(NodeKind::Attribute, pair))),

            // Expressions
            Rule::object => Some(CstChild::Node(self.build_node(NodeKind::Object, pair))),
            Rule::object_item => Some(CstChild::Node(
                self.build_node(NodeKind::ObjectItem, pair),
            )),
            Rule::list => Some(CstChild::Node(self.build_node(NodeKind::List, pair))),
            Rule::function_call => Some(CstChild::Node(
                self.build_node(NodeKind::FunctionCall, pair),
            )),

            // Atoms and delimiters become tokens with their source text
            Rule::identifier
            | Rule::string
            | Rule::number
            | Rule::boolean
            | Rule::null_lit
            | Rule::traversal
            | Rule::opaque
            | Rule::open_brace
            | Rule::close_brace
            | Rule::open_bracket
            | Rule::close_bracket
            | Rule::open_paren
            | Rule::close_paren
            | Rule::equals
            | Rule::colon
            | Rule::comma => Some(CstChild::Token(Token::new(pair.as_str().to_string(), span))),

            _ => None,
        }
    }

    fn build_node(&self, kind: NodeKind, pair: Pair<'a, Rule>) -> CstNode {
        let span = self.pair_span(&pair);
        let mut children = Vec::new();

        for inner in pair.into_inner() {
            if let Some(child) = self.build_child(inner) {
                children.push(child);
            }
        }

        CstNode::with_children(kind, span, children)
    }

    fn pair_span(&self, pair: &Pair<'a, Rule>) -> Span {
        let pest_span = pair.as_span();
        Span::new(pest_span.start(), pest_span.end())
    }
}
