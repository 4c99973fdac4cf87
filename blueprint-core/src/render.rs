//! Render - Generate a configuration block from a resource schema
//!
//! Walks the schema tree of one resource type and writes a `resource` block.
//! In skeleton mode every emitted attribute gets a typed placeholder such as
//! `<REQUIRED string>`; in defaults mode it gets a literal value taken from a
//! prior object or the attribute's empty value.

use std::path::PathBuf;

use crate::addrs::{AbsResourceInstance, Provider, ResourceMode};
use crate::schema::{Attribute, Block, NestedBlock, NestingMode, Node, Type};
use crate::value::Value;

/// Indent of the first level inside the resource block
const INDENT_STEP: usize = 2;

/// Options derived from command-line flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    /// Include optional attributes
    pub optional: bool,
    /// Emit attribute descriptions as comments
    pub descriptions: bool,
    /// Fill values instead of placeholders
    pub defaults: bool,
    /// Write to this file instead of stdout
    pub out_path: Option<PathBuf>,
    /// Explicit provider
    pub provider: Option<Provider>,
}

/// Render one resource block
///
/// The result ends with the closing brace and no trailing newline.
/// `prior` is only consulted in defaults mode.
pub fn render_resource(
    addr: &AbsResourceInstance,
    schema: &Block,
    provider_alias: Option<&str>,
    prior: Option<&Value>,
    options: &RenderOptions,
) -> String {
    let resource = addr.containing_resource();
    let keyword = match resource.mode {
        ResourceMode::Managed => "resource",
        ResourceMode::Data => "data",
    };

    let mut renderer = Renderer {
        options,
        buf: format!(
            "{} \"{}\" \"{}\" {{\n",
            keyword, resource.type_name, resource.name
        ),
    };

    let has_provider = provider_alias.is_some();
    if let Some(alias) = provider_alias {
        renderer.line(INDENT_STEP, &format!("provider = {}", alias));
    }

    let prior = if options.defaults { prior } else { None };
    renderer.write_body(schema, prior, INDENT_STEP, has_provider);
    renderer.buf.push('}');
    renderer.buf
}

struct Renderer<'o> {
    options: &'o RenderOptions,
    buf: String,
}

impl Renderer<'_> {
    fn line(&mut self, indent: usize, text: &str) {
        self.buf.push_str(&" ".repeat(indent));
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Attributes then nested blocks; `wrote_any` tells whether the body already has lines
    fn write_body(&mut self, block: &Block, prior: Option<&Value>, indent: usize, wrote_any: bool) {
        let mut wrote_attributes = wrote_any;
        let mut separated = false;

        for (name, node) in block.children() {
            match node {
                Node::Leaf { attribute, ty } => {
                    wrote_attributes |= self.write_attribute(name, attribute, ty, prior, indent);
                }
                Node::NestedTypeLeaf { attribute, implied } => {
                    wrote_attributes |=
                        self.write_attribute(name, attribute, &implied, prior, indent);
                }
                Node::Block(nested) => {
                    // A block that may be absent is never fabricated
                    if nested.min_items == 0 {
                        continue;
                    }
                    if wrote_attributes && !separated && !self.options.defaults {
                        self.buf.push('\n');
                        separated = true;
                    }
                    let nested_prior = prior.and_then(|p| p.get(name)).and_then(|v| first_instance(nested, v));
                    self.write_block(name, nested, nested_prior, indent);
                }
            }
        }
    }

    fn write_attribute(
        &mut self,
        name: &str,
        attribute: &Attribute,
        ty: &Type,
        prior: Option<&Value>,
        indent: usize,
    ) -> bool {
        if !(attribute.required || (attribute.optional && self.options.optional)) {
            return false;
        }

        if self.options.descriptions
            && let Some(description) = attribute.description.as_deref()
            && !description.trim().is_empty()
        {
            for text in description.trim().lines() {
                let text = text.trim_end();
                if text.is_empty() {
                    self.line(indent, "#");
                } else {
                    self.line(indent, &format!("# {}", text));
                }
            }
        }

        let value = if self.options.defaults {
            prior
                .and_then(|p| p.get(name))
                .filter(|v| v.conforms_to(ty))
                .cloned()
                .unwrap_or_else(|| attribute.empty_value())
                .to_literal(indent)
        } else {
            let flag = if attribute.required {
                "REQUIRED"
            } else {
                "OPTIONAL"
            };
            format!("<{} {}>", flag, ty.friendly_name())
        };
        self.line(indent, &format!("{} = {}", name, value));
        true
    }

    fn write_block(
        &mut self,
        name: &str,
        nested: &NestedBlock,
        prior: Option<&Value>,
        indent: usize,
    ) {
        self.line(indent, &format!("{} {{", name));
        self.write_body(&nested.block, prior, indent + INDENT_STEP, false);
        self.line(indent, "}");
    }
}

/// Prior object for one instance of a nested block
fn first_instance<'v>(nested: &NestedBlock, value: &'v Value) -> Option<&'v Value> {
    match (nested.nesting, value) {
        (NestingMode::Single | NestingMode::Group, Value::Map(_)) => Some(value),
        (NestingMode::List | NestingMode::Set, Value::List(items)) => {
            items.first().filter(|item| matches!(item, Value::Map(_)))
        }
        _ => None,
    }
}
