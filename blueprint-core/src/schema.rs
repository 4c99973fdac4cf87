//! Schema - Declared shape of provider resource types
//!
//! Providers describe each resource type as a tree: a [`Block`] holds
//! attributes and nested blocks, an [`Attribute`] is either a typed leaf or a
//! nested object type, and a [`NestedBlock`] wraps a block with occurrence
//! bounds.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::addrs::{Provider, ResourceMode};
use crate::value::Value;

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    String,
    Number,
    Bool,
    List(Box<Type>),
    Set(Box<Type>),
    Map(Box<Type>),
    Object(BTreeMap<String, Type>),
    Tuple(Vec<Type>),
    /// Any type, decided by the provider at runtime
    Dynamic,
}

impl Type {
    pub fn list(element: Type) -> Self {
        Self::List(Box::new(element))
    }

    pub fn set(element: Type) -> Self {
        Self::Set(Box::new(element))
    }

    pub fn map(element: Type) -> Self {
        Self::Map(Box::new(element))
    }

    /// Human-readable type name (e.g. `string`, `list of object`)
    pub fn friendly_name(&self) -> String {
        match self {
            Type::String => "string".to_string(),
            Type::Number => "number".to_string(),
            Type::Bool => "bool".to_string(),
            Type::List(inner) => format!("list of {}", inner.friendly_name()),
            Type::Set(inner) => format!("set of {}", inner.friendly_name()),
            Type::Map(inner) => format!("map of {}", inner.friendly_name()),
            Type::Object(_) => "object".to_string(),
            Type::Tuple(_) => "tuple".to_string(),
            Type::Dynamic => "dynamic".to_string(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.friendly_name())
    }
}

/// How the instances of a nested type or nested block are collected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    #[default]
    Single,
    Group,
    List,
    Set,
    Map,
}

/// Object type used by nested-type attributes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Object {
    #[serde(default)]
    pub nesting: NestingMode,
    #[serde(default)]
    pub attributes: HashMap<String, Attribute>,
}

impl Object {
    /// Type of the whole attribute value after applying the nesting mode
    pub fn implied_type(&self) -> Type {
        let object = Type::Object(
            self.attributes
                .iter()
                .map(|(name, attr)| (name.clone(), attr.implied_type()))
                .collect(),
        );
        match self.nesting {
            NestingMode::Single | NestingMode::Group => object,
            NestingMode::List => Type::list(object),
            NestingMode::Set => Type::set(object),
            NestingMode::Map => Type::map(object),
        }
    }
}

/// Either a primitive/collection type or a nested object type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Type(Type),
    NestedType(Object),
}

/// Attribute schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(flatten)]
    pub kind: AttributeKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Attribute {
    fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            description: None,
        }
    }

    pub fn typed(ty: Type) -> Self {
        Self::new(AttributeKind::Type(ty))
    }

    pub fn nested(object: Object) -> Self {
        Self::new(AttributeKind::NestedType(object))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn implied_type(&self) -> Type {
        match &self.kind {
            AttributeKind::Type(ty) => ty.clone(),
            AttributeKind::NestedType(object) => object.implied_type(),
        }
    }

    /// Value used when nothing better is known; null for every type
    pub fn empty_value(&self) -> Value {
        Value::Null
    }
}

/// Block nested inside another block, with occurrence bounds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NestedBlock {
    #[serde(flatten)]
    pub block: Block,
    #[serde(default)]
    pub nesting: NestingMode,
    #[serde(default)]
    pub min_items: u64,
    #[serde(default)]
    pub max_items: u64,
}

impl NestedBlock {
    pub fn new(nesting: NestingMode, block: Block) -> Self {
        Self {
            block,
            nesting,
            min_items: 0,
            max_items: 0,
        }
    }

    pub fn with_min_items(mut self, min_items: u64) -> Self {
        self.min_items = min_items;
        self
    }
}

/// Block schema: attributes and nested blocks keyed by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub attributes: HashMap<String, Attribute>,
    #[serde(default)]
    pub block_types: HashMap<String, NestedBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One child of a block, as seen by a recursive walk
#[derive(Debug)]
pub enum Node<'a> {
    /// Attribute with a primitive or collection type
    Leaf {
        attribute: &'a Attribute,
        ty: &'a Type,
    },
    /// Attribute with a nested object type, treated as a single value
    NestedTypeLeaf {
        attribute: &'a Attribute,
        implied: Type,
    },
    Block(&'a NestedBlock),
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn block_type(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.block_types.insert(name.into(), block);
        self
    }

    /// Children in output order: attributes sorted by name, then nested blocks sorted by name
    pub fn children(&self) -> Vec<(&str, Node<'_>)> {
        let mut attr_names: Vec<&String> = self.attributes.keys().collect();
        attr_names.sort();
        let mut block_names: Vec<&String> = self.block_types.keys().collect();
        block_names.sort();

        let attributes = attr_names.into_iter().map(|name| {
            let attribute = &self.attributes[name];
            let node = match &attribute.kind {
                AttributeKind::Type(ty) => Node::Leaf { attribute, ty },
                AttributeKind::NestedType(object) => Node::NestedTypeLeaf {
                    attribute,
                    implied: object.implied_type(),
                },
            };
            (name.as_str(), node)
        });
        let blocks = block_names
            .into_iter()
            .map(|name| (name.as_str(), Node::Block(&self.block_types[name])));

        attributes.chain(blocks).collect()
    }
}

/// Schema error
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Invalid schema document: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Resource and data source schemas of one provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Block>,
    #[serde(default, rename = "resource_schemas")]
    pub resource_types: HashMap<String, Block>,
    #[serde(default, rename = "data_source_schemas")]
    pub data_sources: HashMap<String, Block>,
}

/// Schemas of every provider available to a configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schemas {
    #[serde(default, rename = "provider_schemas")]
    pub providers: HashMap<Provider, ProviderSchema>,
}

impl Schemas {
    /// Parse a schema document:
    /// `{"provider_schemas": {"<source>": {"resource_schemas": {...}}}}`
    pub fn from_json(source: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn provider(&self, provider: &Provider) -> Option<&ProviderSchema> {
        self.providers.get(provider)
    }

    /// Block schema for a resource type of the given provider and mode
    pub fn resource_type_config(
        &self,
        provider: &Provider,
        mode: ResourceMode,
        type_name: &str,
    ) -> Option<&Block> {
        let schema = self.provider(provider)?;
        match mode {
            ResourceMode::Managed => schema.resource_types.get(type_name),
            ResourceMode::Data => schema.data_sources.get(type_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friendly_names() {
        assert_eq!(Type::String.friendly_name(), "string");
        assert_eq!(Type::list(Type::Number).friendly_name(), "list of number");
        assert_eq!(Type::map(Type::set(Type::Bool)).friendly_name(), "map of set of bool");
        assert_eq!(Type::Object(BTreeMap::new()).friendly_name(), "object");
    }

    #[test]
    fn nesting_mode_changes_implied_type() {
        let mut object = Object {
            nesting: NestingMode::List,
            attributes: HashMap::new(),
        };
        object
            .attributes
            .insert("size".to_string(), Attribute::typed(Type::String).optional());
        assert_eq!(object.implied_type().friendly_name(), "list of object");

        object.nesting = NestingMode::Single;
        assert_eq!(object.implied_type().friendly_name(), "object");
        object.nesting = NestingMode::Set;
        assert_eq!(object.implied_type().friendly_name(), "set of object");
        object.nesting = NestingMode::Map;
        assert_eq!(object.implied_type().friendly_name(), "map of object");
    }

    #[test]
    fn children_are_sorted_attributes_then_blocks() {
        let block = Block::new()
            .attribute("zeta", Attribute::typed(Type::String).required())
            .attribute("alpha", Attribute::typed(Type::String).optional())
            .block_type("beta", NestedBlock::new(NestingMode::List, Block::new()))
            .block_type("aardvark", NestedBlock::new(NestingMode::List, Block::new()));

        let names: Vec<&str> = block.children().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["alpha", "zeta", "aardvark", "beta"]);
    }

    #[test]
    fn deserialize_schema_document() {
        let doc = r#"{
          "provider_schemas": {
            "happycorp/test": {
              "resource_schemas": {
                "test_instance": {
                  "attributes": {
                    "id": {"type": "string", "optional": true, "computed": true},
                    "tags": {"type": {"map": "string"}, "optional": true},
                    "disks": {
                      "nested_type": {
                        "nesting": "list",
                        "attributes": {
                          "mount_point": {"type": "string", "required": true}
                        }
                      },
                      "optional": true
                    }
                  },
                  "block_types": {
                    "network_interface": {
                      "nesting": "list",
                      "min_items": 1,
                      "attributes": {
                        "device_index": {"type": "number", "optional": true}
                      }
                    }
                  }
                }
              },
              "data_source_schemas": {
                "test_ami": {"attributes": {"name": {"type": "string", "required": true}}}
              }
            }
          }
        }"#;

        let schemas = Schemas::from_json(doc).unwrap();
        let provider = Provider::parse_source("happycorp/test").unwrap();
        let block = schemas
            .resource_type_config(&provider, ResourceMode::Managed, "test_instance")
            .unwrap();

        let id = &block.attributes["id"];
        assert_eq!(id.kind, AttributeKind::Type(Type::String));
        assert!(id.optional && id.computed && !id.required);
        assert_eq!(
            block.attributes["tags"].implied_type(),
            Type::map(Type::String)
        );
        assert_eq!(
            block.attributes["disks"].implied_type().friendly_name(),
            "list of object"
        );
        let nic = &block.block_types["network_interface"];
        assert_eq!(nic.min_items, 1);
        assert_eq!(nic.nesting, NestingMode::List);
        assert!(nic.block.attributes.contains_key("device_index"));

        assert!(
            schemas
                .resource_type_config(&provider, ResourceMode::Data, "test_ami")
                .is_some()
        );
        assert!(
            schemas
                .resource_type_config(&provider, ResourceMode::Data, "test_instance")
                .is_none()
        );
        assert!(schemas.provider(&Provider::new_default("test")).is_none());
    }

    #[test]
    fn invalid_provider_key_is_rejected() {
        let doc = r#"{"provider_schemas": {"a/b/c/d": {}}}"#;
        assert!(Schemas::from_json(doc).is_err());
    }
}
