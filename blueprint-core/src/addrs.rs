//! Addresses - Resource instance addresses and provider identities
//!
//! A resource instance address looks like
//! `module.network.module.subnets["a"].aws_subnet.private[0]` and a provider
//! source looks like `[hostname/][namespace/]name`.

use std::fmt;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use serde::{Deserialize, Serialize};

/// Hostname of the registry that unqualified provider sources resolve to
pub const DEFAULT_REGISTRY_HOST: &str = "registry.terraform.io";

/// Namespace that unqualified provider sources resolve to
pub const DEFAULT_NAMESPACE: &str = "hashicorp";

/// Address parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid address syntax at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Address {0} does not refer to a single resource instance")]
    NotResourceInstance(String),

    #[error("Invalid provider source '{given}': {message}")]
    InvalidProviderSource { given: String, message: String },
}

/// Key selecting one instance of a counted or for_each resource or module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceKey {
    Int(i64),
    String(String),
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceKey::Int(i) => write!(f, "[{}]", i),
            InstanceKey::String(s) => {
                let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "[\"{}\"]", escaped)
            }
        }
    }
}

/// One `module.NAME[KEY]` step of a module instance path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleInstanceStep {
    pub name: String,
    pub key: Option<InstanceKey>,
}

/// Path to a module instance; empty for the root module
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ModuleInstance(pub Vec<ModuleInstanceStep>);

impl ModuleInstance {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Static module path with instance keys removed (e.g. `["network", "subnets"]`)
    pub fn module(&self) -> Vec<String> {
        self.0.iter().map(|step| step.name.clone()).collect()
    }
}

impl fmt::Display for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "module.{}", step.name)?;
            if let Some(key) = &step.key {
                write!(f, "{}", key)?;
            }
        }
        Ok(())
    }
}

/// Whether a resource is managed or only read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMode {
    #[default]
    Managed,
    Data,
}

/// A resource as declared in configuration (type + name, no module, no key)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    pub mode: ResourceMode,
    pub type_name: String,
    pub name: String,
}

impl Resource {
    pub fn new(mode: ResourceMode, type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mode,
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Local name of the provider implied by the resource type prefix
    ///
    /// `aws_instance` implies `aws`; a type without an underscore implies itself.
    pub fn implied_provider(&self) -> &str {
        match self.type_name.split_once('_') {
            Some((prefix, _)) => prefix,
            None => &self.type_name,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            ResourceMode::Managed => write!(f, "{}.{}", self.type_name, self.name),
            ResourceMode::Data => write!(f, "data.{}.{}", self.type_name, self.name),
        }
    }
}

/// Absolute address of exactly one resource instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsResourceInstance {
    pub module: ModuleInstance,
    pub resource: Resource,
    pub key: Option<InstanceKey>,
}

impl AbsResourceInstance {
    /// Parse an address such as `module.child.test_instance.web[0]`
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let steps = parse_steps(input)?;
        let not_instance = || AddressError::NotResourceInstance(input.to_string());

        let mut module = Vec::new();
        let mut rest = steps.as_slice();
        while let [first, tail @ ..] = rest {
            if first.name != "module" {
                break;
            }
            let [name, tail @ ..] = tail else {
                return Err(not_instance());
            };
            if first.key.is_some() {
                return Err(not_instance());
            }
            module.push(ModuleInstanceStep {
                name: name.name.clone(),
                key: name.key.clone(),
            });
            rest = tail;
        }

        let (mode, rest) = match rest {
            [first, tail @ ..] if first.name == "data" && first.key.is_none() => {
                (ResourceMode::Data, tail)
            }
            _ => (ResourceMode::Managed, rest),
        };

        match rest {
            [type_step, name_step] if type_step.key.is_none() => Ok(Self {
                module: ModuleInstance(module),
                resource: Resource::new(mode, &type_step.name, &name_step.name),
                key: name_step.key.clone(),
            }),
            _ => Err(not_instance()),
        }
    }

    /// The resource this instance belongs to, in configuration form (`type.name`)
    pub fn containing_resource(&self) -> &Resource {
        &self.resource
    }
}

impl fmt::Display for AbsResourceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.module.is_root() {
            write!(f, "{}.", self.module)?;
        }
        write!(f, "{}", self.resource)?;
        if let Some(key) = &self.key {
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

#[derive(Parser)]
#[grammar = "addrs.pest"]
struct AddressParser;

/// One `name[key]` step of a traversal
#[derive(Debug)]
struct Step {
    name: String,
    key: Option<InstanceKey>,
}

fn parse_steps(input: &str) -> Result<Vec<Step>, AddressError> {
    let address = AddressParser::parse(Rule::address, input)
        .map_err(syntax_error)?
        .next()
        .ok_or_else(|| AddressError::NotResourceInstance(input.to_string()))?;

    address
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::step)
        .map(step)
        .collect()
}

fn step(pair: Pair<'_, Rule>) -> Result<Step, AddressError> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    let key = inner.next().map(instance_key).transpose()?;
    Ok(Step { name, key })
}

fn instance_key(pair: Pair<'_, Rule>) -> Result<InstanceKey, AddressError> {
    let text = pair.as_str();
    match pair.as_rule() {
        Rule::int_key => text
            .parse::<i64>()
            .map(InstanceKey::Int)
            .map_err(|_| AddressError::Syntax {
                offset: pair.as_span().start(),
                message: format!("invalid index '{}'", text),
            }),
        _ => {
            let body = text
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .unwrap_or(text);
            Ok(InstanceKey::String(unescape(body)))
        }
    }
}

/// Decode a string key body; the grammar only admits `\n`, `\t`, `\"` and `\\`
fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn syntax_error(err: pest::error::Error<Rule>) -> AddressError {
    let offset = match err.location {
        pest::error::InputLocation::Pos(pos) => pos,
        pest::error::InputLocation::Span((start, _)) => start,
    };
    AddressError::Syntax {
        offset,
        message: err.variant.message().to_string(),
    }
}

/// Fully-qualified provider identity (hostname, namespace, type)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Provider {
    pub hostname: String,
    pub namespace: String,
    pub type_name: String,
}

impl Provider {
    pub fn new(
        hostname: impl Into<String>,
        namespace: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            namespace: namespace.into(),
            type_name: type_name.into(),
        }
    }

    /// Provider in the default registry and namespace (e.g. `registry.terraform.io/hashicorp/aws`)
    pub fn new_default(type_name: impl Into<String>) -> Self {
        Self::new(DEFAULT_REGISTRY_HOST, DEFAULT_NAMESPACE, type_name)
    }

    /// Parse a source string of the form `[hostname/][namespace/]name`
    pub fn parse_source(source: &str) -> Result<Self, AddressError> {
        let invalid = |message: &str| AddressError::InvalidProviderSource {
            given: source.to_string(),
            message: message.to_string(),
        };

        let parts: Vec<&str> = source.split('/').collect();
        let (hostname, namespace, type_name) = match parts.as_slice() {
            [name] => (DEFAULT_REGISTRY_HOST, DEFAULT_NAMESPACE, *name),
            [namespace, name] => (DEFAULT_REGISTRY_HOST, *namespace, *name),
            [hostname, namespace, name] => (*hostname, *namespace, *name),
            _ => return Err(invalid("must be in the format [hostname/][namespace/]name")),
        };

        if !is_valid_hostname(hostname) {
            return Err(invalid("hostname is not valid"));
        }
        if !is_valid_provider_part(namespace) {
            return Err(invalid(
                "namespace must contain only letters, digits, dashes and underscores",
            ));
        }
        if !is_valid_provider_part(type_name) {
            return Err(invalid(
                "type must contain only letters, digits, dashes and underscores",
            ));
        }

        Ok(Self::new(hostname, namespace, type_name))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.hostname, self.namespace, self.type_name)
    }
}

impl TryFrom<String> for Provider {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_source(&value)
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        provider.to_string()
    }
}

fn is_valid_provider_part(part: &str) -> bool {
    !part.is_empty()
        && !part.starts_with('-')
        && !part.ends_with('-')
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_valid_hostname(hostname: &str) -> bool {
    !hostname.is_empty()
        && !hostname.starts_with(['.', '-'])
        && hostname
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_root_resource_instance() {
        let addr = AbsResourceInstance::parse("test_instance.new").unwrap();
        assert!(addr.module.is_root());
        assert_eq!(addr.resource.mode, ResourceMode::Managed);
        assert_eq!(addr.resource.type_name, "test_instance");
        assert_eq!(addr.resource.name, "new");
        assert_eq!(addr.key, None);
        assert_eq!(addr.to_string(), "test_instance.new");
    }

    #[test]
    fn parse_module_resource_with_keys() {
        let addr =
            AbsResourceInstance::parse("module.net.module.sub[\"a\"].aws_subnet.private[2]")
                .unwrap();
        assert_eq!(addr.module.module(), vec!["net", "sub"]);
        assert_eq!(
            addr.module.0[1].key,
            Some(InstanceKey::String("a".to_string()))
        );
        assert_eq!(addr.key, Some(InstanceKey::Int(2)));
        assert_eq!(
            addr.to_string(),
            "module.net.module.sub[\"a\"].aws_subnet.private[2]"
        );
        assert_eq!(addr.containing_resource().to_string(), "aws_subnet.private");
    }

    #[test]
    fn parse_data_resource() {
        let addr = AbsResourceInstance::parse("data.aws_ami.ubuntu").unwrap();
        assert_eq!(addr.resource.mode, ResourceMode::Data);
        assert_eq!(addr.to_string(), "data.aws_ami.ubuntu");
    }

    #[test]
    fn parse_rejects_non_instance_addresses() {
        assert!(AbsResourceInstance::parse("definitely-not_a-VALID-resource").is_err());
        assert!(AbsResourceInstance::parse("module.child").is_err());
        assert!(AbsResourceInstance::parse("a.b.c").is_err());
        assert!(AbsResourceInstance::parse("test_instance.new[").is_err());
        assert!(AbsResourceInstance::parse("test_instance..new").is_err());
        assert!(AbsResourceInstance::parse("").is_err());
    }

    #[test]
    fn parse_string_key_escapes() {
        let addr = AbsResourceInstance::parse(r#"test_instance.web["a\"b\\c"]"#).unwrap();
        assert_eq!(addr.key, Some(InstanceKey::String("a\"b\\c".to_string())));
        assert_eq!(addr.to_string(), r#"test_instance.web["a\"b\\c"]"#);
    }

    #[test]
    fn syntax_errors_carry_offset() {
        match AbsResourceInstance::parse("test_instance.new[x]") {
            Err(AddressError::Syntax { offset, .. }) => assert_eq!(offset, 18),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            AbsResourceInstance::parse("test_instance.new[99999999999999999999]"),
            Err(AddressError::Syntax { .. })
        ));
        assert!(matches!(
            AbsResourceInstance::parse(r#"test_instance.new["\q"]"#),
            Err(AddressError::Syntax { .. })
        ));
        assert!(matches!(
            AbsResourceInstance::parse("module.child"),
            Err(AddressError::NotResourceInstance(_))
        ));
    }

    #[test]
    fn implied_provider_uses_type_prefix() {
        let r = Resource::new(ResourceMode::Managed, "aws_instance", "web");
        assert_eq!(r.implied_provider(), "aws");
        let r = Resource::new(ResourceMode::Managed, "null", "x");
        assert_eq!(r.implied_provider(), "null");
    }

    #[test]
    fn parse_provider_sources() {
        assert_eq!(
            Provider::parse_source("test").unwrap(),
            Provider::new_default("test")
        );
        assert_eq!(
            Provider::parse_source("happycorp/test").unwrap(),
            Provider::new(DEFAULT_REGISTRY_HOST, "happycorp", "test")
        );
        assert_eq!(
            Provider::parse_source("example.com/happycorp/test").unwrap(),
            Provider::new("example.com", "happycorp", "test")
        );
    }

    #[test]
    fn parse_provider_source_errors() {
        assert!(Provider::parse_source("/this/isn't/quite/correct").is_err());
        assert!(Provider::parse_source("happycorp/").is_err());
        assert!(Provider::parse_source("-bad").is_err());
        assert!(Provider::parse_source("").is_err());
    }

    #[test]
    fn provider_equality_is_exact() {
        let a = Provider::new("registry.terraform.io", "hashicorp", "test");
        let b = Provider::new("Registry.Terraform.io", "hashicorp", "test");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "registry.terraform.io/hashicorp/test");
        assert_eq!(a, Provider::new_default("test"));
    }
}
