//! Config - Static view of a configuration directory and its child modules
//!
//! Only the parts needed to place a new resource are kept: declared
//! resources with their source ranges, provider local names, module calls
//! and the backend block.

mod loader;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::addrs::{AddressError, Provider, Resource};
use crate::diagnostics::SourceRange;
use crate::formatter::FormatParseError;

pub use loader::ConfigLoader;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Circular module reference: {0}")]
    CircularModule(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {file}: {source}")]
    Parse {
        file: String,
        source: FormatParseError,
    },

    #[error("Invalid provider source for \"{name}\" at {range}: {source}")]
    InvalidProvider {
        name: String,
        range: SourceRange,
        source: AddressError,
    },

    #[error("Duplicate resource {address} at {range}; it was already declared at {previous}")]
    DuplicateResource {
        address: String,
        range: SourceRange,
        previous: SourceRange,
    },

    #[error("Module \"{name}\" at {range} has no source argument")]
    MissingModuleSource { name: String, range: SourceRange },
}

/// A resource block in configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredResource {
    pub resource: Resource,
    /// Range of the block header, up to the opening brace
    pub decl_range: SourceRange,
}

/// A `module "name" { source = "..." }` block
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleCall {
    pub name: String,
    pub source: String,
    pub decl_range: SourceRange,
}

/// A `backend "type" { ... }` block inside `terraform`
#[derive(Debug, Clone, PartialEq)]
pub struct BackendDecl {
    pub backend_type: String,
    /// String-valued attributes of the block
    pub attributes: HashMap<String, String>,
    pub decl_range: SourceRange,
}

/// One module: every configuration file of a directory merged together
#[derive(Debug, Clone, Default)]
pub struct Module {
    /// Declared resources keyed by `type.name` or `data.type.name`
    pub resources: BTreeMap<String, DeclaredResource>,
    /// Provider local names from `required_providers`
    pub provider_local_names: HashMap<String, Provider>,
    pub module_calls: BTreeMap<String, ModuleCall>,
    pub backend: Option<BackendDecl>,
}

impl Module {
    /// Declaration of the given resource, if present
    pub fn resource(&self, resource: &Resource) -> Option<&DeclaredResource> {
        self.resources.get(&resource.to_string())
    }

    /// Local name this module uses for a provider
    ///
    /// When several local names map to the same provider the smallest one wins.
    pub fn local_name_for_provider(&self, provider: &Provider) -> Option<String> {
        self.provider_local_names
            .iter()
            .filter(|(_, p)| *p == provider)
            .map(|(name, _)| name)
            .min()
            .cloned()
    }

    /// Provider for an unqualified name such as the prefix of a resource type
    pub fn implied_provider_for_unqualified_type(&self, name: &str) -> Provider {
        self.provider_local_names
            .get(name)
            .cloned()
            .unwrap_or_else(|| Provider::new_default(name))
    }
}

/// A module together with the modules it calls
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    pub module: Module,
    pub children: BTreeMap<String, ConfigTree>,
}

impl ConfigTree {
    pub fn root(&self) -> &Module {
        &self.module
    }

    /// Walk down a static module path (e.g. `["network", "subnets"]`)
    pub fn descendant(&self, path: &[String]) -> Option<&ConfigTree> {
        path.iter()
            .try_fold(self, |tree, name| tree.children.get(name))
    }
}
