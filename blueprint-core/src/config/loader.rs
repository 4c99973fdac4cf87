//! Config Loader - Load a configuration directory and its local child modules
//!
//! Every `*.tf` file of a directory is parsed with the formatter grammar and
//! merged into one [`Module`]. Module calls with a local `source` are loaded
//! recursively; a module that (directly or indirectly) calls itself is an error.
//! Calls to registry, git or other remote sources are left out of the tree.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::{BackendDecl, ConfigError, ConfigTree, DeclaredResource, Module, ModuleCall};
use crate::addrs::{Provider, Resource, ResourceMode};
use crate::diagnostics::SourceRange;
use crate::formatter::{Cst, CstChild, CstNode, NodeKind, parse_cst};

/// Extension of configuration files
const CONFIG_EXTENSION: &str = "tf";

pub struct ConfigLoader {
    /// Root configuration directory; file names in source ranges are relative to it
    base_dir: PathBuf,
    /// Module directories currently being loaded (for cycle detection)
    resolving: HashSet<PathBuf>,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base_dir = base_dir.as_ref();
        if !base_dir.is_dir() {
            return Err(ConfigError::NotFound(base_dir.to_path_buf()));
        }
        let base_dir = base_dir.canonicalize().map_err(|source| ConfigError::Io {
            path: base_dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            base_dir,
            resolving: HashSet::new(),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Backend block of the root module, without loading child modules
    pub fn backend_config(&self) -> Result<Option<BackendDecl>, ConfigError> {
        Ok(self.load_module_dir(&self.base_dir)?.backend)
    }

    /// Load the root module and every module it calls
    pub fn load_config(&mut self) -> Result<ConfigTree, ConfigError> {
        let base_dir = self.base_dir.clone();
        self.load_tree(&base_dir)
    }

    fn load_tree(&mut self, dir: &Path) -> Result<ConfigTree, ConfigError> {
        let key = dir.to_path_buf();
        if !self.resolving.insert(key.clone()) {
            return Err(ConfigError::CircularModule(dir.display().to_string()));
        }

        let module = self.load_module_dir(dir)?;
        let mut children = BTreeMap::new();
        for call in module.module_calls.values() {
            if !is_local_source(&call.source) {
                log::debug!(
                    "Skipping module {:?}: source {:?} is not a local path",
                    call.name,
                    call.source
                );
                continue;
            }
            let child_dir = resolve_module_source(dir, &call.source)?;
            log::debug!(
                "Loading module {:?} from {}",
                call.name,
                child_dir.display()
            );
            let child = self.load_tree(&child_dir)?;
            children.insert(call.name.clone(), child);
        }

        self.resolving.remove(&key);
        Ok(ConfigTree { module, children })
    }

    /// Load all configuration files from a directory and merge them into one module
    fn load_module_dir(&self, dir: &Path) -> Result<Module, ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == CONFIG_EXTENSION)
            })
            .collect();

        // Sort for consistent ordering
        files.sort();

        let mut module = Module::default();
        for path in files {
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let filename = path
                .strip_prefix(&self.base_dir)
                .unwrap_or(&path)
                .display()
                .to_string();
            log::debug!("Loading configuration file {}", filename);
            FileReader::new(&filename, &content)?.read_into(&mut module)?;
        }

        Ok(module)
    }
}

fn is_local_source(source: &str) -> bool {
    source.starts_with("./") || source.starts_with("../")
}

/// Resolve a local module source relative to the calling module
fn resolve_module_source(dir: &Path, source: &str) -> Result<PathBuf, ConfigError> {
    let path = dir.join(source);
    if !path.is_dir() {
        return Err(ConfigError::NotFound(path));
    }
    path.canonicalize()
        .map_err(|source| ConfigError::Io { path, source })
}

/// Reads the declarations of one parsed file
struct FileReader<'a> {
    filename: &'a str,
    cst: Cst,
}

impl<'a> FileReader<'a> {
    fn new(filename: &'a str, content: &str) -> Result<Self, ConfigError> {
        let cst = parse_cst(content).map_err(|source| ConfigError::Parse {
            file: filename.to_string(),
            source,
        })?;
        Ok(Self { filename, cst })
    }

    fn range(&self, node: &CstNode) -> SourceRange {
        let span = node.block_def_span();
        SourceRange {
            filename: self.filename.to_string(),
            start: self.cst.position(span.start),
            end: self.cst.position(span.end),
        }
    }

    fn read_into(&self, module: &mut Module) -> Result<(), ConfigError> {
        for block in blocks(&self.cst.root) {
            let (block_type, labels) = header(block);
            match (block_type.as_str(), labels.as_slice()) {
                ("resource", [type_name, name]) => {
                    self.declare(module, block, ResourceMode::Managed, type_name, name)?
                }
                ("data", [type_name, name]) => {
                    self.declare(module, block, ResourceMode::Data, type_name, name)?
                }
                ("module", [name]) => {
                    let source = string_attribute(block, "source").ok_or_else(|| {
                        ConfigError::MissingModuleSource {
                            name: name.clone(),
                            range: self.range(block),
                        }
                    })?;
                    module.module_calls.insert(
                        name.clone(),
                        ModuleCall {
                            name: name.clone(),
                            source,
                            decl_range: self.range(block),
                        },
                    );
                }
                ("terraform", []) => self.read_terraform(module, block)?,
                _ => log::trace!("Ignoring {} block in {}", block_type, self.filename),
            }
        }
        Ok(())
    }

    fn declare(
        &self,
        module: &mut Module,
        block: &CstNode,
        mode: ResourceMode,
        type_name: &str,
        name: &str,
    ) -> Result<(), ConfigError> {
        let resource = Resource::new(mode, type_name, name);
        let address = resource.to_string();
        let range = self.range(block);

        if let Some(previous) = module.resources.get(&address) {
            return Err(ConfigError::DuplicateResource {
                address,
                range,
                previous: previous.decl_range.clone(),
            });
        }
        module.resources.insert(
            address,
            DeclaredResource {
                resource,
                decl_range: range,
            },
        );
        Ok(())
    }

    fn read_terraform(&self, module: &mut Module, block: &CstNode) -> Result<(), ConfigError> {
        for inner in blocks(block) {
            let (block_type, labels) = header(inner);
            match (block_type.as_str(), labels.as_slice()) {
                ("required_providers", []) => {
                    for attr in attributes(inner) {
                        let Some(local_name) = attr.key() else {
                            continue;
                        };
                        let provider = self.required_provider(inner, &local_name, attr)?;
                        module.provider_local_names.insert(local_name, provider);
                    }
                }
                ("backend", [backend_type]) => {
                    let values: HashMap<String, String> = attributes(inner)
                        .filter_map(|attr| {
                            let value = attr.value()?.as_string()?;
                            Some((attr.key()?, value))
                        })
                        .collect();
                    module.backend = Some(BackendDecl {
                        backend_type: backend_type.clone(),
                        attributes: values,
                        decl_range: self.range(inner),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// `name = "source"` or `name = { source = "..." }`; no source means the default namespace
    fn required_provider(
        &self,
        block: &CstNode,
        local_name: &str,
        attr: &CstNode,
    ) -> Result<Provider, ConfigError> {
        let source = match attr.value() {
            Some(value @ CstChild::Token(_)) => value.as_string(),
            Some(CstChild::Node(object)) if object.kind == NodeKind::Object => {
                string_attribute(object, "source")
            }
            _ => None,
        };
        match source {
            Some(source) => {
                Provider::parse_source(&source).map_err(|source| ConfigError::InvalidProvider {
                    name: local_name.to_string(),
                    range: self.range(block),
                    source,
                })
            }
            None => Ok(Provider::new_default(local_name)),
        }
    }
}

fn blocks(node: &CstNode) -> impl Iterator<Item = &CstNode> {
    node.nodes().filter(|n| n.kind == NodeKind::Block)
}

/// Attributes of a block, or items of an object
fn attributes(node: &CstNode) -> impl Iterator<Item = &CstNode> {
    node.nodes()
        .filter(|n| matches!(n.kind, NodeKind::Attribute | NodeKind::ObjectItem))
}

/// Block type and unquoted labels
fn header(block: &CstNode) -> (String, Vec<String>) {
    let mut parts = block.block_header().into_iter().map(|token| {
        crate::formatter::unquote(&token.text).unwrap_or_else(|| token.text.clone())
    });
    let block_type = parts.next().unwrap_or_default();
    (block_type, parts.collect())
}

fn string_attribute(node: &CstNode, name: &str) -> Option<String> {
    attributes(node)
        .find(|attr| attr.key().as_deref() == Some(name))
        .and_then(|attr| attr.value()?.as_string())
}
