//! Resolver - Place a resource address in the configuration and pick its provider

use crate::addrs::{AbsResourceInstance, Provider};
use crate::config::{ConfigTree, Module};
use crate::diagnostics::{Diagnostic, SourceRange};

/// Resolution error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error(
        "The resource {address} is already in this configuration at {decl_range}. Resource names must be unique per type in each module."
    )]
    AlreadyExists {
        address: String,
        decl_range: SourceRange,
    },
}

impl ResolveError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::AlreadyExists { decl_range, .. } => {
                Diagnostic::error("Resource already in configuration", self.to_string())
                    .with_subject(decl_range.clone())
            }
        }
    }
}

/// Where a new resource goes and which provider owns it
#[derive(Debug)]
pub struct Resolution<'a> {
    /// Module that would hold the resource; `None` when the module path is not declared
    pub module: Option<&'a Module>,
    pub provider: Provider,
    /// Local name of the provider in the module, used for the `provider` argument
    pub local_name: Option<String>,
}

/// Resolve the module and provider for a resource address
///
/// An explicit provider wins; otherwise the provider is implied by the
/// resource type prefix, through the module's `required_providers` when the
/// module is known.
pub fn resolve<'a>(
    addr: &AbsResourceInstance,
    explicit_provider: Option<&Provider>,
    config: &'a ConfigTree,
) -> Result<Resolution<'a>, ResolveError> {
    let module = if addr.module.is_root() {
        Some(config.root())
    } else {
        config
            .descendant(&addr.module.module())
            .map(|tree| &tree.module)
    };

    match module {
        Some(module) => {
            if let Some(existing) = module.resource(addr.containing_resource()) {
                return Err(ResolveError::AlreadyExists {
                    address: addr.to_string(),
                    decl_range: existing.decl_range.clone(),
                });
            }
        }
        None => log::debug!(
            "Module {} is not declared; assuming the resource does not exist",
            addr.module
        ),
    }

    let (provider, local_name) = match explicit_provider {
        Some(provider) => {
            let local_name = module.and_then(|m| m.local_name_for_provider(provider));
            (provider.clone(), local_name)
        }
        None => {
            let implied = addr.containing_resource().implied_provider();
            let provider = match module {
                Some(m) => m.implied_provider_for_unqualified_type(implied),
                None => Provider::new_default(implied),
            };
            (provider, None)
        }
    };

    log::debug!(
        "Resolved {} to provider {} (local name {:?})",
        addr,
        provider,
        local_name
    );

    Ok(Resolution {
        module,
        provider,
        local_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addrs::{Resource, ResourceMode};
    use crate::config::DeclaredResource;
    use crate::diagnostics::Pos;

    fn happycorp() -> Provider {
        Provider::parse_source("happycorp/test").unwrap()
    }

    /// Root maps `test` to happycorp/test and declares `test_instance.exists`;
    /// `child` uses the default provider.
    fn config() -> ConfigTree {
        let mut root = ConfigTree::default();
        root.module
            .provider_local_names
            .insert("test".to_string(), happycorp());
        let existing = Resource::new(ResourceMode::Managed, "test_instance", "exists");
        root.module.resources.insert(
            existing.to_string(),
            DeclaredResource {
                resource: existing,
                decl_range: SourceRange {
                    filename: "main.tf".to_string(),
                    start: Pos { line: 1, column: 1 },
                    end: Pos {
                        line: 1,
                        column: 34,
                    },
                },
            },
        );
        root.children
            .insert("child".to_string(), ConfigTree::default());
        root
    }

    fn addr(s: &str) -> AbsResourceInstance {
        AbsResourceInstance::parse(s).unwrap()
    }

    #[test]
    fn root_module_uses_required_providers() {
        let config = config();
        let res = resolve(&addr("test_instance.new"), None, &config).unwrap();
        assert!(res.module.is_some());
        assert_eq!(res.provider, happycorp());
        assert_eq!(res.local_name, None);
    }

    #[test]
    fn child_module_uses_default_provider() {
        let config = config();
        let res = resolve(&addr("module.child.test_instance.new"), None, &config).unwrap();
        assert!(res.module.is_some());
        assert_eq!(res.provider, Provider::new_default("test"));
    }

    #[test]
    fn unknown_module_falls_back_to_default() {
        let config = config();
        let res = resolve(&addr("module.nope.test_instance.exists"), None, &config).unwrap();
        assert!(res.module.is_none());
        assert_eq!(res.provider, Provider::new_default("test"));
        assert_eq!(res.local_name, None);
    }

    #[test]
    fn explicit_provider_uses_local_name() {
        let config = config();
        let res = resolve(&addr("test_instance.new"), Some(&happycorp()), &config).unwrap();
        assert_eq!(res.provider, happycorp());
        assert_eq!(res.local_name.as_deref(), Some("test"));

        let other = Provider::parse_source("acme/test").unwrap();
        let res = resolve(&addr("test_instance.new"), Some(&other), &config).unwrap();
        assert_eq!(res.provider, other);
        assert_eq!(res.local_name, None);
    }

    #[test]
    fn existing_resource_is_a_conflict() {
        let config = config();
        let err = resolve(&addr("test_instance.exists"), None, &config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The resource test_instance.exists is already in this configuration at main.tf:1,1-34. Resource names must be unique per type in each module."
        );
        let diag = err.to_diagnostic();
        assert_eq!(diag.summary, "Resource already in configuration");
        assert!(diag.subject.is_some());

        // An instance key does not make it a different resource
        assert!(resolve(&addr("test_instance.exists[1]"), None, &config).is_err());
        // A data resource with the same type and name is distinct
        assert!(resolve(&addr("data.test_instance.exists"), None, &config).is_ok());
    }
}
