//! The `add` command
//!
//! Generates a configuration template for one resource instance from the
//! schema of the provider that owns it.

use std::path::{Path, PathBuf};

use blueprint_core::config::ConfigLoader;
use blueprint_core::diagnostics::{Diagnostic, Diagnostics};
use blueprint_core::resolver::resolve;
use blueprint_state::{BackendConfig, BackendError, OperationRequest, create_backend};

use crate::arguments::{Add, AddFlags, parse_add};
use crate::views::{AddView, View};

pub struct AddCommand {
    pub view: View,
    /// Directory holding the root module
    pub working_dir: PathBuf,
}

impl AddCommand {
    /// Run the command and return the process exit code
    pub fn run(self, flags: &AddFlags) -> i32 {
        let AddCommand {
            mut view,
            working_dir,
        } = self;

        log::debug!("add: parsing arguments");
        let mut args = match parse_add(flags) {
            Ok(args) => args,
            Err(diags) => {
                view.diagnostics(&diags);
                return 1;
            }
        };
        args.options.out_path = args.options.out_path.take().map(|p| working_dir.join(p));

        let mut view = AddView::new(args.view_type, view, &args);
        match execute(&working_dir, &args, &mut view) {
            Ok(warnings) => {
                if !warnings.is_empty() {
                    view.diagnostics(&warnings);
                }
                0
            }
            Err(diags) => {
                view.diagnostics(&diags);
                1
            }
        }
    }
}

/// Every step up to and including rendering; returns warnings on success
fn execute(working_dir: &Path, args: &Add, view: &mut AddView) -> Result<Diagnostics, Diagnostics> {
    let mut warnings = Diagnostics::new();

    log::debug!("add: resolving backend");
    let loader = ConfigLoader::new(working_dir)
        .map_err(|e| Diagnostic::error("Error initializing config loader", e.to_string()))?;
    let backend_config = loader
        .backend_config()
        .map_err(|e| BackendError::from(e).to_diagnostic())?
        .map(|decl| BackendConfig::from(&decl))
        .unwrap_or_else(BackendConfig::local);
    let backend = create_backend(&backend_config, loader.base_dir())
        .map_err(|e| e.to_diagnostic())?;

    log::debug!("add: resolving context");
    let ctx = backend
        .context(&OperationRequest {
            config_dir: loader.base_dir().to_path_buf(),
        })
        .map_err(|e| e.to_diagnostic())?;

    log::debug!("add: resolving address and provider");
    let resolution = resolve(&args.addr, args.options.provider.as_ref(), &ctx.config)
        .map_err(|e| e.to_diagnostic())?;

    log::debug!("add: looking up schema");
    if ctx.schemas.provider(&resolution.provider).is_none() {
        return Err(Diagnostic::error(
            "Missing schema for provider",
            format!(
                "No schema found for provider {}. Please verify that this provider exists in the configuration.",
                resolution.provider
            ),
        )
        .into());
    }

    let resource = args.addr.containing_resource();
    let schema = ctx
        .schemas
        .resource_type_config(&resolution.provider, resource.mode, &resource.type_name)
        .ok_or_else(|| {
            Diagnostic::error(
                "Missing resource schema from provider",
                format!("No resource schema found for {}.", resource.type_name),
            )
        })?;

    let prior = match &args.from_existing {
        Some(existing) => {
            let instance = ctx.state.find_instance(existing).ok_or_else(|| {
                Diagnostic::error(
                    "Existing resource not found",
                    format!("The resource instance {} is not recorded in state.", existing),
                )
            })?;
            if !args.options.defaults {
                warnings.push(Diagnostic::warning(
                    "Existing resource values not used",
                    "Values from -from-existing-resource are only filled in together with -defaults.",
                ));
            }
            Some(instance.value())
        }
        None => None,
    };

    log::debug!("add: rendering {}", args.addr);
    view.resource(
        &args.addr,
        schema,
        resolution.local_name.as_deref(),
        prior.as_ref(),
    )
    .map_err(|e| e.to_diagnostic())?;

    Ok(warnings)
}
