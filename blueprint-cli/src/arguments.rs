//! Arguments of the `add` command

use std::path::PathBuf;

use clap::{ArgAction, Args};

use blueprint_core::addrs::{AbsResourceInstance, Provider};
use blueprint_core::diagnostics::{Diagnostic, Diagnostics};
use blueprint_core::render::RenderOptions;

/// Flags accepted by `blueprint add`
#[derive(Debug, Clone, Default, Args)]
pub struct AddFlags {
    /// Include optional attributes
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = false, default_missing_value = "true", require_equals = true)]
    pub optional: bool,

    /// Write attribute descriptions as comments
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = false, default_missing_value = "true", require_equals = true)]
    pub descriptions: bool,

    /// Fill in values instead of placeholders
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = false, default_missing_value = "true", require_equals = true)]
    pub defaults: bool,

    /// Produce machine-readable output
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = false, default_missing_value = "true", require_equals = true)]
    pub json: bool,

    /// Copy values from a resource instance recorded in state
    #[arg(long, value_name = "ADDRESS")]
    pub from_existing_resource: Option<String>,

    /// Provider to use, as [hostname/][namespace/]name
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Write the template to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Address of the resource instance to add
    #[arg(value_name = "ADDRESS")]
    pub addresses: Vec<String>,
}

/// Output format of a command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewType {
    #[default]
    Human,
    Json,
}

/// Validated arguments of the `add` command
#[derive(Debug, Clone, PartialEq)]
pub struct Add {
    pub addr: AbsResourceInstance,
    /// Instance whose recorded attributes seed the values
    pub from_existing: Option<AbsResourceInstance>,
    pub options: RenderOptions,
    pub view_type: ViewType,
}

const POSITIONAL_DETAIL: &str = "Expected exactly one positional argument.";
const ADDRESS_DETAIL: &str =
    "This command requires that the address references one specific resource instance.";

/// Validate the flags of the `add` command
///
/// All problems are collected before returning, so the user sees every
/// argument error at once.
pub fn parse_add(flags: &AddFlags) -> Result<Add, Diagnostics> {
    let mut diags = Diagnostics::new();

    let provider = match flags.provider.as_deref() {
        Some(source) => match Provider::parse_source(source) {
            Ok(provider) => Some(provider),
            Err(e) => {
                log::debug!("{}", e);
                diags.push(Diagnostic::error(
                    format!("Invalid provider string: {}", source),
                    "The \"provider\" argument must be in the format \"[hostname/][namespace/]name\"",
                ));
                None
            }
        },
        None => None,
    };

    let addr = match flags.addresses.as_slice() {
        [] => {
            diags.push(Diagnostic::error(
                "Too few command line arguments",
                POSITIONAL_DETAIL,
            ));
            None
        }
        [arg] => parse_instance(arg, &mut diags),
        _ => {
            diags.push(Diagnostic::error(
                "Too many command line arguments",
                POSITIONAL_DETAIL,
            ));
            None
        }
    };

    let from_existing = flags
        .from_existing_resource
        .as_deref()
        .and_then(|arg| parse_instance(arg, &mut diags));

    if let (Some(addr), Some(existing)) = (&addr, &from_existing) {
        let target = &addr.containing_resource().type_name;
        let source = &existing.containing_resource().type_name;
        if target != source {
            diags.push(Diagnostic::error(
                "Resource type mismatch",
                format!(
                    "The resource {} cannot take values from {}: the resource types {} and {} differ.",
                    addr, existing, target, source
                ),
            ));
        }
    }

    match addr {
        Some(addr) if !diags.has_errors() => Ok(Add {
            addr,
            from_existing,
            options: RenderOptions {
                optional: flags.optional,
                descriptions: flags.descriptions,
                defaults: flags.defaults,
                out_path: flags.out.clone(),
                provider,
            },
            view_type: if flags.json {
                ViewType::Json
            } else {
                ViewType::Human
            },
        }),
        _ => Err(diags),
    }
}

fn parse_instance(arg: &str, diags: &mut Diagnostics) -> Option<AbsResourceInstance> {
    match AbsResourceInstance::parse(arg) {
        Ok(addr) => Some(addr),
        Err(e) => {
            log::debug!("{}", e);
            diags.push(Diagnostic::error(
                format!("Error parsing resource address: {}", arg),
                ADDRESS_DETAIL,
            ));
            None
        }
    }
}
