//! Backend implementations

mod local;

pub use local::LocalBackend;

use std::path::Path;

use crate::backend::{Backend, BackendConfig, BackendError, BackendResult};

/// Create a backend from configuration
///
/// Relative paths in the configuration are resolved against `config_dir`.
pub fn create_backend(config: &BackendConfig, config_dir: &Path) -> BackendResult<Box<dyn Backend>> {
    log::debug!("Using {} backend", config.backend_type);
    match config.backend_type.as_str() {
        "local" => Ok(Box::new(LocalBackend::from_config(config, config_dir)?)),
        other => Err(BackendError::unsupported_backend(other)),
    }
}
