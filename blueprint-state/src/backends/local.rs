//! Local file backend
//!
//! State lives in a JSON file next to the configuration (default:
//! `blueprint.state.json`); provider schemas are read from
//! `.blueprint/schemas.json`.

use std::path::{Path, PathBuf};

use blueprint_core::schema::Schemas;

use crate::backend::{Backend, BackendConfig, BackendError, BackendResult};
use crate::state::StateFile;

/// Local file backend
#[derive(Debug, Clone)]
pub struct LocalBackend {
    /// Path to the state file
    state_path: PathBuf,
    /// Path to the provider schema document
    schemas_path: PathBuf,
}

impl LocalBackend {
    /// Default state file name
    pub const DEFAULT_STATE_FILE: &'static str = "blueprint.state.json";

    /// Provider schema document, relative to the configuration directory
    pub const SCHEMAS_FILE: &'static str = ".blueprint/schemas.json";

    /// Create a LocalBackend with default paths inside `dir`
    pub fn new(dir: &Path) -> Self {
        Self::with_path(dir, dir.join(Self::DEFAULT_STATE_FILE))
    }

    /// Create a LocalBackend with a specific state file path
    pub fn with_path(dir: &Path, state_path: PathBuf) -> Self {
        Self {
            state_path,
            schemas_path: dir.join(Self::SCHEMAS_FILE),
        }
    }

    /// Create a LocalBackend from configuration
    pub fn from_config(config: &BackendConfig, dir: &Path) -> BackendResult<Self> {
        if let Some(unknown) = config.attributes.keys().find(|k| k.as_str() != "path") {
            return Err(BackendError::configuration(format!(
                "unsupported argument \"{}\" for the local backend",
                unknown
            )));
        }

        let path = config
            .get_string("path")
            .map(|p| dir.join(p))
            .unwrap_or_else(|| dir.join(Self::DEFAULT_STATE_FILE));

        Ok(Self::with_path(dir, path))
    }
}

impl Backend for LocalBackend {
    fn read_state(&self) -> BackendResult<Option<StateFile>> {
        if !self.state_path.exists() {
            log::debug!("No state file at {}", self.state_path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.state_path)
            .map_err(|e| BackendError::Io(format!("Failed to read state file: {}", e)))?;

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse state file: {}", e))
        })?;

        Ok(Some(state))
    }

    fn read_schemas(&self) -> BackendResult<Schemas> {
        if !self.schemas_path.exists() {
            log::debug!("No provider schemas at {}", self.schemas_path.display());
            return Ok(Schemas::default());
        }

        let content = std::fs::read_to_string(&self.schemas_path)
            .map_err(|e| BackendError::Io(format!("Failed to read provider schemas: {}", e)))?;

        Schemas::from_json(&content).map_err(|e| BackendError::InvalidSchemas {
            path: self.schemas_path.clone(),
            message: e.to_string(),
        })
    }
}
