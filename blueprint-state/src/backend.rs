//! Backend trait, operation context and error types

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use blueprint_core::config::{BackendDecl, ConfigError, ConfigLoader, ConfigTree};
use blueprint_core::diagnostics::Diagnostic;
use blueprint_core::schema::Schemas;

use crate::state::StateFile;

/// Errors that can occur when interacting with a backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend type is not supported
    #[error("Unsupported backend type: {0}")]
    UnsupportedBackend(String),

    /// Configuration error
    #[error("Backend configuration error: {0}")]
    Configuration(String),

    /// The configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider schema document is missing required structure or is not valid JSON
    #[error("Invalid provider schemas in {path}: {message}")]
    InvalidSchemas { path: PathBuf, message: String },

    /// State file is corrupted or invalid
    #[error("Invalid state file: {0}")]
    InvalidState(String),

    /// Network or I/O error
    #[error("I/O error: {0}")]
    Io(String),
}

impl BackendError {
    /// Create an unsupported backend error
    pub fn unsupported_backend(backend_type: impl Into<String>) -> Self {
        Self::UnsupportedBackend(backend_type.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Short summary used for diagnostics
    pub fn summary(&self) -> &'static str {
        match self {
            BackendError::UnsupportedBackend(_) => "Unsupported backend",
            BackendError::Configuration(_) => "Invalid backend configuration",
            BackendError::Config(_) => "Error loading configuration",
            BackendError::InvalidSchemas { .. } => "Error loading provider schemas",
            BackendError::InvalidState(_) | BackendError::Io(_) => "Error loading state",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.summary(), self.to_string())
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// What an operation needs from the backend
#[derive(Debug, Clone)]
pub struct OperationRequest {
    /// Directory holding the root module
    pub config_dir: PathBuf,
}

/// Everything an operation reads: configuration, provider schemas and state
#[derive(Debug)]
pub struct Context {
    pub config: ConfigTree,
    pub schemas: Schemas,
    pub state: StateFile,
}

/// Trait for backends
///
/// A backend knows where provider schemas and state live and assembles the
/// context an operation runs against.
pub trait Backend {
    /// Read the current state from the backend
    ///
    /// Returns `None` if no state exists (first-time use)
    fn read_state(&self) -> BackendResult<Option<StateFile>>;

    /// Read the schemas of every installed provider
    fn read_schemas(&self) -> BackendResult<Schemas>;

    /// Load configuration, schemas and state for an operation
    fn context(&self, request: &OperationRequest) -> BackendResult<Context> {
        let config = ConfigLoader::new(&request.config_dir)?.load_config()?;
        let schemas = self.read_schemas()?;
        let state = self.read_state()?.unwrap_or_default();
        log::debug!(
            "Context loaded: {} provider schema(s), {} resource(s) in state",
            schemas.providers.len(),
            state.resources.len()
        );
        Ok(Context {
            config,
            schemas,
            state,
        })
    }
}

/// Configuration for a backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend type (e.g., "local")
    pub backend_type: String,
    /// Backend-specific attributes
    pub attributes: HashMap<String, String>,
}

impl BackendConfig {
    /// Configuration used when the root module declares no backend
    pub fn local() -> Self {
        Self {
            backend_type: "local".to_string(),
            attributes: HashMap::new(),
        }
    }

    /// Get a string attribute value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

impl From<&BackendDecl> for BackendConfig {
    fn from(decl: &BackendDecl) -> Self {
        Self {
            backend_type: decl.backend_type.clone(),
            attributes: decl.attributes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let error = BackendError::unsupported_backend("s3");
        assert_eq!(error.to_string(), "Unsupported backend type: s3");
        assert_eq!(error.summary(), "Unsupported backend");

        let diag = BackendError::InvalidState("bad json".to_string()).to_diagnostic();
        assert_eq!(diag.summary, "Error loading state");
        assert_eq!(diag.detail, "Invalid state file: bad json");
    }

    #[test]
    fn test_backend_config_from_decl() {
        let decl = BackendDecl {
            backend_type: "local".to_string(),
            attributes: HashMap::from([("path".to_string(), "custom.json".to_string())]),
            decl_range: blueprint_core::diagnostics::SourceRange {
                filename: "main.tf".to_string(),
                start: blueprint_core::diagnostics::Pos { line: 1, column: 1 },
                end: blueprint_core::diagnostics::Pos { line: 1, column: 2 },
            },
        };
        let config = BackendConfig::from(&decl);
        assert_eq!(config.get_string("path"), Some("custom.json"));
        assert_eq!(config.get_string("other"), None);
        assert_eq!(BackendConfig::local().backend_type, "local");
    }
}
