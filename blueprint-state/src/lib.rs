//! Blueprint State Management
//!
//! This crate assembles the context an operation runs against: the loaded
//! configuration, the provider schemas and the recorded state.
//!
//! # Overview
//!
//! - **StateFile**: recorded resources and their instances
//! - **Backend**: a trait for backends that know where schemas and state live
//! - **LocalBackend**: files next to the configuration
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use blueprint_state::{create_backend, BackendConfig, OperationRequest};
//!
//! let dir = Path::new(".");
//! let backend = create_backend(&BackendConfig::local(), dir)?;
//! let ctx = backend.context(&OperationRequest { config_dir: dir.to_path_buf() })?;
//! println!("{} resource(s) in state", ctx.state.resources.len());
//! # Ok::<(), blueprint_state::BackendError>(())
//! ```

pub mod backend;
pub mod backends;
pub mod state;

// Re-export main types for convenience
pub use backend::{Backend, BackendConfig, BackendError, BackendResult, Context, OperationRequest};
pub use backends::{LocalBackend, create_backend};
pub use state::{InstanceState, ResourceState, StateFile};
