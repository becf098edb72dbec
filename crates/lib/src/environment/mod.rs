//! Environment variable snapshots and their application.
//!
//! An activation of the environment yields an [`EnvironmentSnapshot`]: the
//! variables it wants set or unset. [`EnvironmentApplier`] writes a snapshot
//! into two consumers:
//!
//! - a persistent [`EnvCollection`] that future sessions start from, and
//! - the [`ProcessEnvironment`] inherited by subprocesses.
//!
//! Already-open sessions do not pick up the collection on their own, so only
//! the keys that changed since the previous snapshot are patched into them
//! through [`SessionHandle`].

mod applier;
mod collection;
mod process;
mod session;
mod snapshot;

use std::io;

use thiserror::Error;

pub use applier::{AppliedState, EnvironmentApplier};
pub use collection::{EnvCollection, EnvMutation, FileCollection, MemoryCollection, render_exports};
pub use process::{MemoryEnvironment, OsEnvironment, ProcessEnvironment};
pub use session::{PatchFileSession, SessionHandle};
pub use snapshot::{EnvDiff, EnvironmentSnapshot, parse_env_output, snapshot_from_activation};

/// Errors raised when a consumer rejects a write.
#[derive(Debug, Error)]
pub enum EnvStoreError {
  /// The variable name cannot be stored.
  #[error("invalid environment variable name: {0:?}")]
  InvalidName(String),

  /// The value cannot be stored.
  #[error("invalid value for environment variable {0}")]
  InvalidValue(String),

  /// Failed to read persisted state.
  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  /// Failed to write persisted state.
  #[error("failed to write {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: io::Error,
  },

  /// Persisted state is not valid JSON.
  #[error("failed to parse {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  /// State could not be serialized.
  #[error("failed to serialize environment state: {0}")]
  Serialize(#[source] serde_json::Error),
}

/// Reject names the OS environment cannot hold.
pub(crate) fn validate_name(name: &str) -> Result<(), EnvStoreError> {
  if name.is_empty() || name.contains('=') || name.contains('\0') {
    return Err(EnvStoreError::InvalidName(name.to_string()));
  }
  Ok(())
}

pub(crate) fn validate_value(name: &str, value: &str) -> Result<(), EnvStoreError> {
  if value.contains('\0') {
    return Err(EnvStoreError::InvalidValue(name.to_string()));
  }
  Ok(())
}
