//! Persistent variable collections.
//!
//! A collection records how future sessions should adjust each variable:
//! replace it, append to it, or prepend to it. Deleting a key removes the
//! instruction altogether.
//!
//! # File Format
//!
//! ```json
//! {
//!   "GREETING": { "type": "replace", "value": "hi" },
//!   "PATH": { "type": "prepend", "value": "/env/bin" }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EnvStoreError, validate_name, validate_value};
use crate::platform::shell::Shell;

/// How a session should adjust one variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum EnvMutation {
  Replace(String),
  Append(String),
  Prepend(String),
}

impl EnvMutation {
  pub fn value(&self) -> &str {
    match self {
      EnvMutation::Replace(value) | EnvMutation::Append(value) | EnvMutation::Prepend(value) => value,
    }
  }
}

fn validate(name: &str, mutation: &EnvMutation) -> Result<(), EnvStoreError> {
  validate_name(name)?;
  validate_value(name, mutation.value())
}

/// A store of per-variable mutations applied to newly started sessions.
pub trait EnvCollection {
  /// Current mutations, ordered by variable name.
  fn entries(&self) -> &BTreeMap<String, EnvMutation>;

  /// Record a mutation for `name`, replacing any earlier one.
  fn set(&mut self, name: &str, mutation: EnvMutation) -> Result<(), EnvStoreError>;

  /// Drop the mutation for `name`, if any.
  fn delete(&mut self, name: &str) -> Result<(), EnvStoreError>;

  /// Drop every mutation.
  fn clear(&mut self) -> Result<(), EnvStoreError>;

  fn replace(&mut self, name: &str, value: &str) -> Result<(), EnvStoreError> {
    self.set(name, EnvMutation::Replace(value.to_string()))
  }

  fn append(&mut self, name: &str, value: &str) -> Result<(), EnvStoreError> {
    self.set(name, EnvMutation::Append(value.to_string()))
  }

  fn prepend(&mut self, name: &str, value: &str) -> Result<(), EnvStoreError> {
    self.set(name, EnvMutation::Prepend(value.to_string()))
  }

  fn get(&self, name: &str) -> Option<&EnvMutation> {
    self.entries().get(name)
  }
}

/// An in-memory collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryCollection {
  entries: BTreeMap<String, EnvMutation>,
}

impl MemoryCollection {
  pub fn new() -> Self {
    Self::default()
  }
}

impl EnvCollection for MemoryCollection {
  fn entries(&self) -> &BTreeMap<String, EnvMutation> {
    &self.entries
  }

  fn set(&mut self, name: &str, mutation: EnvMutation) -> Result<(), EnvStoreError> {
    validate(name, &mutation)?;
    self.entries.insert(name.to_string(), mutation);
    Ok(())
  }

  fn delete(&mut self, name: &str) -> Result<(), EnvStoreError> {
    self.entries.remove(name);
    Ok(())
  }

  fn clear(&mut self) -> Result<(), EnvStoreError> {
    self.entries.clear();
    Ok(())
  }
}

/// A collection persisted as JSON, written through on every change.
#[derive(Debug, Clone)]
pub struct FileCollection {
  path: PathBuf,
  entries: BTreeMap<String, EnvMutation>,
}

impl FileCollection {
  /// Open the collection at `path`; a missing file is an empty collection.
  pub fn open(path: impl Into<PathBuf>) -> Result<Self, EnvStoreError> {
    let path = path.into();
    let entries = match fs::read_to_string(&path) {
      Ok(content) => serde_json::from_str(&content).map_err(|source| EnvStoreError::Parse {
        path: path.display().to_string(),
        source,
      })?,
      Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
      Err(source) => {
        return Err(EnvStoreError::Read {
          path: path.display().to_string(),
          source,
        });
      }
    };

    debug!(path = %path.display(), entries = entries.len(), "opened environment collection");
    Ok(Self { path, entries })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn persist(&self) -> Result<(), EnvStoreError> {
    write_json_atomic(&self.path, &self.entries)
  }
}

impl EnvCollection for FileCollection {
  fn entries(&self) -> &BTreeMap<String, EnvMutation> {
    &self.entries
  }

  fn set(&mut self, name: &str, mutation: EnvMutation) -> Result<(), EnvStoreError> {
    validate(name, &mutation)?;
    self.entries.insert(name.to_string(), mutation);
    self.persist()
  }

  fn delete(&mut self, name: &str) -> Result<(), EnvStoreError> {
    if self.entries.remove(name).is_some() {
      self.persist()?;
    }
    Ok(())
  }

  fn clear(&mut self) -> Result<(), EnvStoreError> {
    self.entries.clear();
    self.persist()
  }
}

/// Write `value` as pretty JSON via a temp file and rename.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), EnvStoreError> {
  let write_err = |source| EnvStoreError::Write {
    path: path.display().to_string(),
    source,
  };

  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(write_err)?;
  }

  let content = serde_json::to_string_pretty(value).map_err(EnvStoreError::Serialize)?;
  let temp_path = path.with_extension("json.tmp");
  fs::write(&temp_path, content).map_err(write_err)?;
  fs::rename(&temp_path, path).map_err(write_err)?;
  Ok(())
}

/// Render a collection as statements for `shell`.
pub fn render_exports(entries: &BTreeMap<String, EnvMutation>, shell: Shell) -> String {
  entries
    .iter()
    .map(|(name, mutation)| match mutation {
      EnvMutation::Replace(value) => shell.export_var(name, value),
      EnvMutation::Append(value) => shell.append_path(name, value),
      EnvMutation::Prepend(value) => shell.prepend_path(name, value),
    })
    .map(|line| line + "\n")
    .collect()
}
