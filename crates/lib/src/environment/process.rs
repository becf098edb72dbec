use std::collections::BTreeMap;

use tracing::trace;

use super::{EnvStoreError, validate_name, validate_value};

/// The environment inherited by subprocesses spawned from here.
pub trait ProcessEnvironment {
  /// All variables with valid unicode names and values.
  fn vars(&self) -> BTreeMap<String, String>;

  fn get(&self, name: &str) -> Option<String>;

  fn set(&mut self, name: &str, value: &str) -> Result<(), EnvStoreError>;

  fn remove(&mut self, name: &str) -> Result<(), EnvStoreError>;
}

/// The real process environment.
///
/// Writes go through `std::env`, so only one `OsEnvironment` should be used
/// at a time and never while other threads read the environment.
#[derive(Debug, Default)]
pub struct OsEnvironment {
  _private: (),
}

impl OsEnvironment {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ProcessEnvironment for OsEnvironment {
  fn vars(&self) -> BTreeMap<String, String> {
    std::env::vars_os()
      .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
      .collect()
  }

  fn get(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }

  fn set(&mut self, name: &str, value: &str) -> Result<(), EnvStoreError> {
    validate_name(name)?;
    validate_value(name, value)?;
    trace!(name, "setting process variable");
    // SAFETY: name and value were checked for '=' and NUL above, and the
    // environment is only mutated from the single task that owns this value.
    unsafe {
      std::env::set_var(name, value);
    }
    Ok(())
  }

  fn remove(&mut self, name: &str) -> Result<(), EnvStoreError> {
    validate_name(name)?;
    trace!(name, "removing process variable");
    // SAFETY: see `set`.
    unsafe {
      std::env::remove_var(name);
    }
    Ok(())
  }
}

/// An environment held in memory, for tests and dry runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryEnvironment {
  vars: BTreeMap<String, String>,
}

impl MemoryEnvironment {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_vars(vars: BTreeMap<String, String>) -> Self {
    Self { vars }
  }
}

impl ProcessEnvironment for MemoryEnvironment {
  fn vars(&self) -> BTreeMap<String, String> {
    self.vars.clone()
  }

  fn get(&self, name: &str) -> Option<String> {
    self.vars.get(name).cloned()
  }

  fn set(&mut self, name: &str, value: &str) -> Result<(), EnvStoreError> {
    validate_name(name)?;
    validate_value(name, value)?;
    self.vars.insert(name.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&mut self, name: &str) -> Result<(), EnvStoreError> {
    validate_name(name)?;
    self.vars.remove(name);
    Ok(())
  }
}
