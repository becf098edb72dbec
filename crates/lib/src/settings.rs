//! User settings.
//!
//! Read from `config.toml` in the config directory, then overridden by
//! `ENVLENS_*` environment variables. A missing file means defaults.
//!
//! ```toml
//! cli-binary = "/opt/flox/bin/flox"
//! debounce-ms = 250
//! max-patched-sessions = 4
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  CLI_BINARY_ENV, DEBOUNCE_ENV, DEFAULT_CLI_BINARY, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_PATCHED_SESSIONS,
  MAX_SESSIONS_ENV,
};
use crate::platform::paths::{PathError, config_path};

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("failed to read settings from {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid settings file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid value for {var}: {value:?}")]
  InvalidOverride { var: &'static str, value: String },

  #[error(transparent)]
  Location(#[from] PathError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
  /// External environment tool to run.
  pub cli_binary: PathBuf,
  /// Quiet period before file events trigger a reload.
  pub debounce_ms: u64,
  /// Upper bound on open sessions patched per activation.
  pub max_patched_sessions: usize,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      cli_binary: PathBuf::from(DEFAULT_CLI_BINARY),
      debounce_ms: DEFAULT_DEBOUNCE_MS,
      max_patched_sessions: DEFAULT_MAX_PATCHED_SESSIONS,
    }
  }
}

impl Settings {
  /// Load from the default config location with environment overrides.
  pub fn load() -> Result<Self, SettingsError> {
    Self::load_from(&config_path()?)
  }

  /// Load from `path` with environment overrides.
  pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
    let mut settings = match fs::read_to_string(path) {
      Ok(content) => toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
      })?,
      Err(e) if e.kind() == io::ErrorKind::NotFound => Settings::default(),
      Err(source) => {
        return Err(SettingsError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    settings.apply_env_overrides()?;
    debug!(path = %path.display(), ?settings, "loaded settings");
    Ok(settings)
  }

  fn apply_env_overrides(&mut self) -> Result<(), SettingsError> {
    if let Some(binary) = std::env::var_os(CLI_BINARY_ENV).filter(|v| !v.is_empty()) {
      self.cli_binary = PathBuf::from(binary);
    }
    if let Some(ms) = parse_override(DEBOUNCE_ENV)? {
      self.debounce_ms = ms;
    }
    if let Some(max) = parse_override(MAX_SESSIONS_ENV)? {
      self.max_patched_sessions = max;
    }
    Ok(())
  }

  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }
}

fn parse_override<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, SettingsError> {
  match std::env::var(var) {
    Ok(value) if value.trim().is_empty() => Ok(None),
    Ok(value) => value
      .trim()
      .parse()
      .map(Some)
      .map_err(|_| SettingsError::InvalidOverride { var, value }),
    Err(_) => Ok(None),
  }
}
