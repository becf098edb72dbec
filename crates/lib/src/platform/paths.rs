use crate::consts::{
  APP_NAME, COLLECTION_FILENAME, CONFIG_FILENAME, DATA_DIR_ENV, ENV_DIR_NAME, LOCK_FILENAME, MANIFEST_FILENAME,
  SESSIONS_DIR_NAME, STATE_FILENAME,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
  #[error("cannot locate the home directory: HOME is not set")]
  HomeNotSet,
}

/// Returns the user's home directory
pub fn home_dir() -> Result<PathBuf, PathError> {
  std::env::var_os("HOME")
    .filter(|home| !home.is_empty())
    .map(PathBuf::from)
    .ok_or(PathError::HomeNotSet)
}

/// Value of an XDG base directory variable, or `fallback` under the home directory.
fn xdg_dir(var: &str, fallback: &[&str]) -> Result<PathBuf, PathError> {
  match std::env::var_os(var).filter(|v| !v.is_empty()) {
    Some(dir) => Ok(PathBuf::from(dir)),
    None => Ok(fallback.iter().fold(home_dir()?, |path, part| path.join(part))),
  }
}

/// Returns the directory for configuration files for the application
pub fn config_dir() -> Result<PathBuf, PathError> {
  Ok(xdg_dir("XDG_CONFIG_HOME", &[".config"])?.join(APP_NAME))
}

/// Returns the directory for data files for the application.
///
/// `ENVLENS_DATA_DIR` takes precedence over the XDG location.
pub fn data_dir() -> Result<PathBuf, PathError> {
  if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
    return Ok(PathBuf::from(path));
  }
  Ok(xdg_dir("XDG_DATA_HOME", &[".local", "share"])?.join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf, PathError> {
  Ok(config_dir()?.join(CONFIG_FILENAME))
}

pub fn state_path() -> Result<PathBuf, PathError> {
  Ok(data_dir()?.join(STATE_FILENAME))
}

pub fn collection_path() -> Result<PathBuf, PathError> {
  Ok(data_dir()?.join(COLLECTION_FILENAME))
}

/// Directory where open sessions register their patch files.
pub fn sessions_dir() -> Result<PathBuf, PathError> {
  Ok(data_dir()?.join(SESSIONS_DIR_NAME))
}

/// Directory holding the manifest and lock file of the environment rooted at `dir`.
pub fn env_dir(dir: &Path) -> PathBuf {
  dir.join(ENV_DIR_NAME).join("env")
}

/// Path of the declarative manifest for the environment rooted at `dir`.
pub fn manifest_path(dir: &Path) -> PathBuf {
  env_dir(dir).join(MANIFEST_FILENAME)
}

/// Path of the lock file for the environment rooted at `dir`.
pub fn lock_path(dir: &Path) -> PathBuf {
  env_dir(dir).join(LOCK_FILENAME)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn xdg_config_home_takes_precedence() {
    temp_env::with_vars(
      [
        ("XDG_CONFIG_HOME", Some("/custom/config")),
        ("HOME", Some("/home/user")),
      ],
      || {
        assert_eq!(config_dir().unwrap(), PathBuf::from("/custom/config").join(APP_NAME));
      },
    );
  }

  #[test]
  #[serial]
  fn xdg_fallback_to_home_directories() {
    temp_env::with_vars(
      [
        ("XDG_CONFIG_HOME", None::<&str>),
        ("XDG_DATA_HOME", None::<&str>),
        (DATA_DIR_ENV, None::<&str>),
        ("HOME", Some("/home/user")),
      ],
      || {
        assert_eq!(config_dir().unwrap(), PathBuf::from("/home/user/.config").join(APP_NAME));
        assert_eq!(data_dir().unwrap(), PathBuf::from("/home/user/.local/share").join(APP_NAME));
      },
    );
  }

  #[test]
  #[serial]
  fn data_dir_override_wins() {
    temp_env::with_vars(
      [(DATA_DIR_ENV, Some("/tmp/envlens-data")), ("XDG_DATA_HOME", Some("/xdg"))],
      || {
        assert_eq!(data_dir().unwrap(), PathBuf::from("/tmp/envlens-data"));
        assert_eq!(state_path().unwrap(), PathBuf::from("/tmp/envlens-data/state.json"));
        assert_eq!(sessions_dir().unwrap(), PathBuf::from("/tmp/envlens-data/sessions"));
      },
    );
  }

  #[test]
  #[serial]
  fn missing_home_is_an_error() {
    temp_env::with_vars(
      [
        ("HOME", None::<&str>),
        ("XDG_CONFIG_HOME", None::<&str>),
        ("XDG_DATA_HOME", None::<&str>),
        (DATA_DIR_ENV, None::<&str>),
      ],
      || {
        assert_eq!(home_dir(), Err(PathError::HomeNotSet));
        assert_eq!(config_path(), Err(PathError::HomeNotSet));
        assert_eq!(state_path(), Err(PathError::HomeNotSet));
      },
    );
  }

  #[test]
  #[serial]
  fn explicit_dirs_do_not_need_home() {
    temp_env::with_vars(
      [
        ("HOME", None::<&str>),
        ("XDG_CONFIG_HOME", Some("/xdg/config")),
        (DATA_DIR_ENV, Some("/data")),
      ],
      || {
        assert_eq!(config_path().unwrap(), PathBuf::from("/xdg/config/envlens/config.toml"));
        assert_eq!(collection_path().unwrap(), PathBuf::from("/data/collection.json"));
      },
    );
  }

  #[test]
  fn environment_files_live_under_dot_flox() {
    let root = Path::new("/work/project");
    assert_eq!(manifest_path(root), PathBuf::from("/work/project/.flox/env/manifest.toml"));
    assert_eq!(lock_path(root), PathBuf::from("/work/project/.flox/env/manifest.lock"));
  }
}
