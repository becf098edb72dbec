//! Best-effort loading of an environment's manifest and lock file.
//!
//! Both files are re-read on every call. A missing file leaves its slot
//! empty; a malformed file is logged and also leaves its slot empty. Neither
//! case is reported to the caller as an error.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::lock::LockFile;
use crate::manifest::Manifest;
use crate::platform::paths::{lock_path, manifest_path};

/// The manifest and lock file of one environment, as read in a single pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedEnvironment {
  /// Directory the environment is rooted at.
  pub dir: PathBuf,
  /// Parsed manifest, if present and well-formed.
  pub manifest: Option<Manifest>,
  /// Parsed lock file, if present and well-formed.
  pub lock: Option<LockFile>,
  found: bool,
}

impl LoadedEnvironment {
  /// Build a loaded environment from already-parsed documents.
  pub fn new(dir: PathBuf, manifest: Option<Manifest>, lock: Option<LockFile>) -> Self {
    let found = manifest.is_some() || lock.is_some();
    Self {
      dir,
      manifest,
      lock,
      found,
    }
  }

  /// Returns false if neither file exists on disk.
  ///
  /// An environment whose files exist but failed to parse still counts as
  /// existing.
  pub fn exists(&self) -> bool {
    self.found
  }
}

/// Position of a parse failure, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
  pub line: usize,
  pub column: usize,
}

/// Read and parse both files of the environment rooted at `dir`.
pub async fn load_environment(dir: &Path) -> LoadedEnvironment {
  let manifest_file = manifest_path(dir);
  let lock_file = lock_path(dir);

  let manifest_text = read_optional(&manifest_file).await;
  let lock_text = read_optional(&lock_file).await;
  let found = manifest_text.is_some() || lock_text.is_some();

  let manifest = manifest_text.and_then(|content| match Manifest::from_toml_str(&content) {
    Ok(manifest) => Some(manifest),
    Err(e) => {
      let location = e.span().map(|span| offset_to_location(&content, span.start));
      log_parse_failure(&manifest_file, location, e.message());
      None
    }
  });

  let lock = lock_text.and_then(|content| match LockFile::from_json_str(&content) {
    Ok(lock) => Some(lock),
    Err(e) => {
      let location = match &e {
        crate::lock::LockError::Parse(json) if json.line() > 0 => Some(Location {
          line: json.line(),
          column: json.column(),
        }),
        _ => None,
      };
      log_parse_failure(&lock_file, location, &e.to_string());
      None
    }
  });

  debug!(
    dir = %dir.display(),
    found,
    manifest = manifest.is_some(),
    lock = lock.is_some(),
    "loaded environment"
  );

  LoadedEnvironment {
    dir: dir.to_path_buf(),
    manifest,
    lock,
    found,
  }
}

async fn read_optional(path: &Path) -> Option<String> {
  match tokio::fs::read_to_string(path).await {
    Ok(content) => Some(content),
    Err(e) if e.kind() == io::ErrorKind::NotFound => None,
    Err(e) => {
      warn!(file = %path.display(), error = %e, "failed to read environment file");
      None
    }
  }
}

fn log_parse_failure(path: &Path, location: Option<Location>, message: &str) {
  match location {
    Some(Location { line, column }) => warn!(
      file = %path.display(),
      line,
      column,
      error = %message.trim(),
      "failed to parse environment file"
    ),
    None => warn!(file = %path.display(), error = %message.trim(), "failed to parse environment file"),
  }
}

/// Convert a byte offset into a 1-based line and column.
pub fn offset_to_location(content: &str, offset: usize) -> Location {
  let offset = offset.min(content.len());
  let before = content.get(..offset).unwrap_or(content);
  let line = before.matches('\n').count() + 1;
  let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
  let column = before.get(line_start..).map(|s| s.chars().count()).unwrap_or(0) + 1;
  Location { line, column }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  use crate::platform::paths::env_dir;

  fn write_env(dir: &Path, manifest: Option<&str>, lock: Option<&str>) {
    fs::create_dir_all(env_dir(dir)).unwrap();
    if let Some(content) = manifest {
      fs::write(manifest_path(dir), content).unwrap();
    }
    if let Some(content) = lock {
      fs::write(lock_path(dir), content).unwrap();
    }
  }

  #[tokio::test]
  async fn missing_files_mean_environment_does_not_exist() {
    let temp = TempDir::new().unwrap();
    let env = load_environment(temp.path()).await;

    assert!(!env.exists());
    assert!(env.manifest.is_none());
    assert!(env.lock.is_none());
  }

  #[tokio::test]
  async fn empty_manifest_exists_but_is_empty() {
    let temp = TempDir::new().unwrap();
    write_env(temp.path(), Some(""), None);

    let env = load_environment(temp.path()).await;

    assert!(env.exists());
    assert!(env.manifest.as_ref().unwrap().is_empty());
    assert!(env.lock.is_none());
  }

  #[tokio::test]
  async fn loads_both_documents() {
    let temp = TempDir::new().unwrap();
    write_env(
      temp.path(),
      Some("[vars]\nA = \"1\"\n"),
      Some(r#"{"lockfile-version": 1, "manifest": {"vars": {"A": "1"}}, "packages": []}"#),
    );

    let env = load_environment(temp.path()).await;

    assert_eq!(env.manifest.unwrap().vars["A"], "1");
    assert_eq!(env.lock.unwrap().manifest.vars["A"], "1");
  }

  #[tokio::test]
  #[traced_test]
  async fn malformed_manifest_is_logged_not_returned() {
    let temp = TempDir::new().unwrap();
    write_env(
      temp.path(),
      Some("[vars]\nA = \"1\"\nB = \n"),
      Some(r#"{"lockfile-version": 1, "packages": []}"#),
    );

    let env = load_environment(temp.path()).await;

    assert!(env.exists());
    assert!(env.manifest.is_none());
    assert!(env.lock.is_some());
    assert!(logs_contain("failed to parse environment file"));
    assert!(logs_contain("manifest.toml"));
    assert!(logs_contain("line="));
  }

  #[tokio::test]
  #[traced_test]
  async fn malformed_lock_reports_line_and_column() {
    let temp = TempDir::new().unwrap();
    write_env(temp.path(), None, Some("{\n  \"lockfile-version\": 1,\n  oops\n}"));

    let env = load_environment(temp.path()).await;

    assert!(env.exists());
    assert!(env.lock.is_none());
    assert!(logs_contain("manifest.lock"));
    assert!(logs_contain("line=3"));
  }

  #[tokio::test]
  async fn unsupported_lock_version_leaves_slot_empty() {
    let temp = TempDir::new().unwrap();
    write_env(temp.path(), None, Some(r#"{"lockfile-version": 0, "packages": []}"#));

    let env = load_environment(temp.path()).await;

    assert!(env.exists());
    assert!(env.lock.is_none());
  }

  #[tokio::test]
  async fn every_call_rereads_from_disk() {
    let temp = TempDir::new().unwrap();
    write_env(temp.path(), Some("[vars]\nA = \"1\"\n"), None);
    let first = load_environment(temp.path()).await;

    write_env(temp.path(), Some("[vars]\nA = \"2\"\n"), None);
    let second = load_environment(temp.path()).await;

    assert_eq!(first.manifest.unwrap().vars["A"], "1");
    assert_eq!(second.manifest.unwrap().vars["A"], "2");
  }

  #[test]
  fn offsets_map_to_one_based_positions() {
    let content = "ab\ncd\nef";
    assert_eq!(offset_to_location(content, 0), Location { line: 1, column: 1 });
    assert_eq!(offset_to_location(content, 4), Location { line: 2, column: 2 });
    assert_eq!(offset_to_location(content, 100), Location { line: 3, column: 3 });
  }
}
