//! Already-open terminal sessions.
//!
//! A session opts in by registering a patch file named `<id>.<shell>` under
//! the sessions directory and sourcing it from its prompt hook. Patching a
//! session appends shell statements to that file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{EnvStoreError, validate_name, validate_value};
use crate::platform::shell::Shell;

/// A live session that can receive variable changes.
pub trait SessionHandle {
  fn id(&self) -> &str;

  /// Set (`Some`) or unset (`None`) one variable in the session.
  fn patch(&mut self, name: &str, value: Option<&str>) -> Result<(), EnvStoreError>;
}

/// A session fed through a patch file its shell sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFileSession {
  id: String,
  path: PathBuf,
  shell: Shell,
}

impl PatchFileSession {
  /// Create (or truncate) the patch file for session `id` in `dir`.
  pub fn register(dir: &Path, id: &str, shell: Shell) -> Result<Self, EnvStoreError> {
    if id.is_empty() || id.contains(['/', '\\', '.']) {
      return Err(EnvStoreError::InvalidName(id.to_string()));
    }

    let path = dir.join(format!("{}.{}", id, shell.as_str()));
    let write_err = |source| EnvStoreError::Write {
      path: path.display().to_string(),
      source,
    };
    fs::create_dir_all(dir).map_err(write_err)?;
    fs::write(&path, "").map_err(write_err)?;

    debug!(id, shell = %shell, path = %path.display(), "registered session");
    Ok(Self {
      id: id.to_string(),
      path,
      shell,
    })
  }

  /// Find every registered session in `dir`; a missing directory has none.
  ///
  /// Files whose extension is not a known shell are skipped.
  pub fn discover(dir: &Path) -> Result<Vec<Self>, EnvStoreError> {
    let entries = match fs::read_dir(dir) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => {
        return Err(EnvStoreError::Read {
          path: dir.display().to_string(),
          source,
        });
      }
    };

    let mut sessions = Vec::new();
    for entry in entries.flatten() {
      let path = entry.path();
      let (Some(id), Some(ext)) = (
        path.file_stem().and_then(|s| s.to_str()),
        path.extension().and_then(|s| s.to_str()),
      ) else {
        continue;
      };

      match ext.parse::<Shell>() {
        Ok(shell) => sessions.push(Self {
          id: id.to_string(),
          shell,
          path: path.clone(),
        }),
        Err(e) => warn!(path = %path.display(), error = %e, "skipping unrecognized session file"),
      }
    }

    sessions.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(sessions)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn shell(&self) -> Shell {
    self.shell
  }
}

impl SessionHandle for PatchFileSession {
  fn id(&self) -> &str {
    &self.id
  }

  fn patch(&mut self, name: &str, value: Option<&str>) -> Result<(), EnvStoreError> {
    validate_name(name)?;
    let line = match value {
      Some(value) => {
        validate_value(name, value)?;
        self.shell.export_var(name, value)
      }
      None => self.shell.unset_var(name),
    };

    let write_err = |source| EnvStoreError::Write {
      path: self.path.display().to_string(),
      source,
    };
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .map_err(write_err)?;
    writeln!(file, "{}", line).map_err(write_err)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn patches_are_appended_as_shell_statements() {
    let temp = TempDir::new().unwrap();
    let mut session = PatchFileSession::register(temp.path(), "1234", Shell::Bash).unwrap();

    session.patch("GREETING", Some("hi")).unwrap();
    session.patch("OLD", None).unwrap();

    let content = fs::read_to_string(session.path()).unwrap();
    assert_eq!(content, "export GREETING='hi'\nunset OLD\n");
  }

  #[cfg(unix)]
  #[test]
  fn sourced_patch_sets_value_verbatim() {
    let temp = TempDir::new().unwrap();
    let mut session = PatchFileSession::register(temp.path(), "77", Shell::Sh).unwrap();
    let value = "a$HOME `echo x` 'b'\nc";

    session.patch("TRICKY", Some(value)).unwrap();

    let output = std::process::Command::new("sh")
      .arg("-c")
      .arg(". \"$1\"; printf '%s' \"$TRICKY\"")
      .arg("sh")
      .arg(session.path())
      .output()
      .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), value);
  }

  #[test]
  fn discover_finds_registered_sessions() {
    let temp = TempDir::new().unwrap();
    PatchFileSession::register(temp.path(), "b", Shell::Fish).unwrap();
    PatchFileSession::register(temp.path(), "a", Shell::Zsh).unwrap();
    fs::write(temp.path().join("notes.txt"), "").unwrap();

    let sessions = PatchFileSession::discover(temp.path()).unwrap();

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id(), "a");
    assert_eq!(sessions[0].shell(), Shell::Zsh);
    assert_eq!(sessions[1].shell(), Shell::Fish);
  }

  #[test]
  fn discover_in_missing_directory_is_empty() {
    let temp = TempDir::new().unwrap();
    let sessions = PatchFileSession::discover(&temp.path().join("nope")).unwrap();
    assert!(sessions.is_empty());
  }

  #[test]
  fn register_rejects_path_like_ids() {
    let temp = TempDir::new().unwrap();
    assert!(PatchFileSession::register(temp.path(), "../x", Shell::Sh).is_err());
    assert!(PatchFileSession::register(temp.path(), "", Shell::Sh).is_err());
  }
}
