use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Invocation;

/// Captured result of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOutput {
  pub stdout: String,
  pub stderr: String,
  pub code: Option<i32>,
}

impl From<Output> for CliOutput {
  fn from(output: Output) -> Self {
    Self {
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
      code: output.status.code(),
    }
  }
}

/// Errors from running the external tool.
#[derive(Debug, Error)]
pub enum CliError {
  /// The binary could not be found.
  #[error("command not found: {binary}")]
  NotFound { binary: PathBuf },

  /// The tool ran and exited unsuccessfully.
  #[error("`{command}` failed with exit code {code:?}: {stderr}")]
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The process could not be started or awaited.
  #[error("failed to run {binary}: {source}")]
  Io {
    binary: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The caller cancelled; the process keeps running in the background.
  #[error("`{command}` was cancelled")]
  Cancelled { command: String },
}

impl CliError {
  /// Returns true if the failure means the tool is not installed.
  pub fn is_not_found(&self) -> bool {
    matches!(self, CliError::NotFound { .. })
  }
}

/// Runs allow-listed subcommands of the external tool.
#[derive(Debug, Clone)]
pub struct CliRunner {
  binary: PathBuf,
}

impl CliRunner {
  pub fn new(binary: impl Into<PathBuf>) -> Self {
    Self { binary: binary.into() }
  }

  pub fn binary(&self) -> &Path {
    &self.binary
  }

  fn command(&self, invocation: &Invocation) -> Command {
    let mut command = Command::new(&self.binary);
    command
      .args(invocation.argv())
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped());
    command
  }

  fn spawn_error(&self, e: io::Error) -> CliError {
    if e.kind() == io::ErrorKind::NotFound {
      CliError::NotFound {
        binary: self.binary.clone(),
      }
    } else {
      CliError::Io {
        binary: self.binary.clone(),
        source: e,
      }
    }
  }

  fn finish(&self, invocation: &Invocation, output: Output) -> Result<CliOutput, CliError> {
    let output = CliOutput::from(output);

    if output.code != Some(0) {
      if !output.stdout.is_empty() {
        debug!(stdout = %output.stdout, "command stdout");
      }
      return Err(CliError::Failed {
        command: invocation.to_string(),
        code: output.code,
        stderr: output.stderr.trim().to_string(),
      });
    }

    if !output.stderr.is_empty() {
      debug!(stderr = %output.stderr, "command stderr");
    }

    Ok(output)
  }

  /// Run an invocation to completion.
  pub async fn run(&self, invocation: &Invocation) -> Result<CliOutput, CliError> {
    info!(binary = %self.binary.display(), command = %invocation, "running external command");

    let output = self
      .command(invocation)
      .output()
      .await
      .map_err(|e| self.spawn_error(e))?;

    self.finish(invocation, output)
  }

  /// Run an invocation whose environment is exactly `env`.
  ///
  /// Nothing is inherited from this process, so the child sees the same
  /// variables the caller compares its output against.
  pub async fn run_with_env(
    &self,
    invocation: &Invocation,
    env: &BTreeMap<String, String>,
  ) -> Result<CliOutput, CliError> {
    info!(
      binary = %self.binary.display(),
      command = %invocation,
      vars = env.len(),
      "running external command in a fixed environment"
    );

    let output = self
      .command(invocation)
      .env_clear()
      .envs(env)
      .output()
      .await
      .map_err(|e| self.spawn_error(e))?;

    self.finish(invocation, output)
  }

  /// Run an invocation that the caller may cancel.
  ///
  /// On cancellation the child is not killed: it is left to finish on a
  /// background task and [`CliError::Cancelled`] is returned immediately.
  ///
  /// The child's stdout and stderr stay piped to that task. Once the runtime
  /// shuts down the task is dropped and the pipes close, so a detached child
  /// that writes afterwards gets `SIGPIPE`. Only work that finishes without
  /// further output survives the caller exiting.
  pub async fn run_cancellable(
    &self,
    invocation: &Invocation,
    token: &CancellationToken,
  ) -> Result<CliOutput, CliError> {
    info!(binary = %self.binary.display(), command = %invocation, "running cancellable external command");

    let child = self.command(invocation).spawn().map_err(|e| self.spawn_error(e))?;
    let mut task = tokio::spawn(child.wait_with_output());

    tokio::select! {
      joined = &mut task => {
        let output = joined
          .map_err(io::Error::other)
          .and_then(|result| result)
          .map_err(|e| CliError::Io { binary: self.binary.clone(), source: e })?;
        self.finish(invocation, output)
      }
      _ = token.cancelled() => {
        warn!(command = %invocation, "command cancelled, leaving process to finish in background");
        drop(task);
        Err(CliError::Cancelled { command: invocation.to_string() })
      }
    }
  }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;
  use serial_test::serial;
  use std::fs;
  use std::os::unix::fs::PermissionsExt;
  use std::time::Duration;
  use tempfile::TempDir;

  /// Write an executable shell script standing in for the external tool.
  fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-tool");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  #[tokio::test]
  #[serial]
  async fn captures_stdout_on_success() {
    let temp = TempDir::new().unwrap();
    let runner = CliRunner::new(fake_tool(temp.path(), "echo \"$@\""));

    let output = runner.run(&Invocation::search("jq")).await.unwrap();

    assert_eq!(output.stdout.trim(), "search --json jq");
    assert_eq!(output.code, Some(0));
  }

  #[tokio::test]
  #[serial]
  async fn nonzero_exit_is_failed() {
    let temp = TempDir::new().unwrap();
    let runner = CliRunner::new(fake_tool(temp.path(), "echo 'no such package' >&2\nexit 3"));

    let err = runner.run(&Invocation::show("nope")).await.unwrap_err();

    match err {
      CliError::Failed { command, code, stderr } => {
        assert_eq!(command, "show nope");
        assert_eq!(code, Some(3));
        assert_eq!(stderr, "no such package");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  #[serial]
  fn fixed_environment_replaces_inherited_one() {
    let temp = TempDir::new().unwrap();
    let runner = CliRunner::new(fake_tool(temp.path(), "exec /usr/bin/env"));
    let env = BTreeMap::from([("ONLY_THIS".to_string(), "1".to_string())]);

    let output = temp_env::with_var("INHERITED_VAR", Some("leak"), || {
      tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(runner.run_with_env(&Invocation::list(temp.path()), &env))
        .unwrap()
    });

    assert!(output.stdout.contains("ONLY_THIS=1"));
    assert!(!output.stdout.contains("INHERITED_VAR"));
  }

  #[tokio::test]
  async fn missing_binary_is_not_found() {
    let runner = CliRunner::new("/definitely/not/a/real/binary");

    let err = runner.run(&Invocation::search("jq")).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("command not found"));
  }

  #[test]
  #[serial]
  fn silent_detached_process_outlives_the_runtime() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("finished");
    let runner = CliRunner::new(fake_tool(
      temp.path(),
      &format!("sleep 0.3\ntouch '{}'", marker.display()),
    ));
    let token = CancellationToken::new();
    token.cancel();

    let rt = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .unwrap();
    let err = rt
      .block_on(runner.run_cancellable(&Invocation::search("slow"), &token))
      .unwrap_err();
    assert!(matches!(err, CliError::Cancelled { .. }));
    drop(rt);

    let mut waited = Duration::ZERO;
    while !marker.exists() && waited < Duration::from_secs(5) {
      std::thread::sleep(Duration::from_millis(50));
      waited += Duration::from_millis(50);
    }
    assert!(marker.exists(), "process should finish after the runtime is gone");
  }

  #[tokio::test]
  #[serial]
  async fn cancellable_run_completes_normally() {
    let temp = TempDir::new().unwrap();
    let runner = CliRunner::new(fake_tool(temp.path(), "echo '[]'"));
    let token = CancellationToken::new();

    let output = runner.run_cancellable(&Invocation::search("x"), &token).await.unwrap();

    assert_eq!(output.stdout.trim(), "[]");
  }

  #[tokio::test]
  #[serial]
  async fn cancelled_process_keeps_running_detached() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("finished");
    let runner = CliRunner::new(fake_tool(
      temp.path(),
      &format!("sleep 0.3\ntouch '{}'", marker.display()),
    ));
    let token = CancellationToken::new();
    token.cancel();

    let err = runner.run_cancellable(&Invocation::search("slow"), &token).await.unwrap_err();
    assert!(matches!(err, CliError::Cancelled { .. }));

    let mut waited = Duration::ZERO;
    while !marker.exists() && waited < Duration::from_secs(5) {
      tokio::time::sleep(Duration::from_millis(50)).await;
      waited += Duration::from_millis(50);
    }
    assert!(marker.exists(), "detached process should run to completion");
  }
}
