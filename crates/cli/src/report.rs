//! Top-level error sink.
//!
//! Every command failure ends up here exactly once: it is logged and then
//! printed as a single line, followed by a hint when one applies.

use tracing::error;

use envlens_lib::command::CliError;
use envlens_lib::consts::CLI_BINARY_ENV;
use envlens_lib::settings::SettingsError;

use crate::output::print_error;

pub fn report_error(err: &anyhow::Error) {
  let message = format!("{:#}", err);
  error!(error = %message, "command failed");
  print_error(&message);

  if let Some(hint) = hint_for(err) {
    eprintln!("  hint: {}", hint);
  }
}

fn hint_for(err: &anyhow::Error) -> Option<String> {
  for cause in err.chain() {
    if let Some(CliError::NotFound { binary }) = cause.downcast_ref::<CliError>() {
      return Some(format!(
        "install {} or set {} to its path",
        binary.display(),
        CLI_BINARY_ENV
      ));
    }
    if let Some(SettingsError::Parse { path, .. }) = cause.downcast_ref::<SettingsError>() {
      return Some(format!("fix or remove {}", path.display()));
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use anyhow::Context;

  #[test]
  fn missing_binary_gets_install_hint() {
    let err = Err::<(), _>(CliError::NotFound {
      binary: "flox".into(),
    })
    .context("Failed to query services")
    .unwrap_err();

    let hint = hint_for(&err).unwrap();
    assert!(hint.contains("install flox"));
    assert!(hint.contains(CLI_BINARY_ENV));
  }

  #[test]
  fn other_errors_have_no_hint() {
    let err = anyhow::anyhow!("something else");
    assert!(hint_for(&err).is_none());
  }
}
