use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Variables an activation wants applied; `None` means unset.
pub type EnvironmentSnapshot = BTreeMap<String, Option<String>>;

/// Variables that shells manage themselves and activations never own.
const SHELL_MANAGED: [&str; 4] = ["_", "OLDPWD", "PWD", "SHLVL"];

/// Keys that differ between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvDiff {
  /// Keys added or given a different value; `None` means unset.
  pub changed: BTreeMap<String, Option<String>>,
  /// Keys the previous snapshot had and the new one no longer mentions.
  pub dropped: BTreeSet<String>,
}

impl EnvDiff {
  /// Compare the previously applied snapshot with a new one.
  pub fn between(previous: &EnvironmentSnapshot, next: &EnvironmentSnapshot) -> Self {
    let changed = next
      .iter()
      .filter(|(key, value)| previous.get(*key) != Some(*value))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect();

    let dropped = previous
      .keys()
      .filter(|key| !next.contains_key(*key))
      .cloned()
      .collect();

    Self { changed, dropped }
  }

  pub fn is_empty(&self) -> bool {
    self.changed.is_empty() && self.dropped.is_empty()
  }

  /// Number of keys touched by this diff.
  pub fn len(&self) -> usize {
    self.changed.len() + self.dropped.len()
  }
}

/// Parse the output of `env -0` (or plain `env` when no NUL bytes appear).
pub fn parse_env_output(output: &str) -> BTreeMap<String, String> {
  let separator = if output.contains('\0') { '\0' } else { '\n' };
  output
    .split(separator)
    .filter_map(|entry| entry.split_once('='))
    .filter(|(key, _)| !key.is_empty())
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

/// Build the snapshot an activation implies relative to the ambient environment.
///
/// Keys whose activated value differs from the ambient one are set; ambient
/// keys the activation removed are unset. Shell-managed keys are ignored.
pub fn snapshot_from_activation(
  ambient: &BTreeMap<String, String>,
  activated: &BTreeMap<String, String>,
) -> EnvironmentSnapshot {
  let set = activated
    .iter()
    .filter(|(key, value)| !is_shell_managed(key) && ambient.get(*key) != Some(*value))
    .map(|(key, value)| (key.clone(), Some(value.clone())));

  let unset = ambient
    .keys()
    .filter(|key| !is_shell_managed(key) && !activated.contains_key(*key))
    .map(|key| (key.clone(), None));

  set.chain(unset).collect()
}

fn is_shell_managed(key: &str) -> bool {
  SHELL_MANAGED.contains(&key)
}
