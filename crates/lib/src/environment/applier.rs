use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::collection::write_json_atomic;
use super::{EnvCollection, EnvDiff, EnvStoreError, EnvironmentSnapshot, ProcessEnvironment, SessionHandle};

/// What has been applied so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedState {
  /// Process environment captured before the first application.
  #[serde(default)]
  pub original: Option<BTreeMap<String, String>>,

  /// The last snapshot applied, in full.
  #[serde(default)]
  pub previous: EnvironmentSnapshot,

  /// Sessions selected for patching during the current application.
  #[serde(skip)]
  pub sessions_to_patch: BTreeSet<String>,
}

impl AppliedState {
  /// Load state from `path`; a missing file is a fresh state.
  pub fn load(path: &Path) -> Result<Self, EnvStoreError> {
    match fs::read_to_string(path) {
      Ok(content) => serde_json::from_str(&content).map_err(|source| EnvStoreError::Parse {
        path: path.display().to_string(),
        source,
      }),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
      Err(source) => Err(EnvStoreError::Read {
        path: path.display().to_string(),
        source,
      }),
    }
  }

  pub fn save(&self, path: &Path) -> Result<(), EnvStoreError> {
    write_json_atomic(path, self)?;
    debug!(path = %path.display(), keys = self.previous.len(), "saved applied state");
    Ok(())
  }

  /// The value `name` had before anything was applied.
  fn original_value(&self, name: &str) -> Option<&str> {
    self.original.as_ref().and_then(|o| o.get(name)).map(String::as_str)
  }
}

/// Writes snapshots into a collection, the process environment, and open sessions.
#[derive(Debug)]
pub struct EnvironmentApplier<C, P> {
  collection: C,
  process: P,
  state: AppliedState,
  max_sessions: usize,
}

impl<C: EnvCollection, P: ProcessEnvironment> EnvironmentApplier<C, P> {
  pub fn new(collection: C, process: P, state: AppliedState, max_sessions: usize) -> Self {
    Self {
      collection,
      process,
      state,
      max_sessions,
    }
  }

  pub fn state(&self) -> &AppliedState {
    &self.state
  }

  pub fn collection(&self) -> &C {
    &self.collection
  }

  pub fn process(&self) -> &P {
    &self.process
  }

  /// The captured pre-activation environment, once one exists.
  pub fn baseline(&self) -> Option<&BTreeMap<String, String>> {
    self.state.original.as_ref()
  }

  pub fn into_state(self) -> AppliedState {
    self.state
  }

  /// Apply `snapshot`, returning the keys that changed since the last call.
  ///
  /// An empty snapshot is ignored and returns `Ok(None)`. Only changed keys
  /// reach `sessions`, and at most `max_sessions` of them are patched.
  pub fn apply(
    &mut self,
    snapshot: &EnvironmentSnapshot,
    sessions: &mut [Box<dyn SessionHandle>],
  ) -> Result<Option<EnvDiff>, EnvStoreError> {
    if snapshot.is_empty() {
      debug!("empty snapshot, nothing to apply");
      return Ok(None);
    }

    if self.state.original.is_none() {
      let baseline = self.process.vars();
      debug!(vars = baseline.len(), "captured baseline environment");
      self.state.original = Some(baseline);
    }

    let diff = EnvDiff::between(&self.state.previous, snapshot);

    for (name, value) in snapshot {
      match value {
        Some(value) => {
          self.collection.replace(name, value)?;
          self.process.set(name, value)?;
        }
        None => {
          self.collection.delete(name)?;
          self.process.remove(name)?;
        }
      }
    }

    for name in &diff.dropped {
      self.collection.delete(name)?;
      self.restore_process_value(name)?;
    }

    if sessions.len() > self.max_sessions {
      warn!(
        sessions = sessions.len(),
        max = self.max_sessions,
        "too many open sessions, patching only the first ones"
      );
    }

    self.state.sessions_to_patch = sessions
      .iter()
      .take(self.max_sessions)
      .map(|s| s.id().to_string())
      .collect();

    if !diff.is_empty() {
      for session in sessions.iter_mut().take(self.max_sessions) {
        for (name, value) in &diff.changed {
          session.patch(name, value.as_deref())?;
        }
        for name in &diff.dropped {
          session.patch(name, self.state.original_value(name))?;
        }
      }
    }

    info!(
      keys = snapshot.len(),
      changed = diff.changed.len(),
      dropped = diff.dropped.len(),
      sessions = self.state.sessions_to_patch.len(),
      "applied environment snapshot"
    );

    self.state.previous = snapshot.clone();
    self.state.sessions_to_patch.clear();
    Ok(Some(diff))
  }

  /// Revert every applied key to its original value and clear the collection.
  ///
  /// Open sessions receive the original values too, within the same bound as
  /// [`apply`](Self::apply). Returns the number of keys reverted.
  pub fn restore(&mut self, sessions: &mut [Box<dyn SessionHandle>]) -> Result<usize, EnvStoreError> {
    let names: Vec<String> = self.state.previous.keys().cloned().collect();
    for name in &names {
      self.restore_process_value(name)?;
    }
    self.collection.clear()?;

    for session in sessions.iter_mut().take(self.max_sessions) {
      for name in &names {
        session.patch(name, self.state.original_value(name))?;
      }
    }

    info!(keys = names.len(), "restored original environment");
    self.state = AppliedState::default();
    Ok(names.len())
  }

  fn restore_process_value(&mut self, name: &str) -> Result<(), EnvStoreError> {
    match self.state.original_value(name) {
      Some(value) => self.process.set(name, value),
      None => self.process.remove(name),
    }
  }
}
