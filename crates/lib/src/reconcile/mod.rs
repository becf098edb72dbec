//! Manifest/lock reconciliation.
//!
//! Merges what the manifest declares with what the lock file records as
//! resolved, and classifies every package, variable, and service into a
//! [`LifecycleState`].
//!
//! # State Rule
//!
//! | declared | resolved          | state     |
//! |----------|-------------------|-----------|
//! | absent   | any               | `Absent`  |
//! | present  | absent            | `Pending` |
//! | present  | present, differs  | `Pending` |
//! | present  | present, equal    | `Active`  |
//!
//! Equality is structural after normalization (see [`normalize`]).

pub mod normalize;
mod store;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::loader::LoadedEnvironment;
use crate::lock::LockedPackage;
use crate::manifest::{Manifest, PackageDescriptor, ServiceDescriptor};
use crate::platform::Platform;

pub use normalize::structurally_equal;
pub use store::ReconciliationStore;

/// Where an entity stands between the manifest and the lock file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
  /// Declared and resolved, and both agree.
  Active,
  /// Declared but not yet resolved, or resolved to something else.
  Pending,
  /// Not declared.
  Absent,
}

impl LifecycleState {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Active => "active",
      Self::Pending => "pending",
      Self::Absent => "absent",
    }
  }
}

impl fmt::Display for LifecycleState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One package, variable, or service as seen from both sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<T> {
  /// Unique name within the entity's category (install id for packages).
  pub name: String,
  /// Form found in the manifest.
  pub declared: Option<T>,
  /// Form found in the lock file.
  pub resolved: Option<T>,
}

impl<T: Serialize> Entity<T> {
  /// Derive the lifecycle state from the two forms.
  pub fn state(&self) -> LifecycleState {
    match (&self.declared, &self.resolved) {
      (None, _) => LifecycleState::Absent,
      (Some(_), None) => LifecycleState::Pending,
      (Some(declared), Some(resolved)) if structurally_equal(declared, resolved) => LifecycleState::Active,
      (Some(_), Some(_)) => LifecycleState::Pending,
    }
  }
}

/// Number of entities in each state for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
  pub active: usize,
  pub pending: usize,
  pub absent: usize,
}

impl StateCounts {
  fn of<T: Serialize>(entities: &[Entity<T>]) -> Self {
    let mut counts = Self::default();
    for entity in entities {
      match entity.state() {
        LifecycleState::Active => counts.active += 1,
        LifecycleState::Pending => counts.pending += 1,
        LifecycleState::Absent => counts.absent += 1,
      }
    }
    counts
  }
}

/// The result of one reconciliation pass.
///
/// Never mutated after construction; a reload builds a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
  /// Platform packages were resolved against; `None` disables packages.
  pub platform: Option<Platform>,
  /// Whether either environment file exists.
  pub exists: bool,
  pub packages: Vec<Entity<PackageDescriptor>>,
  pub variables: Vec<Entity<String>>,
  pub services: Vec<Entity<ServiceDescriptor>>,
  locked: BTreeMap<String, LockedPackage>,
}

impl Reconciliation {
  /// An empty result for an environment that has not been loaded yet.
  pub fn empty(platform: Option<Platform>) -> Self {
    Self {
      platform,
      ..Default::default()
    }
  }

  /// Lock record for a package on the current platform.
  pub fn locked_package(&self, install_id: &str) -> Option<&LockedPackage> {
    self.locked.get(install_id)
  }

  pub fn package_counts(&self) -> StateCounts {
    StateCounts::of(&self.packages)
  }

  pub fn variable_counts(&self) -> StateCounts {
    StateCounts::of(&self.variables)
  }

  pub fn service_counts(&self) -> StateCounts {
    StateCounts::of(&self.services)
  }

  /// Returns true if anything declared has not been resolved yet.
  pub fn has_pending(&self) -> bool {
    self.package_counts().pending + self.variable_counts().pending + self.service_counts().pending > 0
  }
}

/// Reconcile the documents of `env` against each other.
///
/// Package records in the lock file only count when they were resolved for
/// `platform`. Without a platform the package category is left empty.
pub fn reconcile(env: &LoadedEnvironment, platform: Option<Platform>) -> Reconciliation {
  let empty = Manifest::default();
  let declared = env.manifest.as_ref().unwrap_or(&empty);
  let resolved = env.lock.as_ref().map(|lock| &lock.manifest).unwrap_or(&empty);

  let locked: BTreeMap<String, LockedPackage> = match (&env.lock, &platform) {
    (Some(lock), Some(platform)) => lock
      .packages_for(platform)
      .into_iter()
      .map(|(id, pkg)| (id.to_string(), pkg.clone()))
      .collect(),
    _ => BTreeMap::new(),
  };

  let packages = match &platform {
    Some(platform) => {
      let resolved_install: BTreeMap<String, PackageDescriptor> = resolved
        .install
        .iter()
        .filter(|(name, snapshot)| {
          let expected_here = declared
            .install
            .get(*name)
            .map(|d| d.applies_to(platform))
            .unwrap_or_else(|| snapshot.applies_to(platform));
          !expected_here || locked.contains_key(*name)
        })
        .map(|(name, snapshot)| (name.clone(), snapshot.clone()))
        .collect();
      merge(&declared.install, &resolved_install)
    }
    None => Vec::new(),
  };

  Reconciliation {
    platform,
    exists: env.exists(),
    packages,
    variables: merge(&declared.vars, &resolved.vars),
    services: merge(&declared.services, &resolved.services),
    locked,
  }
}

fn merge<T: Clone>(declared: &BTreeMap<String, T>, resolved: &BTreeMap<String, T>) -> Vec<Entity<T>> {
  let names: BTreeSet<&String> = declared.keys().chain(resolved.keys()).collect();
  names
    .into_iter()
    .map(|name| Entity {
      name: name.clone(),
      declared: declared.get(name).cloned(),
      resolved: resolved.get(name).cloned(),
    })
    .collect()
}
