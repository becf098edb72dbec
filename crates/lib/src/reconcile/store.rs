use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use super::{Reconciliation, reconcile};
use crate::loader::load_environment;
use crate::platform::Platform;

/// Holds the latest reconciliation for one environment directory.
///
/// Readers take an `Arc` snapshot and keep seeing it even while a reload
/// swaps in a replacement.
#[derive(Debug)]
pub struct ReconciliationStore {
  dir: PathBuf,
  platform: Option<Platform>,
  current: ArcSwap<Reconciliation>,
}

impl ReconciliationStore {
  pub fn new(dir: PathBuf, platform: Option<Platform>) -> Self {
    Self {
      dir,
      platform,
      current: ArcSwap::from_pointee(Reconciliation::empty(platform)),
    }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// The most recently published result.
  pub fn current(&self) -> Arc<Reconciliation> {
    self.current.load_full()
  }

  /// Re-read both files, reconcile, and publish the result.
  pub async fn reload(&self) -> Arc<Reconciliation> {
    let env = load_environment(&self.dir).await;
    let next = Arc::new(reconcile(&env, self.platform));

    info!(
      dir = %self.dir.display(),
      exists = next.exists,
      packages = next.packages.len(),
      variables = next.variables.len(),
      services = next.services.len(),
      "reconciled environment"
    );

    self.current.store(Arc::clone(&next));
    next
  }
}
