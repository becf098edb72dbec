//! Coalescing of overlapping reconciliation work.
//!
//! File events arrive in bursts. The [`Debouncer`] turns a burst into one
//! notification per key, and the [`ActivationGuard`] drops any request that
//! arrives while an earlier one is still running.

mod debounce;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

pub use debounce::Debouncer;

/// Gate that lets at most one activation run at a time.
#[derive(Debug, Clone, Default)]
pub struct ActivationGuard {
  in_progress: Arc<AtomicBool>,
}

impl ActivationGuard {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_running(&self) -> bool {
    self.in_progress.load(Ordering::Acquire)
  }

  /// Run `fut` unless another run is in progress, in which case the request
  /// is dropped and `None` returned.
  ///
  /// The flag is cleared when the run ends, fails, or is cancelled by
  /// dropping the returned future.
  pub async fn run<F, T>(&self, label: &str, fut: F) -> Option<T>
  where
    F: Future<Output = T>,
  {
    if self.in_progress.swap(true, Ordering::AcqRel) {
      info!(label, "activation already in progress, dropping request");
      return None;
    }

    let _reset = scopeguard::guard(Arc::clone(&self.in_progress), |flag| {
      flag.store(false, Ordering::Release);
    });

    debug!(label, "activation started");
    let output = fut.await;
    debug!(label, "activation finished");
    Some(output)
  }
}
