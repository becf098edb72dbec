use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::trace;

/// Per-key quiet-period timer.
///
/// Every [`notify`](Debouncer::notify) restarts the timer for its key. Once a
/// key has been quiet for the whole delay it is sent once on the channel
/// returned by [`Debouncer::new`]. Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct Debouncer<K> {
  delay: Duration,
  pending: HashMap<K, JoinHandle<()>>,
  tx: UnboundedSender<K>,
}

impl<K> Debouncer<K>
where
  K: Eq + Hash + Clone + Send + 'static,
{
  pub fn new(delay: Duration) -> (Self, UnboundedReceiver<K>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let debouncer = Self {
      delay,
      pending: HashMap::new(),
      tx,
    };
    (debouncer, rx)
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }

  /// Start or restart the timer for `key`.
  pub fn notify(&mut self, key: K) {
    self.pending.retain(|_, handle| !handle.is_finished());
    if let Some(handle) = self.pending.remove(&key) {
      trace!("restarting debounce timer");
      handle.abort();
    }

    let tx = self.tx.clone();
    let delay = self.delay;
    let fired = key.clone();
    let handle = tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      // Receiver gone means nobody is listening any more.
      let _ = tx.send(fired);
    });
    self.pending.insert(key, handle);
  }

  /// Number of keys whose timer has not fired yet.
  pub fn pending(&self) -> usize {
    self.pending.values().filter(|handle| !handle.is_finished()).count()
  }

  /// Abort every pending timer without firing.
  pub fn cancel_all(&mut self) {
    for (_, handle) in self.pending.drain() {
      handle.abort();
    }
  }
}

impl<K> Drop for Debouncer<K> {
  fn drop(&mut self) {
    for handle in self.pending.values() {
      handle.abort();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::time::Instant;

  #[tokio::test(start_paused = true)]
  async fn burst_fires_once() {
    let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(500));
    let start = Instant::now();

    for _ in 0..5 {
      debouncer.notify("manifest");
      tokio::time::sleep(Duration::from_millis(100)).await;
    }

    assert_eq!(rx.recv().await, Some("manifest"));
    // Last notification at 400ms plus the full quiet period
    assert!(start.elapsed() >= Duration::from_millis(900));

    let second = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
    assert!(second.is_err(), "burst must fire only once");
  }

  #[tokio::test(start_paused = true)]
  async fn keys_are_independent() {
    let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(500));

    debouncer.notify("manifest");
    debouncer.notify("lock");
    debouncer.notify("manifest");

    let mut fired = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
    fired.sort();
    assert_eq!(fired, vec!["lock", "manifest"]);
  }

  #[tokio::test(start_paused = true)]
  async fn cancel_all_prevents_firing() {
    let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(500));
    debouncer.notify(1u8);
    assert_eq!(debouncer.pending(), 1);

    debouncer.cancel_all();
    assert_eq!(debouncer.pending(), 0);

    let fired = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
    assert!(fired.is_err());
  }

  #[tokio::test(start_paused = true)]
  async fn dropping_the_debouncer_aborts_timers() {
    let (mut debouncer, mut rx) = Debouncer::new(Duration::from_millis(500));
    debouncer.notify("x");
    drop(debouncer);

    // All senders are gone once the aborted task is dropped
    assert_eq!(rx.recv().await, None);
  }
}
