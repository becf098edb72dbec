//! Implementation of `envlens watch`.
//!
//! File events for the manifest and lock file are debounced per file. Each
//! settled change reloads the environment (and optionally re-activates it)
//! under an [`ActivationGuard`], so a change that settles while a reload is
//! still running is dropped rather than queued.

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tracing::{debug, warn};

use envlens_lib::consts::{LOCK_FILENAME, MANIFEST_FILENAME};
use envlens_lib::guard::{ActivationGuard, Debouncer};
use envlens_lib::platform::paths::env_dir;
use envlens_lib::reconcile::ReconciliationStore;

use super::activate::activate;
use super::status::{print_status, refresh_panels};
use super::{CmdContext, runtime};
use crate::output::{print_info, print_success};
use crate::report::report_error;

/// File name of `path` if it is one of the environment files.
fn watched_file(path: &Path) -> Option<String> {
  let name = path.file_name()?.to_str()?;
  (name == MANIFEST_FILENAME || name == LOCK_FILENAME).then(|| name.to_string())
}

async fn refresh(ctx: &CmdContext, store: &ReconciliationStore, reactivate: bool) {
  let reconciliation = store.reload().await;

  if reactivate && reconciliation.exists {
    match activate(ctx).await {
      Ok(outcome) => {
        if let Some(diff) = outcome.diff.filter(|d| !d.is_empty()) {
          print_success(&format!("Re-applied {} change(s)", diff.len()));
        }
      }
      Err(e) => report_error(&e),
    }
  }

  let panels = refresh_panels(ctx, reconciliation.clone()).await;
  println!();
  print_status(ctx, &reconciliation, &panels);
}

async fn watch_loop(ctx: Rc<CmdContext>, reactivate: bool) -> Result<()> {
  let watch_dir = env_dir(&ctx.dir);
  if !watch_dir.is_dir() {
    bail!(
      "No environment found in {}. Run 'envlens init' to create one.",
      ctx.dir.display()
    );
  }

  let (event_tx, mut events) = mpsc::unbounded_channel();
  let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
    let _ = event_tx.send(res);
  })
  .context("Failed to create file watcher")?;
  watcher
    .watch(&watch_dir, RecursiveMode::NonRecursive)
    .with_context(|| format!("Failed to watch {}", watch_dir.display()))?;

  let store = Rc::new(ReconciliationStore::new(ctx.dir.clone(), ctx.platform));
  let guard = ActivationGuard::new();
  let (mut debouncer, mut settled) = Debouncer::new(ctx.settings.debounce());

  refresh(&ctx, &store, false).await;
  print_info(&format!(
    "Watching {} (debounce {}). Press Ctrl-C to stop.",
    watch_dir.display(),
    humantime::format_duration(debouncer.delay())
  ));

  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  loop {
    tokio::select! {
      _ = &mut ctrl_c => break,
      Some(res) = events.recv() => match res {
        Ok(event) if matches!(event.kind, EventKind::Access(_)) => {}
        Ok(event) => {
          for file in event.paths.iter().filter_map(|p| watched_file(p)) {
            debug!(file = %file, "file changed");
            debouncer.notify(file);
          }
        }
        Err(e) => warn!(error = %e, "file watcher error"),
      },
      Some(file) = settled.recv() => {
        let ctx = Rc::clone(&ctx);
        let store = Rc::clone(&store);
        let guard = guard.clone();
        tokio::task::spawn_local(async move {
          guard.run(&file, refresh(&ctx, &store, reactivate)).await;
        });
      }
    }
  }

  debouncer.cancel_all();
  print_info("Stopped watching");
  Ok(())
}

pub fn cmd_watch(ctx: &CmdContext, reactivate: bool) -> Result<()> {
  let rt = runtime()?;
  let local = LocalSet::new();
  local.block_on(&rt, watch_loop(Rc::new(ctx.clone()), reactivate))
}
