//! Status command implementation.
//!
//! Reconciles the manifest against the lock file and prints one panel per
//! entity category.

use std::sync::Arc;

use anyhow::Result;

use envlens_lib::panel::{PanelContext, PanelSet};
use envlens_lib::reconcile::{Reconciliation, ReconciliationStore};

use super::services::query_services;
use super::{CmdContext, runtime};
use crate::output::{print_info, print_json, print_panel, print_stat};

/// Query service status for `reconciliation` and refresh the standard panels.
pub(crate) async fn refresh_panels(ctx: &CmdContext, reconciliation: Arc<Reconciliation>) -> PanelSet {
  let services = if reconciliation.services.is_empty() {
    Default::default()
  } else {
    query_services(&ctx.runner(), &ctx.dir).await
  };

  let mut panels = PanelSet::standard();
  panels.refresh(&PanelContext::new(reconciliation, Arc::new(services)));
  panels
}

pub(crate) fn print_status(ctx: &CmdContext, reconciliation: &Reconciliation, panels: &PanelSet) {
  if !reconciliation.exists {
    print_info(&format!(
      "No environment found in {}. Run 'envlens init' to create one.",
      ctx.dir.display()
    ));
    return;
  }

  for (i, panel) in panels.panels().enumerate() {
    if i > 0 {
      println!();
    }
    print_panel(panel);
  }

  if ctx.verbose {
    let packages = reconciliation.package_counts();
    let variables = reconciliation.variable_counts();
    let services = reconciliation.service_counts();
    println!();
    print_stat(
      "Packages",
      &format!("{} active, {} pending", packages.active, packages.pending),
    );
    print_stat(
      "Variables",
      &format!("{} active, {} pending", variables.active, variables.pending),
    );
    print_stat(
      "Services",
      &format!("{} active, {} pending", services.active, services.pending),
    );
  }

  if reconciliation.has_pending() {
    println!();
    print_info("Some changes are not locked yet. Run 'envlens activate' to resolve them.");
  }
}

pub fn cmd_status(ctx: &CmdContext, json: bool) -> Result<()> {
  let rt = runtime()?;
  let store = ReconciliationStore::new(ctx.dir.clone(), ctx.platform);

  let (reconciliation, panels) = rt.block_on(async {
    let reconciliation = store.reload().await;
    let panels = refresh_panels(ctx, Arc::clone(&reconciliation)).await;
    (reconciliation, panels)
  });

  if json {
    let panel_list: Vec<_> = panels
      .panels()
      .map(|panel| serde_json::json!({ "title": panel.title(), "items": panel.items() }))
      .collect();
    let json_output = serde_json::json!({
      "dir": ctx.dir,
      "exists": reconciliation.exists,
      "platform": reconciliation.platform.map(|p| p.triple()),
      "panels": panel_list,
    });
    print_json(&json_output)?;
  } else {
    print_status(ctx, &reconciliation, &panels);
  }

  Ok(())
}
