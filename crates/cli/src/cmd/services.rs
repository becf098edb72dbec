//! Implementation of the `envlens services` command.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use envlens_lib::command::{CliRunner, Invocation, ServiceAction};
use envlens_lib::services::{ServiceStatusMap, parse_status_output};

use super::{CmdContext, runtime};
use crate::output::{print_info, print_json, print_success, symbols};

/// Best-effort status query; failures are logged and yield an empty map.
pub(crate) async fn query_services(runner: &CliRunner, dir: &Path) -> ServiceStatusMap {
  match runner.run(&Invocation::services_status(dir)).await {
    Ok(output) => parse_status_output(&output.stdout),
    Err(e) if e.is_not_found() => {
      warn!(error = %e, "environment tool not found, service status unavailable");
      ServiceStatusMap::new()
    }
    Err(e) => {
      debug!(error = %e, "service status query failed");
      ServiceStatusMap::new()
    }
  }
}

pub fn cmd_services(ctx: &CmdContext, action: Option<ServiceAction>, name: Option<&str>, json: bool) -> Result<()> {
  let rt = runtime()?;
  let runner = ctx.runner();

  let Some(action) = action else {
    let output = rt
      .block_on(runner.run(&Invocation::services_status(&ctx.dir)))
      .context("Failed to query services")?;
    let mut records = parse_status_output(&output.stdout);
    if let Some(name) = name {
      records.retain(|key, _| key == name);
    }

    if json {
      let list: Vec<_> = records.values().collect();
      return print_json(&list);
    }

    if records.is_empty() {
      print_info("No services reported.");
      return Ok(());
    }

    for record in records.values() {
      let marker = if record.is_running() {
        symbols::RUNNING
      } else {
        symbols::STOPPED
      };
      match record.pid {
        Some(pid) => println!("  {} {} {} (pid {})", marker, record.name, record.status, pid),
        None => println!("  {} {} {}", marker, record.name, record.status),
      }
    }
    return Ok(());
  };

  let invocation = Invocation::services_control(action, &ctx.dir, name);
  rt.block_on(runner.run(&invocation))
    .with_context(|| format!("Failed to {} services", action.as_str()))?;

  let target = name.unwrap_or("all services");
  let verb = match action {
    ServiceAction::Start => "Started",
    ServiceAction::Stop => "Stopped",
    ServiceAction::Restart => "Restarted",
  };
  print_success(&format!("{} {}", verb, target));
  Ok(())
}
