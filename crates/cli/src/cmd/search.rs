//! Implementation of `envlens search`.
//!
//! Catalog searches can be slow. Ctrl-C cancels the wait; the search
//! process itself is left to finish in the background.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use envlens_lib::command::{CliError, Invocation};
use envlens_lib::search::parse_search_output;

use super::{CmdContext, runtime};
use crate::output::{print_info, print_json, print_warning};

pub fn cmd_search(ctx: &CmdContext, query: &str, json: bool) -> Result<()> {
  let rt = runtime()?;
  let runner = ctx.runner();
  let token = CancellationToken::new();

  let result = rt.block_on(async {
    let cancel = token.clone();
    let ctrl_c = tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        debug!("interrupt received, cancelling search");
        cancel.cancel();
      }
    });

    let result = runner.run_cancellable(&Invocation::search(query), &token).await;
    ctrl_c.abort();
    result
  });

  let output = match result {
    Ok(output) => output,
    Err(CliError::Cancelled { .. }) => {
      print_warning("Search cancelled");
      return Ok(());
    }
    Err(e) => return Err(e).context("Search failed"),
  };

  let results = parse_search_output(&output.stdout);
  if json {
    return print_json(&results);
  }

  if results.is_empty() {
    print_info(&format!("No packages found for '{}'", query));
    return Ok(());
  }

  for result in &results {
    let version = result.version.as_deref().unwrap_or("");
    match &result.description {
      Some(description) => println!("  {} {}  {}", result.attr_path, version, description),
      None => println!("  {} {}", result.attr_path, version),
    }
  }
  Ok(())
}
