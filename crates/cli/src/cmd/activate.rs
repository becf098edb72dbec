//! Implementation of `envlens activate` and `envlens deactivate`.
//!
//! Activation runs the environment tool inside the pre-activation baseline,
//! turns its printed environment into a snapshot relative to that baseline,
//! and applies the snapshot to the persistent collection, this process, and
//! any registered terminal sessions. Deactivation reverts all of it.

use anyhow::{Context, Result};
use tracing::info;

use envlens_lib::command::Invocation;
use envlens_lib::environment::{
  AppliedState, EnvDiff, EnvironmentApplier, FileCollection, OsEnvironment, PatchFileSession, ProcessEnvironment,
  SessionHandle, parse_env_output, snapshot_from_activation,
};
use envlens_lib::platform::paths::{collection_path, sessions_dir, state_path};

use super::{CmdContext, runtime};
use crate::output::{print_info, print_stat, print_success};

/// What one activation changed.
pub(crate) struct ActivationOutcome {
  pub diff: Option<EnvDiff>,
  pub sessions_patched: usize,
}

fn open_applier(ctx: &CmdContext) -> Result<EnvironmentApplier<FileCollection, OsEnvironment>> {
  let state = AppliedState::load(&state_path()?).context("Failed to load applied state")?;
  let collection = FileCollection::open(collection_path()?).context("Failed to open variable collection")?;
  Ok(EnvironmentApplier::new(
    collection,
    OsEnvironment::new(),
    state,
    ctx.settings.max_patched_sessions,
  ))
}

fn open_sessions() -> Result<Vec<Box<dyn SessionHandle>>> {
  let sessions = PatchFileSession::discover(&sessions_dir()?).context("Failed to discover sessions")?;
  Ok(
    sessions
      .into_iter()
      .map(|s| Box::new(s) as Box<dyn SessionHandle>)
      .collect(),
  )
}

/// Run the environment tool and apply the resulting variables.
///
/// The tool runs in the ambient environment (the saved baseline, or this
/// process's variables before the first activation) and its output is
/// compared against that same map. Variables local to the invoking terminal
/// never reach the child, so they cannot show up as activation changes.
pub(crate) async fn activate(ctx: &CmdContext) -> Result<ActivationOutcome> {
  let mut applier = open_applier(ctx)?;
  let ambient = match applier.baseline() {
    Some(baseline) => baseline.clone(),
    None => applier.process().vars(),
  };

  let output = ctx
    .runner()
    .run_with_env(&Invocation::activate_env(&ctx.dir), &ambient)
    .await
    .context("Failed to activate environment")?;
  let activated = parse_env_output(&output.stdout);
  let snapshot = snapshot_from_activation(&ambient, &activated);

  let mut sessions = open_sessions()?;
  let diff = applier
    .apply(&snapshot, &mut sessions)
    .context("Failed to apply environment")?;
  applier
    .state()
    .save(&state_path()?)
    .context("Failed to save applied state")?;

  let sessions_patched = match &diff {
    Some(diff) if !diff.is_empty() => sessions.len().min(ctx.settings.max_patched_sessions),
    _ => 0,
  };
  info!(dir = %ctx.dir.display(), sessions_patched, "activation complete");

  Ok(ActivationOutcome { diff, sessions_patched })
}

pub fn cmd_activate(ctx: &CmdContext) -> Result<()> {
  let rt = runtime()?;
  let outcome = rt.block_on(activate(ctx))?;

  match outcome.diff {
    None => print_info("Activation produced no variables."),
    Some(diff) if diff.is_empty() => print_success("Environment already up to date"),
    Some(diff) => {
      print_success(&format!("Applied {} change(s)", diff.len()));
      if ctx.verbose {
        for (name, value) in &diff.changed {
          match value {
            Some(_) => println!("  + {}", name),
            None => println!("  - {}", name),
          }
        }
        for name in &diff.dropped {
          println!("  ~ {} (restored)", name);
        }
      }
      print_stat("Sessions patched", &outcome.sessions_patched.to_string());
    }
  }

  Ok(())
}

pub fn cmd_deactivate(ctx: &CmdContext) -> Result<()> {
  let mut applier = open_applier(ctx)?;
  let mut sessions = open_sessions()?;

  let reverted = applier
    .restore(&mut sessions)
    .context("Failed to restore environment")?;
  applier
    .state()
    .save(&state_path()?)
    .context("Failed to save applied state")?;

  if reverted == 0 {
    print_info("Nothing to deactivate.");
  } else {
    print_success(&format!("Reverted {} variable(s)", reverted));
  }
  Ok(())
}
