//! Pass-through package commands: `init`, `install`, `uninstall`, `list`, `show`.

use anyhow::{Context, Result};

use envlens_lib::command::Invocation;

use super::{CmdContext, runtime};
use crate::output::print_success;

fn run(ctx: &CmdContext, invocation: &Invocation, what: &str) -> Result<String> {
  let rt = runtime()?;
  let output = rt
    .block_on(ctx.runner().run(invocation))
    .with_context(|| format!("Failed to {}", what))?;
  Ok(output.stdout)
}

pub fn cmd_init(ctx: &CmdContext) -> Result<()> {
  run(ctx, &Invocation::init(&ctx.dir), "initialize environment")?;
  print_success(&format!("Initialized environment in {}", ctx.dir.display()));
  Ok(())
}

pub fn cmd_install(ctx: &CmdContext, package: &str) -> Result<()> {
  run(ctx, &Invocation::install(&ctx.dir, package), &format!("install {}", package))?;
  print_success(&format!("Installed {}", package));
  Ok(())
}

pub fn cmd_uninstall(ctx: &CmdContext, package: &str) -> Result<()> {
  run(ctx, &Invocation::uninstall(&ctx.dir, package), &format!("uninstall {}", package))?;
  print_success(&format!("Uninstalled {}", package));
  Ok(())
}

pub fn cmd_list(ctx: &CmdContext) -> Result<()> {
  let stdout = run(ctx, &Invocation::list(&ctx.dir), "list packages")?;
  print!("{}", stdout);
  Ok(())
}

pub fn cmd_show(ctx: &CmdContext, package: &str) -> Result<()> {
  let stdout = run(ctx, &Invocation::show(package), &format!("show {}", package))?;
  print!("{}", stdout);
  Ok(())
}
