use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::Result;

use envlens_lib::environment::{AppliedState, PatchFileSession};
use envlens_lib::platform::paths::{config_path, data_dir, lock_path, manifest_path, sessions_dir, state_path};

use super::CmdContext;
use crate::output::print_stat;

/// "present, modified 5m ago" style description of a file.
fn describe_file(path: &Path) -> String {
  let Ok(metadata) = path.metadata() else {
    return "missing".to_string();
  };

  match metadata.modified().ok().and_then(|m| SystemTime::now().duration_since(m).ok()) {
    Some(age) => format!(
      "present, modified {} ago",
      humantime::format_duration(Duration::from_secs(age.as_secs()))
    ),
    None => "present".to_string(),
  }
}

pub fn cmd_info(ctx: &CmdContext) -> Result<()> {
  println!("System:");
  match ctx.platform {
    Some(platform) => print_stat("Platform", &platform.triple()),
    None => print_stat("Platform", "unsupported"),
  }
  print_stat("Version", env!("CARGO_PKG_VERSION"));

  println!();
  println!("Environment:");
  print_stat("Directory", &ctx.dir.display().to_string());
  let manifest = manifest_path(&ctx.dir);
  let lock = lock_path(&ctx.dir);
  print_stat("Manifest", &format!("{} ({})", manifest.display(), describe_file(&manifest)));
  print_stat("Lock", &format!("{} ({})", lock.display(), describe_file(&lock)));

  println!();
  println!("Settings:");
  print_stat("Config", &config_path()?.display().to_string());
  print_stat("CLI binary", &ctx.settings.cli_binary.display().to_string());
  print_stat("Debounce", &humantime::format_duration(ctx.settings.debounce()).to_string());
  print_stat("Max patched sessions", &ctx.settings.max_patched_sessions.to_string());

  println!();
  println!("Data:");
  print_stat("Directory", &data_dir()?.display().to_string());
  let applied = match AppliedState::load(&state_path()?) {
    Ok(state) => state.previous.len().to_string(),
    Err(e) => format!("unreadable ({})", e),
  };
  print_stat("Applied variables", &applied);
  let sessions = match PatchFileSession::discover(&sessions_dir()?) {
    Ok(sessions) => sessions.len().to_string(),
    Err(e) => format!("unreadable ({})", e),
  };
  print_stat("Registered sessions", &sessions);

  Ok(())
}
