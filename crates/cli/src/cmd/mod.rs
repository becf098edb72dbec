mod activate;
mod env;
mod info;
mod package;
mod search;
mod services;
mod status;
mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::debug;

use envlens_lib::command::CliRunner;
use envlens_lib::platform::Platform;
use envlens_lib::settings::Settings;

use crate::output::print_warning;

pub use activate::{cmd_activate, cmd_deactivate};
pub use env::cmd_env;
pub use info::cmd_info;
pub use package::{cmd_init, cmd_install, cmd_list, cmd_show, cmd_uninstall};
pub use search::cmd_search;
pub use services::cmd_services;
pub use status::cmd_status;
pub use watch::cmd_watch;

/// State shared by every command of one invocation.
#[derive(Clone)]
pub struct CmdContext {
  pub dir: PathBuf,
  pub settings: Settings,
  /// `None` when the host platform is unsupported.
  pub platform: Option<Platform>,
  pub verbose: bool,
}

impl CmdContext {
  pub fn new(dir: &Path, verbose: bool) -> Result<Self> {
    let dir = dunce::canonicalize(dir).with_context(|| format!("Environment directory not found: {}", dir.display()))?;
    let settings = Settings::load().context("Failed to load settings")?;

    let platform = match Platform::current() {
      Ok(platform) => Some(platform),
      Err(e) => {
        print_warning(&format!("{}; package features are disabled", e));
        None
      }
    };

    debug!(dir = %dir.display(), ?platform, "command context ready");
    Ok(Self {
      dir,
      settings,
      platform,
      verbose,
    })
  }

  pub fn runner(&self) -> CliRunner {
    CliRunner::new(&self.settings.cli_binary)
  }
}

/// Single-threaded runtime for one command.
pub fn runtime() -> Result<Runtime> {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")
}
