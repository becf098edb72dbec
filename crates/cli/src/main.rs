mod cmd;
mod output;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use cmd::CmdContext;

/// envlens - Inspect and apply a declarative development environment
#[derive(Parser)]
#[command(name = "envlens")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Directory the environment is rooted at
  #[arg(short, long, global = true, default_value = ".")]
  dir: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ServicesVerb {
  Status,
  Start,
  Stop,
  Restart,
}

#[derive(Subcommand)]
enum Commands {
  /// Show packages, variables, and services with their lifecycle state
  Status {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Query or control environment services
  Services {
    #[arg(value_enum, default_value_t = ServicesVerb::Status)]
    verb: ServicesVerb,

    /// A single service; all services when omitted
    name: Option<String>,

    /// Output status as JSON
    #[arg(long)]
    json: bool,
  },

  /// Activate the environment and apply its variables
  Activate,

  /// Revert everything applied by `activate`
  Deactivate,

  /// Print the applied variables as shell statements
  Env {
    /// Shell to render for (auto-detected if not specified)
    #[arg(short, long)]
    shell: Option<String>,

    /// Register this terminal session to receive future changes
    #[arg(long)]
    session: Option<String>,
  },

  /// Search the package catalog
  Search {
    query: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Show details of a catalog package
  Show { package: String },

  /// Install a package into the environment
  Install { package: String },

  /// Remove a package from the environment
  Uninstall { package: String },

  /// List installed packages as reported by the environment tool
  List,

  /// Create a new environment in the directory
  Init,

  /// Re-render status whenever the manifest or lock file changes
  Watch {
    /// Re-activate after each change
    #[arg(long)]
    activate: bool,
  },

  /// Show platform, paths, and settings
  Info,
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      report::report_error(&err);
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  let ctx = CmdContext::new(&cli.dir, cli.verbose)?;

  match cli.command {
    Commands::Status { json } => cmd::cmd_status(&ctx, json),
    Commands::Services { verb, name, json } => {
      let action = match verb {
        ServicesVerb::Status => None,
        ServicesVerb::Start => Some(envlens_lib::command::ServiceAction::Start),
        ServicesVerb::Stop => Some(envlens_lib::command::ServiceAction::Stop),
        ServicesVerb::Restart => Some(envlens_lib::command::ServiceAction::Restart),
      };
      cmd::cmd_services(&ctx, action, name.as_deref(), json)
    }
    Commands::Activate => cmd::cmd_activate(&ctx),
    Commands::Deactivate => cmd::cmd_deactivate(&ctx),
    Commands::Env { shell, session } => cmd::cmd_env(shell.as_deref(), session.as_deref()),
    Commands::Search { query, json } => cmd::cmd_search(&ctx, &query, json),
    Commands::Show { package } => cmd::cmd_show(&ctx, &package),
    Commands::Install { package } => cmd::cmd_install(&ctx, &package),
    Commands::Uninstall { package } => cmd::cmd_uninstall(&ctx, &package),
    Commands::List => cmd::cmd_list(&ctx),
    Commands::Init => cmd::cmd_init(&ctx),
    Commands::Watch { activate } => cmd::cmd_watch(&ctx, activate),
    Commands::Info => cmd::cmd_info(&ctx),
  }
}
