use std::fmt;
use std::path::Path;

/// Subcommands of the external tool this crate is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
  Activate,
  Init,
  Install,
  List,
  Search,
  Services,
  Show,
  Uninstall,
}

impl Subcommand {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Activate => "activate",
      Self::Init => "init",
      Self::Install => "install",
      Self::List => "list",
      Self::Search => "search",
      Self::Services => "services",
      Self::Show => "show",
      Self::Uninstall => "uninstall",
    }
  }
}

impl fmt::Display for Subcommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Service lifecycle actions under `services`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
  Start,
  Stop,
  Restart,
}

impl ServiceAction {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Start => "start",
      Self::Stop => "stop",
      Self::Restart => "restart",
    }
  }
}

/// A subcommand plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  subcommand: Subcommand,
  args: Vec<String>,
}

fn dir_arg(dir: &Path) -> String {
  dir.display().to_string()
}

impl Invocation {
  fn new(subcommand: Subcommand, args: Vec<String>) -> Self {
    Self { subcommand, args }
  }

  /// Activate the environment and print the resulting environment, NUL-separated.
  pub fn activate_env(dir: &Path) -> Self {
    Self::new(
      Subcommand::Activate,
      vec![
        "--dir".into(),
        dir_arg(dir),
        "--".into(),
        "env".into(),
        "-0".into(),
      ],
    )
  }

  pub fn init(dir: &Path) -> Self {
    Self::new(Subcommand::Init, vec!["--dir".into(), dir_arg(dir)])
  }

  pub fn install(dir: &Path, package: &str) -> Self {
    Self::new(
      Subcommand::Install,
      vec!["--dir".into(), dir_arg(dir), package.to_string()],
    )
  }

  pub fn uninstall(dir: &Path, package: &str) -> Self {
    Self::new(
      Subcommand::Uninstall,
      vec!["--dir".into(), dir_arg(dir), package.to_string()],
    )
  }

  pub fn list(dir: &Path) -> Self {
    Self::new(Subcommand::List, vec!["--dir".into(), dir_arg(dir)])
  }

  pub fn search(query: &str) -> Self {
    Self::new(Subcommand::Search, vec!["--json".into(), query.to_string()])
  }

  pub fn show(package: &str) -> Self {
    Self::new(Subcommand::Show, vec![package.to_string()])
  }

  pub fn services_status(dir: &Path) -> Self {
    Self::new(
      Subcommand::Services,
      vec!["status".into(), "--json".into(), "--dir".into(), dir_arg(dir)],
    )
  }

  /// Start, stop, or restart one service, or all of them when `name` is `None`.
  pub fn services_control(action: ServiceAction, dir: &Path, name: Option<&str>) -> Self {
    let mut args = vec![action.as_str().to_string(), "--dir".into(), dir_arg(dir)];
    args.extend(name.map(str::to_string));
    Self::new(Subcommand::Services, args)
  }

  pub fn subcommand(&self) -> Subcommand {
    self.subcommand
  }

  /// Full argument vector, subcommand first.
  pub fn argv(&self) -> Vec<String> {
    std::iter::once(self.subcommand.as_str().to_string())
      .chain(self.args.iter().cloned())
      .collect()
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.argv().join(" "))
  }
}
