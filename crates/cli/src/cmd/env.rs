//! Implementation of `envlens env`.
//!
//! Prints the applied variables as statements for the chosen shell, e.g.
//! `eval "$(envlens env)"`. With `--session`, the terminal also registers a
//! patch file that later activations append to.

use anyhow::{Context, Result, anyhow};

use envlens_lib::environment::{EnvCollection, FileCollection, PatchFileSession, render_exports};
use envlens_lib::platform::paths::{collection_path, sessions_dir};
use envlens_lib::platform::shell::Shell;

pub fn cmd_env(shell: Option<&str>, session: Option<&str>) -> Result<()> {
  let shell = match shell {
    Some(name) => name.parse::<Shell>().map_err(|e| anyhow!(e))?,
    None => Shell::detect(),
  };

  let collection = FileCollection::open(collection_path()?).context("Failed to open variable collection")?;
  print!("{}", render_exports(collection.entries(), shell));

  if let Some(id) = session {
    let session = PatchFileSession::register(&sessions_dir()?, id, shell).context("Failed to register session")?;
    eprintln!("# session patches: {}", session.path().display());
  }

  Ok(())
}
