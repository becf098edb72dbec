//! Invocation of the external environment tool.
//!
//! Only a fixed set of subcommands can be run; arguments are assembled by
//! the constructors on [`Invocation`].

mod invocation;
mod runner;

pub use invocation::{Invocation, ServiceAction, Subcommand};
pub use runner::{CliError, CliOutput, CliRunner};
