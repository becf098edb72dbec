//! Declarative manifest types.
//!
//! The manifest is the user-edited TOML document describing the desired
//! environment: installed packages, variables, and services.

mod types;

pub use types::*;
