//! Lock file parsing.
//!
//! The lock file (`manifest.lock`) is written by the environment tool after a
//! successful resolution. It records a copy of the manifest as it was
//! resolved plus one record per resolved package and platform.
//!
//! # Lock File Format
//!
//! ```json
//! {
//!   "lockfile-version": 1,
//!   "manifest": {
//!     "version": 1,
//!     "install": { "hello": { "pkg-path": "hello" } },
//!     "vars": { "GREETING": "hi" }
//!   },
//!   "packages": [
//!     {
//!       "install_id": "hello",
//!       "system": "x86_64-linux",
//!       "version": "2.12.1",
//!       "group": "toplevel",
//!       "license": "GPL-3.0-or-later",
//!       "description": "A program that produces a familiar, friendly greeting",
//!       "attr_path": "hello"
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::manifest::Manifest;
use crate::platform::Platform;

/// Current lock file format version.
pub const LOCK_VERSION: u32 = 1;

/// A parsed lock file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockFile {
  /// Lock file format version.
  #[serde(rename = "lockfile-version")]
  pub version: u32,

  /// The manifest sections as last resolved.
  #[serde(default)]
  pub manifest: Manifest,

  /// Resolved package records, one per install id and platform.
  #[serde(default)]
  pub packages: Vec<LockedPackage>,
}

/// A resolved package record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedPackage {
  /// Install id matching a key under `[install]`.
  pub install_id: String,

  /// Platform triple this record was resolved for.
  pub system: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub group: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub license: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,

  /// Attribute path the package was resolved from.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub attr_path: Option<String>,

  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

/// Errors that can occur when reading lock files.
#[derive(Debug, Error)]
pub enum LockError {
  /// Failed to parse the lock file JSON.
  #[error("failed to parse lock file: {0}")]
  Parse(#[source] serde_json::Error),

  /// Lock file version is not supported.
  #[error("unsupported lock file version {0}, expected {LOCK_VERSION}")]
  UnsupportedVersion(u32),
}

impl LockFile {
  /// Parse lock file JSON and check its version.
  pub fn from_json_str(content: &str) -> Result<Self, LockError> {
    let lock: LockFile = serde_json::from_str(content).map_err(LockError::Parse)?;

    if lock.version != LOCK_VERSION {
      return Err(LockError::UnsupportedVersion(lock.version));
    }

    Ok(lock)
  }

  /// Package records resolved for `platform`, keyed by install id.
  pub fn packages_for(&self, platform: &Platform) -> BTreeMap<&str, &LockedPackage> {
    let triple = platform.triple();
    self
      .packages
      .iter()
      .filter(|pkg| pkg.system == triple)
      .map(|pkg| (pkg.install_id.as_str(), pkg))
      .collect()
  }
}
