//! Manifest types.
//!
//! The same types describe both the user-edited `manifest.toml` and the
//! copy of it that the lock file records as last resolved, so the two can be
//! compared entity by entity.
//!
//! # Example
//!
//! ```toml
//! version = 1
//!
//! [install]
//! hello.pkg-path = "hello"
//! nodejs = { pkg-path = "nodejs", version = "^20" }
//!
//! [vars]
//! GREETING = "hi"
//!
//! [services.web]
//! command = "python -m http.server"
//! ```
//!
//! Fields the crate does not interpret are preserved in `extra` maps so that
//! they still take part in comparisons.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::Platform;

/// A parsed manifest document.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manifest {
  /// Manifest schema version.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<u32>,

  /// Installed packages, keyed by install id.
  #[serde(default)]
  pub install: BTreeMap<String, PackageDescriptor>,

  /// Environment variables set on activation.
  #[serde(default)]
  pub vars: BTreeMap<String, String>,

  /// Service definitions, keyed by service name.
  #[serde(default)]
  pub services: BTreeMap<String, ServiceDescriptor>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hook: Option<Value>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub profile: Option<Value>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Value>,

  /// Sections this crate does not know about.
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

impl Manifest {
  /// Parse a manifest from TOML text.
  pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  /// Returns true if no packages, variables, or services are declared.
  pub fn is_empty(&self) -> bool {
    self.install.is_empty() && self.vars.is_empty() && self.services.is_empty()
  }
}

/// A package entry under `[install]`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageDescriptor {
  /// Attribute path of the package in the catalog (e.g., "python311Packages.pip").
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pkg_path: Option<String>,

  /// Requested version or semver range.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,

  /// Platforms the package is restricted to; `None` means all.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub systems: Option<Vec<String>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pkg_group: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub priority: Option<u64>,

  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

impl PackageDescriptor {
  /// Returns true if the package is expected to be installed on `platform`.
  pub fn applies_to(&self, platform: &Platform) -> bool {
    match &self.systems {
      Some(systems) => {
        let triple = platform.triple();
        systems.iter().any(|s| s.trim() == triple)
      }
      None => true,
    }
  }
}

/// A service entry under `[services]`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceDescriptor {
  /// Command line that starts the service.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub command: Option<String>,

  /// Variables set only for this service.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub vars: Option<BTreeMap<String, String>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_daemon: Option<bool>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shutdown: Option<Value>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub systems: Option<Vec<String>>,

  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}
