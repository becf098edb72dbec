pub mod arch;
pub mod os;
pub mod paths;
pub mod shell;

use arch::Arch;
use os::Os;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while detecting or parsing a platform identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
  /// The running machine is not one of the four supported platforms.
  #[error("unsupported platform: {arch}-{os} (supported: {})", SUPPORTED_TRIPLES.join(", "))]
  Unsupported { arch: String, os: String },

  /// A platform identifier string could not be parsed.
  #[error("invalid platform identifier: {0}")]
  Invalid(String),
}

/// Every platform identifier the environment tool resolves packages for.
pub const SUPPORTED_TRIPLES: [&str; 4] = ["aarch64-darwin", "aarch64-linux", "x86_64-darwin", "x86_64-linux"];

/// Platform identifier combining architecture and OS (e.g., "aarch64-darwin")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the current platform at runtime.
  ///
  /// Detection is meant to happen once at startup; the result is treated as
  /// fixed for the lifetime of the process.
  pub fn current() -> Result<Self, PlatformError> {
    Self::detect(std::env::consts::ARCH, std::env::consts::OS)
  }

  /// Build a platform from raw `std::env::consts`-style names.
  pub fn detect(arch: &str, os: &str) -> Result<Self, PlatformError> {
    match (Arch::from_consts(arch), Os::from_consts(os)) {
      (Some(arch), Some(os)) => Ok(Self { arch, os }),
      _ => Err(PlatformError::Unsupported {
        arch: arch.to_string(),
        os: os.to_string(),
      }),
    }
  }

  /// Returns the platform triple string (e.g., "aarch64-darwin")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.arch, self.os)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}

impl FromStr for Platform {
  type Err = PlatformError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (arch, os) = s.split_once('-').ok_or_else(|| PlatformError::Invalid(s.to_string()))?;
    match (Arch::from_str(arch), Os::from_str(os)) {
      (Ok(arch), Ok(os)) => Ok(Self { arch, os }),
      _ => Err(PlatformError::Invalid(s.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn platform_triple_format() {
    // Verifies the triple format is "arch-os"
    let platform = Platform::new(Arch::Aarch64, Os::Darwin);
    assert_eq!(platform.triple(), "aarch64-darwin");

    let platform = Platform::new(Arch::X86_64, Os::Linux);
    assert_eq!(platform.triple(), "x86_64-linux");
  }

  #[test]
  fn exactly_four_platforms_are_supported() {
    let mut triples = Vec::new();
    for arch in [Arch::X86_64, Arch::Aarch64] {
      for os in [Os::Linux, Os::Darwin] {
        triples.push(Platform::new(arch, os).triple());
      }
    }
    triples.sort();
    assert_eq!(triples, SUPPORTED_TRIPLES);
  }

  #[test]
  fn detect_maps_macos_to_darwin() {
    let platform = Platform::detect("aarch64", "macos").unwrap();
    assert_eq!(platform.triple(), "aarch64-darwin");
  }

  #[test]
  fn detect_rejects_unsupported_combinations() {
    let err = Platform::detect("x86_64", "windows").unwrap_err();
    assert_eq!(
      err,
      PlatformError::Unsupported {
        arch: "x86_64".to_string(),
        os: "windows".to_string()
      }
    );
    assert!(err.to_string().contains("x86_64-linux"));

    assert!(Platform::detect("riscv64", "linux").is_err());
  }

  #[test]
  fn parses_triples() {
    for triple in SUPPORTED_TRIPLES {
      let platform: Platform = triple.parse().unwrap();
      assert_eq!(platform.triple(), triple);
    }
    assert!("x86_64".parse::<Platform>().is_err());
    assert!("mips-linux".parse::<Platform>().is_err());
  }
}
