use std::fmt;
use std::str::FromStr;

/// Operating systems the environment tool resolves packages for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  Darwin,
}

impl Os {
  /// Map a `std::env::consts::OS` value to a supported operating system
  pub fn from_consts(os: &str) -> Option<Self> {
    match os {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::Darwin),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::Darwin => "darwin",
    }
  }
}

impl FromStr for Os {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "linux" => Ok(Self::Linux),
      "darwin" => Ok(Self::Darwin),
      _ => Err(()),
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn macos_uses_darwin_identifier() {
    // Darwin is the expected identifier for macOS in platform triples
    assert_eq!(Os::from_consts("macos"), Some(Os::Darwin));
    assert_eq!(Os::Darwin.as_str(), "darwin");
  }

  #[test]
  fn windows_is_not_supported() {
    assert_eq!(Os::from_consts("windows"), None);
  }
}
