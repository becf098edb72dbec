//! Shell detection and export-line rendering for terminal injection.

use std::path::Path;
use std::str::FromStr;

/// Supported shell types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
  Bash,
  Zsh,
  Fish,
  PowerShell,
  Sh,
}

impl Shell {
  /// Detect the current shell from `$SHELL`, falling back to POSIX sh.
  pub fn detect() -> Self {
    std::env::var("SHELL")
      .ok()
      .and_then(|shell| {
        Path::new(&shell)
          .file_name()
          .and_then(|n| n.to_str())
          .map(str::to_lowercase)
      })
      .and_then(|name| name.parse().ok())
      .unwrap_or(Shell::Sh)
  }

  /// Get the shell name as a string
  pub fn as_str(&self) -> &'static str {
    match self {
      Shell::Bash => "bash",
      Shell::Zsh => "zsh",
      Shell::Fish => "fish",
      Shell::PowerShell => "powershell",
      Shell::Sh => "sh",
    }
  }

  /// Quote a value so the shell reads it back byte for byte.
  ///
  /// Single quotes everywhere: nothing inside them is expanded. POSIX shells
  /// cannot escape a quote inside single quotes, so it is closed, escaped,
  /// and reopened. Fish honors `\\` and `\'` inside single quotes, and
  /// PowerShell doubles the quote.
  pub fn quote(&self, value: &str) -> String {
    match self {
      Shell::Fish => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'")),
      Shell::PowerShell => format!("'{}'", value.replace('\'', "''")),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("'{}'", value.replace('\'', r"'\''")),
    }
  }

  /// Generate an export statement for setting an environment variable
  pub fn export_var(&self, name: &str, value: &str) -> String {
    let value = self.quote(value);
    match self {
      Shell::Fish => format!("set -gx {} {}", name, value),
      Shell::PowerShell => format!("$env:{} = {}", name, value),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("export {}={}", name, value),
    }
  }

  /// Generate a statement removing a variable from the environment
  pub fn unset_var(&self, name: &str) -> String {
    match self {
      Shell::Fish => format!("set -e {}", name),
      Shell::PowerShell => format!("Remove-Item Env:{} -ErrorAction SilentlyContinue", name),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("unset {}", name),
    }
  }

  /// Generate a prepend statement for a PATH-like variable
  pub fn prepend_path(&self, name: &str, value: &str) -> String {
    let value = self.quote(value);
    match self {
      Shell::Fish => format!("set -gx {} {} ${}", name, value, name),
      Shell::PowerShell => format!(
        "$env:{} = {} + [IO.Path]::PathSeparator + $env:{}",
        name, value, name
      ),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("export {}={}:\"${}\"", name, value, name),
    }
  }

  /// Generate an append statement for a PATH-like variable
  pub fn append_path(&self, name: &str, value: &str) -> String {
    let value = self.quote(value);
    match self {
      Shell::Fish => format!("set -gx {} ${} {}", name, name, value),
      Shell::PowerShell => format!(
        "$env:{} = $env:{} + [IO.Path]::PathSeparator + {}",
        name, name, value
      ),
      Shell::Bash | Shell::Zsh | Shell::Sh => format!("export {}=\"${}\":{}", name, name, value),
    }
  }
}

impl FromStr for Shell {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "bash" => Ok(Shell::Bash),
      "zsh" => Ok(Shell::Zsh),
      "fish" => Ok(Shell::Fish),
      "sh" | "dash" => Ok(Shell::Sh),
      "pwsh" | "powershell" => Ok(Shell::PowerShell),
      other => Err(format!(
        "unknown shell: {}. Supported: bash, zsh, fish, sh, powershell",
        other
      )),
    }
  }
}

impl std::fmt::Display for Shell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  fn bash_export() {
    let export = Shell::Bash.export_var("EDITOR", "nvim");
    assert_eq!(export, "export EDITOR='nvim'");
  }

  #[test]
  fn fish_export() {
    let export = Shell::Fish.export_var("EDITOR", "nvim");
    assert_eq!(export, "set -gx EDITOR 'nvim'");
  }

  #[test]
  fn powershell_export() {
    let export = Shell::PowerShell.export_var("EDITOR", "nvim");
    assert_eq!(export, "$env:EDITOR = 'nvim'");
  }

  #[test]
  fn bash_prepend_path() {
    let prepend = Shell::Bash.prepend_path("PATH", "/usr/local/bin");
    assert_eq!(prepend, r#"export PATH='/usr/local/bin':"$PATH""#);
  }

  #[test]
  fn quotes_are_escaped_per_shell() {
    assert_eq!(Shell::Sh.quote("it's"), r"'it'\''s'");
    assert_eq!(Shell::Fish.quote(r"it's a \ path"), r"'it\'s a \\ path'");
    assert_eq!(Shell::PowerShell.quote("it's"), "'it''s'");
  }

  #[test]
  fn expansions_stay_literal() {
    let line = Shell::Zsh.export_var("V", "cost$HOME`id`");
    assert_eq!(line, "export V='cost$HOME`id`'");
  }

  #[test]
  fn unset_per_shell() {
    assert_eq!(Shell::Zsh.unset_var("FOO"), "unset FOO");
    assert_eq!(Shell::Fish.unset_var("FOO"), "set -e FOO");
  }

  #[test]
  fn parse_rejects_unknown_shell() {
    assert_eq!("PWSH".parse::<Shell>(), Ok(Shell::PowerShell));
    assert!("tcsh".parse::<Shell>().unwrap_err().contains("unknown shell"));
  }

  #[test]
  #[serial]
  fn detect_reads_shell_variable() {
    temp_env::with_var("SHELL", Some("/usr/bin/fish"), || {
      assert_eq!(Shell::detect(), Shell::Fish);
    });
    temp_env::with_var("SHELL", Some("/opt/weird/xonsh"), || {
      assert_eq!(Shell::detect(), Shell::Sh);
    });
  }

  #[cfg(unix)]
  mod evaluated {
    use super::*;
    use std::io::ErrorKind;
    use std::process::Command;

    const TRICKY: &[&str] = &[
      "cost$HOME`echo pwned`",
      "$(touch /tmp/envlens-should-not-exist)",
      "line1\nline2",
      "it's \"quoted\"",
      r"back\slash \\ and \'",
      "tab\there  spaced  ",
      "",
    ];

    /// Run `line` in `program` and return what the shell stored in `V`.
    /// `None` when the shell is not installed.
    fn evaluate(program: &str, line: &str) -> Option<String> {
      let script = format!("{}\nprintf '%s' \"$V\"", line);
      let output = match Command::new(program).arg("-c").arg(&script).env_remove("V").output() {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => panic!("failed to run {program}: {e}"),
      };
      assert!(
        output.status.success(),
        "{program} rejected {line:?}: {}",
        String::from_utf8_lossy(&output.stderr)
      );
      Some(String::from_utf8(output.stdout).unwrap())
    }

    fn assert_round_trip(shell: Shell, program: &str) {
      for value in TRICKY {
        let Some(read_back) = evaluate(program, &shell.export_var("V", value)) else {
          return;
        };
        assert_eq!(&read_back, value, "{program} changed the value");
      }
    }

    #[test]
    fn sh_reads_values_back_verbatim() {
      assert_round_trip(Shell::Sh, "sh");
    }

    #[test]
    fn bash_reads_values_back_verbatim() {
      assert_round_trip(Shell::Bash, "bash");
    }

    #[test]
    fn zsh_reads_values_back_verbatim() {
      assert_round_trip(Shell::Zsh, "zsh");
    }

    #[test]
    fn fish_reads_values_back_verbatim() {
      assert_round_trip(Shell::Fish, "fish");
    }

    #[test]
    fn prepend_keeps_existing_value() {
      let line = format!("V='/usr/bin'\n{}", Shell::Sh.prepend_path("V", "/opt/it's bin"));
      assert_eq!(evaluate("sh", &line).unwrap(), "/opt/it's bin:/usr/bin");
    }
  }
}
