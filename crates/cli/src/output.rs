//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output including colored status
//! messages, lifecycle markers, and panel rendering.

use anyhow::Context;
use owo_colors::{OwoColorize, Stream};

use envlens_lib::panel::{Panel, PanelItem};
use envlens_lib::reconcile::LifecycleState;

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const PENDING: &str = "~";
  pub const RUNNING: &str = "●";
  pub const STOPPED: &str = "○";
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

fn state_marker(state: LifecycleState) -> String {
  match state {
    LifecycleState::Active => symbols::SUCCESS
      .if_supports_color(Stream::Stdout, |s| s.green())
      .to_string(),
    LifecycleState::Pending => symbols::PENDING
      .if_supports_color(Stream::Stdout, |s| s.yellow())
      .to_string(),
    LifecycleState::Absent => symbols::INFO
      .if_supports_color(Stream::Stdout, |s| s.dimmed())
      .to_string(),
  }
}

fn running_marker(running: bool) -> String {
  if running {
    symbols::RUNNING
      .if_supports_color(Stream::Stdout, |s| s.green())
      .to_string()
  } else {
    symbols::STOPPED
      .if_supports_color(Stream::Stdout, |s| s.dimmed())
      .to_string()
  }
}

/// One panel row as printed.
pub fn format_item(item: &PanelItem) -> String {
  let mut line = format!("  {} {}", state_marker(item.state), item.label);
  if let Some(running) = item.running {
    line = format!("{} {}", line, running_marker(running));
  }
  if let Some(detail) = &item.detail {
    line = format!(
      "{} {}",
      line,
      detail.if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }
  if item.state == LifecycleState::Pending {
    line = format!("{} (pending)", line);
  }
  line
}

pub fn print_panel(panel: &dyn Panel) {
  println!("{}:", panel.title());
  if panel.items().is_empty() {
    println!("  (none)");
    return;
  }
  for item in panel.items() {
    println!("{}", format_item(item));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(state: LifecycleState, detail: Option<&str>, running: Option<bool>) -> PanelItem {
    PanelItem {
      label: "jq".to_string(),
      detail: detail.map(str::to_string),
      state,
      running,
    }
  }

  #[test]
  fn active_item_with_detail() {
    let line = format_item(&item(LifecycleState::Active, Some("1.7.1"), None));
    assert!(line.contains("jq"));
    assert!(line.contains("1.7.1"));
    assert!(!line.contains("pending"));
  }

  #[test]
  fn pending_item_is_marked() {
    let line = format_item(&item(LifecycleState::Pending, None, None));
    assert!(line.ends_with("(pending)"));
  }

  #[test]
  fn running_marker_is_shown_for_services() {
    let running = format_item(&item(LifecycleState::Active, None, Some(true)));
    let stopped = format_item(&item(LifecycleState::Active, None, Some(false)));
    assert!(running.contains(symbols::RUNNING));
    assert!(stopped.contains(symbols::STOPPED));
  }
}
