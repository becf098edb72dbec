//! Parsing of `search --json` output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One catalog match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
  /// Attribute path used to install the package.
  pub attr_path: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pname: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,

  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

/// Parse search output; malformed output is logged and yields no results.
///
/// Entries that do not look like search results are skipped individually.
pub fn parse_search_output(output: &str) -> Vec<SearchResult> {
  let trimmed = output.trim();
  if trimmed.is_empty() {
    return Vec::new();
  }

  match serde_json::from_str::<Vec<Value>>(trimmed) {
    Ok(items) => items
      .into_iter()
      .filter_map(|item| serde_json::from_value(item).ok())
      .collect(),
    Err(e) => {
      warn!(error = %e, line = e.line(), column = e.column(), "failed to parse search output");
      Vec::new()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_results() {
    let output = r#"[
      {"attr_path": "jq", "pname": "jq", "version": "1.7.1", "description": "Command-line JSON processor", "license": "MIT"},
      {"attr_path": "gojq", "pname": "gojq", "version": "0.12.16"}
    ]"#;

    let results = parse_search_output(output);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].attr_path, "jq");
    assert_eq!(results[0].extra["license"], Value::String("MIT".to_string()));
    assert_eq!(results[1].description, None);
  }

  #[test]
  fn skips_entries_without_attr_path() {
    let results = parse_search_output(r#"[{"pname": "x"}, {"attr_path": "y"}, "junk"]"#);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].attr_path, "y");
  }

  #[test]
  fn malformed_or_empty_output_yields_nothing() {
    assert!(parse_search_output("").is_empty());
    assert!(parse_search_output("error: catalog unavailable").is_empty());
  }
}
