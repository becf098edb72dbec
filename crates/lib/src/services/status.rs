//! Parsing of service status output.
//!
//! The environment tool prints service status as a pretty JSON array, a
//! single JSON object, or newline-delimited JSON, sometimes surrounded by
//! unrelated log lines. [`parse_status_output`] accepts all of these and
//! never fails: unreadable input yields an empty map.
//!
//! # Strategies
//!
//! 1. Parse the whole trimmed input as one JSON value.
//! 2. Clip to the outermost `[...]` or `{...}` span and parse that.
//! 3. Parse each non-blank line on its own, skipping lines that fail.
//!
//! The first strategy that yields a recognizable shape wins.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Status token that marks a service as running, compared case-insensitively.
pub const RUNNING: &str = "running";

/// Status used when a record carries none.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Status of one service as reported by a single query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatusRecord {
  pub name: String,
  pub status: String,
  pub pid: Option<u32>,
  pub exit_code: Option<i32>,
  /// Fields this crate does not interpret, kept verbatim.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl ServiceStatusRecord {
  pub fn is_running(&self) -> bool {
    self.status.trim().eq_ignore_ascii_case(RUNNING)
  }

  /// Build a record from a JSON object; `None` if it has no usable name.
  fn from_object(mut object: Map<String, Value>) -> Option<Self> {
    let name = match object.remove("name") {
      Some(Value::String(name)) if !name.trim().is_empty() => name,
      _ => return None,
    };

    let status = match object.remove("status") {
      Some(Value::String(status)) => status,
      _ => UNKNOWN_STATUS.to_string(),
    };

    let pid = object
      .remove("pid")
      .and_then(|v| v.as_u64())
      .and_then(|v| u32::try_from(v).ok());

    let exit_code = object
      .remove("exit_code")
      .and_then(|v| v.as_i64())
      .and_then(|v| i32::try_from(v).ok());

    Some(Self {
      name,
      status,
      pid,
      exit_code,
      extra: object,
    })
  }
}

/// Service records keyed by name.
pub type ServiceStatusMap = BTreeMap<String, ServiceStatusRecord>;

/// Parse raw status output into a map of records.
///
/// Records without a name are dropped. When a name repeats, the record seen
/// last wins.
pub fn parse_status_output(output: &str) -> ServiceStatusMap {
  let trimmed = output.trim();
  if trimmed.is_empty() {
    return ServiceStatusMap::new();
  }

  let objects = parse_document(trimmed)
    .or_else(|| clip_to_json(trimmed).and_then(parse_document))
    .unwrap_or_else(|| parse_lines(trimmed));

  let mut records = ServiceStatusMap::new();
  for object in objects {
    if let Some(record) = ServiceStatusRecord::from_object(object) {
      records.insert(record.name.clone(), record);
    }
  }

  debug!(count = records.len(), "parsed service status");
  records
}

/// Strategy 1: the input is a single JSON document of a known shape.
fn parse_document(text: &str) -> Option<Vec<Map<String, Value>>> {
  let value: Value = serde_json::from_str(text).ok()?;
  classify(value)
}

/// Pull record objects out of a parsed value, or `None` for unknown shapes.
fn classify(value: Value) -> Option<Vec<Map<String, Value>>> {
  match value {
    Value::Array(items) => Some(into_objects(items)),
    Value::Object(mut object) => {
      if matches!(object.get("services"), Some(Value::Array(_))) {
        if let Some(Value::Array(items)) = object.remove("services") {
          return Some(into_objects(items));
        }
      }
      if object.contains_key("name") {
        return Some(vec![object]);
      }
      None
    }
    _ => None,
  }
}

fn into_objects(items: Vec<Value>) -> Vec<Map<String, Value>> {
  items
    .into_iter()
    .filter_map(|item| match item {
      Value::Object(object) => Some(object),
      _ => None,
    })
    .collect()
}

/// Strategy 2: the slice between the first opening bracket and the last
/// bracket that closes it.
fn clip_to_json(text: &str) -> Option<&str> {
  let start = text.find(['[', '{'])?;
  let close = match text.get(start..start + 1)? {
    "[" => ']',
    _ => '}',
  };
  let end = text.rfind(close)?;
  if end <= start {
    return None;
  }
  text.get(start..=end)
}

/// Strategy 3: newline-delimited JSON with noise.
fn parse_lines(text: &str) -> Vec<Map<String, Value>> {
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .filter_map(|line| serde_json::from_str::<Value>(line).ok())
    .filter_map(|value| match value {
      Value::Object(object) => Some(object),
      _ => None,
    })
    .collect()
}
