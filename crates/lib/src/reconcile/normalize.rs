//! Value normalization for entity comparison.
//!
//! Two forms of an entity are compared after converting both to JSON values
//! and canonicalizing them: string scalars are trimmed, and objects are
//! rebuilt with sorted keys so field order never matters.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Canonicalize a JSON value for comparison.
pub fn normalize(value: Value) -> Value {
  match value {
    Value::String(s) => Value::String(s.trim().to_string()),
    Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
    Value::Object(map) => {
      let sorted: BTreeMap<String, Value> = map.into_iter().map(|(k, v)| (k, normalize(v))).collect();
      Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
    }
    other => other,
  }
}

/// Compare two values by their normalized JSON structure.
///
/// Values that fail to serialize never compare equal.
pub fn structurally_equal<T: Serialize>(a: &T, b: &T) -> bool {
  match (serde_json::to_value(a), serde_json::to_value(b)) {
    (Ok(a), Ok(b)) => normalize(a) == normalize(b),
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn field_order_does_not_matter() {
    let a: Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#).unwrap();
    let b: Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
    assert!(structurally_equal(&a, &b));
  }

  #[test]
  fn strings_are_trimmed_at_every_depth() {
    assert!(structurally_equal(&"  value ".to_string(), &"value".to_string()));
    assert!(structurally_equal(
      &json!({"outer": {"inner": [" x", "y "]}}),
      &json!({"outer": {"inner": ["x", "y"]}})
    ));
  }

  #[test]
  fn interior_whitespace_is_significant() {
    assert!(!structurally_equal(&"a b".to_string(), &"a  b".to_string()));
  }

  #[test]
  fn different_values_are_not_equal() {
    assert!(!structurally_equal(&json!({"a": 1}), &json!({"a": 2})));
    assert!(!structurally_equal(&json!({"a": 1}), &json!({"a": 1, "b": null})));
    assert!(!structurally_equal(&json!(["a", "b"]), &json!(["b", "a"])));
  }
}
