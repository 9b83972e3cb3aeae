//! Context value model shared by the interpreter and the helpers
//!
//! Context values are plain `serde_json::Value`s. Arrays play the role of
//! ordered collections and objects the role of keyed collections.

use serde_json::Value;

/// Decide whether a context value counts as absent.
///
/// Only `null`, `false`, an empty array and an empty object are falsy.
/// The number zero and the empty string are NOT falsy.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) | Value::String(_) => false,
    }
}

/// Coerce a value to the text a template would render for it
pub fn to_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(to_display).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Short type name used in argument-type diagnostics
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_falsy_values() {
        assert!(is_falsy(&Value::Null));
        assert!(is_falsy(&json!(false)));
        assert!(is_falsy(&json!([])));
        assert!(is_falsy(&json!({})));
    }

    #[test]
    fn test_zero_and_empty_string_are_not_falsy() {
        assert!(!is_falsy(&json!(0)));
        assert!(!is_falsy(&json!(0.0)));
        assert!(!is_falsy(&json!("")));
    }

    #[test]
    fn test_truthy_values() {
        assert!(!is_falsy(&json!(true)));
        assert!(!is_falsy(&json!("text")));
        assert!(!is_falsy(&json!([null])));
        assert!(!is_falsy(&json!({"a": 1})));
    }

    #[test]
    fn test_to_display() {
        assert_eq!(to_display(&json!("abc")), "abc");
        assert_eq!(to_display(&json!(32)), "32");
        assert_eq!(to_display(&json!(3.5)), "3.5");
        assert_eq!(to_display(&json!(true)), "true");
        assert_eq!(to_display(&Value::Null), "");
        assert_eq!(to_display(&json!(["6", 7, null])), "6,7,");
        assert_eq!(to_display(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
