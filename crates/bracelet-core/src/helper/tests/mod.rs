//! Tests for the standard helper library
//!
//! Organized by concern: per-helper behaviour and the shared falsy contract.

use super::*;
use serde_json::{json, Value};


/// Apply a standard helper and unwrap its rendered text
fn apply_text(helper: StringHelper, context: Value, args: &Arguments) -> String {
    match helper.apply(&context, args) {
        Ok(Some(Value::String(text))) => text,
        other => panic!("Expected text from {}, got {:?}", helper.name(), other),
    }
}
