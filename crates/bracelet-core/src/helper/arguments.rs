//! Read-only view over the parameters of a single helper call

use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered positional parameters plus named (hash) parameters of one call
///
/// Built once per helper invocation and never mutated afterwards. Reads are
/// idempotent: there is no consumption, reading index 0 twice yields the
/// same value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    params: Vec<Value>,
    hash: BTreeMap<String, Value>,
}

impl Arguments {
    /// Empty argument list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already collected parts
    pub fn from_parts(params: Vec<Value>, hash: BTreeMap<String, Value>) -> Self {
        Self { params, hash }
    }

    /// Append a positional parameter
    pub fn param(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Add a named parameter
    pub fn hash_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.hash.insert(key.into(), value.into());
        self
    }

    /// Positional parameter at `index`, or `default` when out of range
    ///
    /// A stored `null` is returned as-is: absence, not falsiness, selects
    /// the default.
    pub fn positional<'a>(&'a self, index: usize, default: &'a Value) -> &'a Value {
        self.params.get(index).unwrap_or(default)
    }

    /// Named parameter `key`, or `default` when not supplied
    pub fn named<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.hash.get(key).unwrap_or(default)
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn hash(&self) -> &BTreeMap<String, Value> {
        &self.hash
    }
}
