//! Helper evaluation protocol
//!
//! A helper is a pure, named function `(context value, Arguments) -> renderable`.
//! The same contract is used by the interpreter and is what a precompiled
//! bundle's runtime resolves helper names against, so helpers never depend on
//! anything but their two inputs.
//!
//! ## Falsy short-circuit
//!
//! Most standard helpers return `positional(0)` untouched when the context
//! value is falsy (see [`crate::value::is_falsy`]). `join`, `yesno` and
//! `defaultIfEmpty` opt out and define their own null handling.

mod arguments;
mod date;
mod format;
mod registry;
mod string;

pub use arguments::Arguments;
pub use registry::HelperRegistry;
pub use string::StringHelper;

use crate::value::{to_display, type_name};
use serde_json::Value;
use thiserror::Error;

/// Output of a helper: `None` renders nothing
pub type HelperResult = Result<Option<Value>, HelperError>;

/// Capability implemented by every helper
pub trait Helper: Send + Sync {
    /// Stable identifier, equal to the registry key
    fn name(&self) -> &str;

    /// Evaluate the helper against `context`
    fn apply(&self, context: &Value, args: &Arguments) -> HelperResult;
}

/// Argument conditions raised by helpers given malformed input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HelperError {
    #[error("HELPER_MISSING_ARGUMENT: {helper} requires argument '{argument}'")]
    MissingArgument {
        helper: &'static str,
        argument: String,
    },

    #[error("HELPER_ARGUMENT_TYPE: {helper} expected {expected} for '{argument}', found {found}")]
    ArgumentType {
        helper: &'static str,
        argument: String,
        expected: &'static str,
        found: String,
    },

    #[error("HELPER_INVALID_ARGUMENT: {helper}: {reason}")]
    InvalidArgument { helper: &'static str, reason: String },
}

pub(crate) static NULL: Value = Value::Null;

/// Require an integer argument; numeric strings are accepted
pub(crate) fn expect_integer(
    helper: &'static str,
    argument: &str,
    value: &Value,
) -> Result<i64, HelperError> {
    let parsed = match value {
        Value::Null => {
            return Err(HelperError::MissingArgument {
                helper,
                argument: argument.to_string(),
            })
        }
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| HelperError::ArgumentType {
        helper,
        argument: argument.to_string(),
        expected: "integer",
        found: describe(value),
    })
}

/// Require a non-negative integer argument
pub(crate) fn expect_size(
    helper: &'static str,
    argument: &str,
    value: &Value,
) -> Result<usize, HelperError> {
    let n = expect_integer(helper, argument, value)?;
    usize::try_from(n).map_err(|_| HelperError::ArgumentType {
        helper,
        argument: argument.to_string(),
        expected: "non-negative integer",
        found: n.to_string(),
    })
}

/// Boolean argument; `null` falls back to `default`
pub(crate) fn expect_bool(
    helper: &'static str,
    argument: &str,
    value: &Value,
    default: bool,
) -> Result<bool, HelperError> {
    match value {
        Value::Null => Ok(default),
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" || s == "false" => Ok(s == "true"),
        other => Err(HelperError::ArgumentType {
            helper,
            argument: argument.to_string(),
            expected: "boolean",
            found: describe(other),
        }),
    }
}

fn describe(value: &Value) -> String {
    format!("{} '{}'", type_name(value), to_display(value))
}

#[cfg(test)]
mod tests;
