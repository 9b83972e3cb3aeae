//! Template error types

use crate::helper::HelperError;
use std::fmt;

/// Template parsing and rendering errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Malformed template syntax
    MalformedSyntax {
        /// Error message
        message: String,
        /// Line number where the error occurred
        line: usize,
    },

    /// Helper-style call whose head names no registered helper
    UnknownHelper {
        /// The unresolved helper name
        name: String,
        /// Line number where the error occurred
        line: usize,
    },

    /// A helper rejected its arguments
    Helper {
        /// Name of the failing helper
        name: String,
        /// Line number where the error occurred
        line: usize,
        /// The helper's own error
        source: HelperError,
    },

    /// Template rendering timed out (malformed input protection)
    Timeout {
        /// Maximum allowed duration
        max_duration: std::time::Duration,
        /// Actual elapsed time
        elapsed: std::time::Duration,
    },
}

impl TemplateError {
    /// Line the error is attributed to, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            TemplateError::MalformedSyntax { line, .. }
            | TemplateError::UnknownHelper { line, .. }
            | TemplateError::Helper { line, .. } => Some(*line),
            TemplateError::Timeout { .. } => None,
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::MalformedSyntax { message, line } => {
                write!(f, "Malformed syntax at line {}: {}", line, message)
            }
            TemplateError::UnknownHelper { name, line } => {
                write!(
                    f,
                    "Unknown helper '{}' at line {}. Run `bracelet helpers` to list the available helpers",
                    name, line
                )
            }
            TemplateError::Helper { name, line, source } => {
                write!(f, "Helper '{}' failed at line {}: {}", name, line, source)
            }
            TemplateError::Timeout {
                max_duration,
                elapsed,
            } => {
                write!(
                    f,
                    "Template rendering timed out after {:.2}s (max: {:.2}s)",
                    elapsed.as_secs_f64(),
                    max_duration.as_secs_f64()
                )
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Helper { source, .. } => Some(source),
            _ => None,
        }
    }
}
