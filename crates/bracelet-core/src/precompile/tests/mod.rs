//! Precompilation tests

use super::*;

mod pipeline;

/// Stub compiler wrapping the source in a recognisable body
fn echo(source: &str) -> std::result::Result<String, Diagnostic> {
    Ok(format!("function () {{ return {:?}; }}", source))
}

/// Stub compiler rejecting any template that mentions `boom`
fn reject_boom(source: &str) -> std::result::Result<String, Diagnostic> {
    match source.find("boom") {
        Some(offset) => Err(Diagnostic::at("Parse error: unexpected boom", offset)),
        None => echo(source),
    }
}
