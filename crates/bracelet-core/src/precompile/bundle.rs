//! Bundle aggregation and serialization

use crate::error::{BraceletError, Result};
use std::collections::HashSet;

/// Runtime dependency declared by the module wrapper
pub const DEFAULT_RUNTIME: &str = "handlebars";

const PREAMBLE: &str = "  var template = Handlebars.template, templates = Handlebars.templates = Handlebars.templates || {};";

/// Output wrapper style
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleFormat {
    /// Self-invoking script mutating the global `Handlebars.templates`
    Plain,
    /// AMD `define` with a single dependency on the runtime module
    Amd { runtime: String },
}

impl ModuleFormat {
    pub fn amd(runtime: impl Into<String>) -> Self {
        ModuleFormat::Amd {
            runtime: runtime.into(),
        }
    }
}

impl Default for ModuleFormat {
    fn default() -> Self {
        ModuleFormat::Plain
    }
}

/// Compiled templates in insertion order
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    entries: Vec<(String, String)>,
    names: HashSet<String>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a compiled body; a name may only appear once
    pub fn insert(&mut self, name: String, body: String) -> Result<()> {
        if !self.names.insert(name.clone()) {
            return Err(BraceletError::DuplicateTemplate(name));
        }
        self.entries.push((name, body));
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the artifact text
    pub fn render(&self, format: &ModuleFormat) -> String {
        let mut out = String::new();

        match format {
            ModuleFormat::Plain => out.push_str("(function () {\n"),
            ModuleFormat::Amd { runtime } => out.push_str(&format!(
                "define(['{}'], function (Handlebars) {{\n",
                js_string(runtime)
            )),
        }

        out.push_str(PREAMBLE);
        out.push('\n');
        for (name, body) in &self.entries {
            out.push_str(&format!(
                "  templates['{}'] = template({});\n",
                js_string(name),
                body
            ));
        }

        match format {
            ModuleFormat::Plain => out.push_str("})();\n"),
            ModuleFormat::Amd { .. } => out.push_str("  return templates;\n});\n"),
        }
        out
    }
}

/// Escape text for a single-quoted JavaScript string
fn js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}
