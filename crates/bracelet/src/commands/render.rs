//! Render command - interpret a template with the standard helpers

use anyhow::{Context, Result};
use bracelet_core::template::{TemplateContext, TemplateEngine};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;

/// Render `file` against the JSON in `data` (an empty object by default)
pub fn run(file: PathBuf, data: Option<PathBuf>) -> Result<()> {
    let source = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read template {}", file.display()))?;

    let data: Value = match data {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read data {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?
        }
        None => Value::Object(Default::default()),
    };

    let engine = TemplateEngine::new();
    let output = engine
        .render(&source, &TemplateContext::from(data))
        .map_err(bracelet_core::BraceletError::from)
        .with_context(|| format!("Failed to render {}", file.display()))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
