//! Template discovery: logical names to source files

use crate::error::{BraceletError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use walkdir::{DirEntry, WalkDir};

/// One template to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUnit {
    /// Path below the root without the suffix, `/`-separated
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

/// Resolve the templates of one run
///
/// With a non-empty `names` allow-list each name maps to `root/name+suffix`,
/// in list order. Otherwise `root` is scanned recursively for files ending in
/// `suffix`, ordered by relative path. Hidden files and directories are
/// skipped while scanning.
pub fn discover(
    root: &Path,
    suffix: &str,
    names: &[String],
    token: &CancellationToken,
) -> Result<Vec<TemplateUnit>> {
    let units = if names.is_empty() {
        scan(root, suffix, token)?
    } else {
        resolve_listed(root, suffix, names, token)?
    };
    log::debug!(
        "discovered {} template(s) under {}",
        units.len(),
        root.display()
    );
    Ok(units)
}

fn check_cancelled(token: &CancellationToken) -> Result<()> {
    if token.is_cancelled() {
        return Err(BraceletError::Cancelled(
            "cancelled during discovery".to_string(),
        ));
    }
    Ok(())
}

fn resolve_listed(
    root: &Path,
    suffix: &str,
    names: &[String],
    token: &CancellationToken,
) -> Result<Vec<TemplateUnit>> {
    let mut seen = HashSet::new();
    let mut units = Vec::with_capacity(names.len());

    for name in names {
        check_cancelled(token)?;
        if !seen.insert(name.as_str()) {
            return Err(BraceletError::DuplicateTemplate(name.clone()));
        }

        let path = root.join(format!("{}{}", name, suffix));
        if !path.is_file() {
            return Err(BraceletError::TemplateNotFound {
                name: name.clone(),
                path,
            });
        }
        units.push(read_unit(name.clone(), path)?);
    }

    Ok(units)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn scan(root: &Path, suffix: &str, token: &CancellationToken) -> Result<Vec<TemplateUnit>> {
    if !root.is_dir() {
        return Err(BraceletError::TemplateRootNotFound(root.to_path_buf()));
    }

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
    {
        check_cancelled(token)?;

        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if relative.len() > suffix.len() && relative.ends_with(suffix) {
            found.push((relative, entry.into_path()));
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));

    found
        .into_iter()
        .map(|(relative, path)| {
            let name = relative[..relative.len() - suffix.len()].to_string();
            read_unit(name, path)
        })
        .collect()
}

fn read_unit(name: String, path: PathBuf) -> Result<TemplateUnit> {
    let source = fs::read_to_string(&path).map_err(|source| BraceletError::TemplateReadError {
        path: path.clone(),
        source,
    })?;
    Ok(TemplateUnit { name, path, source })
}
