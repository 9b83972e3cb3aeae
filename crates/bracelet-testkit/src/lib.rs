//! Test utilities for bracelet
//!
//! This crate provides shared testing utilities used across the bracelet workspace.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a temporary directory within `.tmp/` at the project root
///
/// All test temporary files end up in a single gitignored location that is
/// easy to clean up manually if needed.
///
/// # Panics
///
/// Panics if the current directory cannot be determined or `.tmp/` cannot
/// be created.
///
/// # Examples
///
/// ```rust
/// use bracelet_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let file_path = temp.path().join("test.hbs");
/// std::fs::write(&file_path, "{{name}}").unwrap();
/// // Cleanup happens automatically when temp is dropped
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}

/// Writes template fixtures below `root`
///
/// Each entry is a `/`-separated path relative to `root` and its content.
/// Intermediate directories are created. Returns the written paths in
/// input order.
///
/// # Examples
///
/// ```rust
/// use bracelet_testkit::{temp_dir_in_workspace, write_templates};
///
/// let temp = temp_dir_in_workspace();
/// let paths = write_templates(temp.path(), &[("a.hbs", "A"), ("nested/b.hbs", "B")]);
/// assert!(paths[1].ends_with("nested/b.hbs"));
/// ```
pub fn write_templates(root: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(relative, content)| {
            let path = relative.split('/').fold(root.to_path_buf(), |path, part| path.join(part));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                    panic!("Failed to create {}: {}", parent.display(), e)
                });
            }
            std::fs::write(&path, content)
                .unwrap_or_else(|e| panic!("Failed to write {}: {}", path.display(), e));
            path
        })
        .collect()
}
