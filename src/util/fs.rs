//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use walkdir::WalkDir;

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
        return Ok(true);
    }
    Ok(false)
}

/// Remove a file or directory, if it exists. Returns whether anything was removed.
pub fn remove_path_if_exists(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => remove_dir_all_if_exists(path),
        Ok(_) => {
            fs::remove_file(path)
                .with_context(|| format!("failed to remove file: {}", path.display()))?;
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Expand glob patterns, returning every existing match in pattern order.
///
/// Invalid patterns are skipped with a warning.
pub fn glob_paths(patterns: &[String]) -> Vec<PathBuf> {
    let mut results = Vec::new();

    for pattern in patterns {
        match glob(pattern) {
            Ok(paths) => results.extend(paths.flatten()),
            Err(e) => tracing::warn!("invalid glob pattern `{}`: {}", pattern, e),
        }
    }

    results
}

/// Whether a file can be executed.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Whether a file can be executed.
#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
}

/// Every executable file under `root`, sorted, skipping CMake's own scratch dirs.
pub fn executables_under(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.file_name() != "CMakeFiles")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_executable(e.path()))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}

/// Format a byte count with two decimals, scaling by 1024.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", size, UNITS[unit])
}
