//! Implementation of `clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::util::context::ProjectContext;
use crate::util::fs::remove_path_if_exists;
use crate::util::shell::{Shell, Status};

/// CMake and Ninja files left at the project root by in-source configures.
pub const STRAY_METADATA: &[&str] = &[
    "CMakeCache.txt",
    "CMakeFiles",
    "cmake_install.cmake",
    "build.ninja",
    ".ninja_deps",
    ".ninja_log",
    "CTestTestfile.cmake",
];

/// Remove the build directory and stray top-level metadata.
///
/// Returns the paths that were actually removed. Nothing is removed when
/// the configured build directory is not inside the project.
pub fn clean(ctx: &ProjectContext, shell: &Shell) -> Result<Vec<PathBuf>> {
    let build_dir = ctx.removable_build_dir()?;
    shell.status(Status::Cleaning, ctx.app_name());

    let mut targets = vec![build_dir];
    targets.extend(STRAY_METADATA.iter().map(|name| ctx.root().join(name)));

    let mut removed = Vec::new();
    for path in targets {
        if remove_path_if_exists(&path)? {
            tracing::debug!("removed {}", path.display());
            removed.push(path);
        }
    }

    if removed.is_empty() {
        shell.status(Status::Finished, "nothing to clean");
    } else {
        shell.status(Status::Removed, format!("{} path(s)", removed.len()));
    }
    Ok(removed)
}
