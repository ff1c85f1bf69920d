//! Project context: where the project lives and how it is configured.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::core::platform::PlatformKind;
use crate::util::config::{load_config, Config, PROJECT_CONFIG_FILE};
use crate::util::diagnostic::TaskError;

/// Project directories for korova-tasks
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("", "", "korova-tasks"));

/// Top-level CMake project file.
pub const CMAKE_LISTS: &str = "CMakeLists.txt";

/// Resolved project root, configuration and target platform.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    root: PathBuf,
    config: Config,
    platform: PlatformKind,
}

impl ProjectContext {
    /// Discover the project from `start` and load its configuration.
    pub fn discover(start: &Path, platform: PlatformKind) -> Result<Self> {
        let root = find_project_root(start);
        let global = global_config_path();
        let config = load_config(global.as_deref(), &root.join(PROJECT_CONFIG_FILE));

        tracing::debug!("project root: {}", root.display());

        Ok(ProjectContext {
            root,
            config,
            platform,
        })
    }

    /// Discover from the current directory.
    pub fn from_cwd(platform: PlatformKind) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::discover(&cwd, platform)
    }

    /// Build a context from explicit parts.
    pub fn new(root: impl Into<PathBuf>, config: Config, platform: PlatformKind) -> Self {
        ProjectContext {
            root: root.into(),
            config,
            platform,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn platform(&self) -> &PlatformKind {
        &self.platform
    }

    /// Build output directory.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(self.config.project.build_dir())
    }

    /// The build directory, if it is safe to delete.
    ///
    /// It must lie strictly inside the project root after `.` and `..` are
    /// resolved, so an empty, absolute or parent-relative setting never
    /// points `clean` at the sources or outside the project.
    pub fn removable_build_dir(&self) -> Result<PathBuf, TaskError> {
        let build_dir = self.build_dir();
        let resolved = normalize(&build_dir);
        let root = normalize(&self.root);

        if resolved != root && resolved.starts_with(&root) {
            Ok(build_dir)
        } else {
            Err(TaskError::UnsafeBuildDir {
                build_dir,
                root: self.root.clone(),
            })
        }
    }

    /// Native source root linted by `lint`.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(self.config.project.source_dir())
    }

    pub fn app_name(&self) -> &str {
        self.config.project.app_name()
    }
}

/// Global configuration file path, if the platform has a config directory.
pub fn global_config_path() -> Option<PathBuf> {
    PROJECT_DIRS
        .as_ref()
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Find the project root above `start`.
///
/// The nearest directory holding `korova.toml` wins. Otherwise the
/// outermost directory holding a `CMakeLists.txt` is taken, so running from
/// `src/app` still finds the top-level project. Falls back to `start`.
pub fn find_project_root(start: &Path) -> PathBuf {
    if let Some(dir) = start
        .ancestors()
        .find(|dir| dir.join(PROJECT_CONFIG_FILE).is_file())
    {
        return dir.to_path_buf();
    }

    start
        .ancestors()
        .filter(|dir| dir.join(CMAKE_LISTS).is_file())
        .last()
        .unwrap_or(start)
        .to_path_buf()
}
