//! Test fixtures for common test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::platform::PlatformKind;
use crate::util::config::Config;
use crate::util::context::ProjectContext;

/// A throwaway project tree on disk.
#[derive(Debug)]
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    /// An empty project with a top-level `CMakeLists.txt`.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let project = TempProject { dir };
        project.write(
            "CMakeLists.txt",
            "cmake_minimum_required(VERSION 3.21)\nproject(korova CXX)\n",
        );
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root, creating parents.
    pub fn write(&self, rel: impl AsRef<Path>, contents: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(&path, contents).expect("failed to write fixture file");
        path
    }

    /// Write a file and mark it executable.
    pub fn executable(&self, rel: impl AsRef<Path>) -> PathBuf {
        let path = self.write(rel, "#!/bin/sh\nexit 0\n");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .expect("failed to chmod fixture");
        }
        path
    }

    /// Mark the build directory as configured.
    pub fn configured(&self) -> &Self {
        self.write("build/CMakeCache.txt", "CMAKE_BUILD_TYPE:STRING=Debug\n");
        self
    }

    /// Context with default configuration for `platform`.
    pub fn context(&self, platform: PlatformKind) -> ProjectContext {
        ProjectContext::new(self.root(), Config::default(), platform)
    }

    /// Context with a custom configuration.
    pub fn context_with(&self, config: Config, platform: PlatformKind) -> ProjectContext {
        ProjectContext::new(self.root(), config, platform)
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}
