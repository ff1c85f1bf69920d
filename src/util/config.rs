//! Configuration file support.
//!
//! Two optional configuration files are read:
//! - Global: `config.toml` in the platform config directory
//!   (e.g. `~/.config/korova-tasks/config.toml`) - user-wide defaults
//! - Project: `korova.toml` at the project root - project-specific overrides
//!
//! Project config takes precedence over global config. Every setting is
//! optional; accessors fall back to the built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::backend::BuildBackend;
use crate::core::dependency::DEFAULT_OPENCV_TAG;

/// Name of the project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "korova.toml";

/// korova-tasks configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project layout
    pub project: ProjectConfig,

    /// Toolchain discovery
    pub toolchain: ToolchainConfig,

    /// Build backends
    pub backend: BackendConfig,

    /// Source formatting
    pub lint: LintConfig,

    /// Dependency installation
    pub bootstrap: BootstrapConfig,
}

/// Project layout settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Executable name produced by the build (default: korova)
    pub app_name: Option<String>,

    /// Build output directory, relative to the project root (default: build)
    pub build_dir: Option<PathBuf>,

    /// Native source root, relative to the project root (default: src)
    pub source_dir: Option<PathBuf>,

    /// CMAKE_BUILD_TYPE (default: Debug)
    pub build_type: Option<String>,
}

impl ProjectConfig {
    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or("korova")
    }

    pub fn build_dir(&self) -> &Path {
        self.build_dir.as_deref().unwrap_or(Path::new("build"))
    }

    pub fn source_dir(&self) -> &Path {
        self.source_dir.as_deref().unwrap_or(Path::new("src"))
    }

    pub fn build_type(&self) -> &str {
        self.build_type.as_deref().unwrap_or("Debug")
    }
}

/// Toolchain discovery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Qt install locations to try, in priority order. `$VAR/` and `~/`
    /// prefixes are expanded. Replaces the built-in list when set.
    pub qt_candidates: Option<Vec<String>>,
}

/// Build backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend tried first (ninja, cmake, make)
    pub preferred: Option<String>,

    /// Backend tried once if the preferred one fails
    pub alternate: Option<String>,

    /// Parallel jobs passed to the backend (None = backend default)
    pub jobs: Option<usize>,

    /// Extra arguments for the CMake configure step
    #[serde(default)]
    pub cmake_args: Vec<String>,

    /// Ask CMake for compile_commands.json
    #[serde(default)]
    pub emit_compile_commands: bool,
}

impl BackendConfig {
    /// Preferred backend, ignoring unknown names with a warning.
    pub fn preferred(&self) -> BuildBackend {
        parse_backend(self.preferred.as_deref()).unwrap_or(BuildBackend::Ninja)
    }

    /// Alternate backend, ignoring unknown names with a warning.
    pub fn alternate(&self) -> BuildBackend {
        parse_backend(self.alternate.as_deref()).unwrap_or(BuildBackend::CMake)
    }
}

fn parse_backend(name: Option<&str>) -> Option<BuildBackend> {
    let name = name?;
    match name.parse() {
        Ok(backend) => Some(backend),
        Err(e) => {
            tracing::warn!("ignoring configured backend: {}", e);
            None
        }
    }
}

/// Source formatting settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Formatter executable (default: clang-format)
    pub formatter: Option<String>,

    /// File extensions to format (default: C/C++ sources and headers)
    pub extensions: Option<Vec<String>>,

    /// Directory names never descended into
    pub exclude: Option<Vec<String>>,
}

impl LintConfig {
    pub fn formatter(&self) -> &str {
        self.formatter.as_deref().unwrap_or("clang-format")
    }

    pub fn extensions(&self) -> Vec<String> {
        self.extensions.clone().unwrap_or_else(|| {
            ["c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        })
    }

    pub fn exclude(&self) -> Vec<String> {
        self.exclude.clone().unwrap_or_else(|| {
            [
                "d2xx",
                "third_party",
                "3rdparty",
                "generated",
                "build",
                "CMakeFiles",
                ".git",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect()
        })
    }
}

/// Dependency installation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Prefix privileged commands with sudo (default: true on Linux/macOS)
    pub sudo: Option<bool>,

    /// Install prefix for source builds (default: /usr/local)
    pub source_prefix: Option<PathBuf>,

    /// OpenCV release tag used for source builds
    pub opencv_tag: Option<String>,
}

impl BootstrapConfig {
    pub fn sudo(&self) -> bool {
        self.sudo.unwrap_or(true)
    }

    pub fn source_prefix(&self) -> &Path {
        self.source_prefix
            .as_deref()
            .unwrap_or(Path::new("/usr/local"))
    }

    pub fn opencv_tag(&self) -> &str {
        self.opencv_tag.as_deref().unwrap_or(DEFAULT_OPENCV_TAG)
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Project settings
        if other.project.app_name.is_some() {
            self.project.app_name = other.project.app_name;
        }
        if other.project.build_dir.is_some() {
            self.project.build_dir = other.project.build_dir;
        }
        if other.project.source_dir.is_some() {
            self.project.source_dir = other.project.source_dir;
        }
        if other.project.build_type.is_some() {
            self.project.build_type = other.project.build_type;
        }

        // Toolchain settings
        if other.toolchain.qt_candidates.is_some() {
            self.toolchain.qt_candidates = other.toolchain.qt_candidates;
        }

        // Backend settings
        if other.backend.preferred.is_some() {
            self.backend.preferred = other.backend.preferred;
        }
        if other.backend.alternate.is_some() {
            self.backend.alternate = other.backend.alternate;
        }
        if other.backend.jobs.is_some() {
            self.backend.jobs = other.backend.jobs;
        }
        if !other.backend.cmake_args.is_empty() {
            self.backend.cmake_args = other.backend.cmake_args;
        }
        if other.backend.emit_compile_commands {
            self.backend.emit_compile_commands = true;
        }

        // Lint settings
        if other.lint.formatter.is_some() {
            self.lint.formatter = other.lint.formatter;
        }
        if other.lint.extensions.is_some() {
            self.lint.extensions = other.lint.extensions;
        }
        if other.lint.exclude.is_some() {
            self.lint.exclude = other.lint.exclude;
        }

        // Bootstrap settings
        if other.bootstrap.sudo.is_some() {
            self.bootstrap.sudo = other.bootstrap.sudo;
        }
        if other.bootstrap.source_prefix.is_some() {
            self.bootstrap.source_prefix = other.bootstrap.source_prefix;
        }
        if other.bootstrap.opencv_tag.is_some() {
            self.bootstrap.opencv_tag = other.bootstrap.opencv_tag;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (korova.toml)
/// 2. Global config (config.toml in the user config directory)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    // Project config overrides global
    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}
