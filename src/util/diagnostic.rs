//! Error taxonomy and user-facing suggestions.
//!
//! Every fatal error carries enough context for the operator to act on it
//! without re-running anything by hand: the command that failed, its exit
//! code, its output, and a `help:` line.

use std::path::PathBuf;

use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when the host platform is not recognized.
    pub const UNSUPPORTED_PLATFORM: &str =
        "help: Supported platforms are linux, macos and windows";

    /// Suggestion when a required tool is missing.
    pub const TOOL_MISSING: &str = "help: Run `korova-tasks bootstrap` to install the toolchain";

    /// Suggestion when no build backend could run.
    pub const BACKEND_UNAVAILABLE: &str =
        "help: Install ninja or make it available on PATH, or set [backend] in korova.toml";

    /// Suggestion when the executable cannot be found.
    pub const ARTIFACT_NOT_FOUND: &str = "help: Run `korova-tasks build` first";

    /// Suggestion when `[project] build_dir` points at or outside the project.
    pub const UNSAFE_BUILD_DIR: &str =
        "help: Set [project] build_dir in korova.toml to a subdirectory such as `build`";

    /// Suggestion when clang-format is missing.
    pub const FORMATTER_UNAVAILABLE: &str = if cfg!(target_os = "macos") {
        "help: Install it with `brew install clang-format`"
    } else if cfg!(windows) {
        "help: Install it with `choco install llvm`"
    } else {
        "help: Install it with `sudo apt-get install clang-format`"
    };

    /// Suggestion when a dependency has no automatic source build.
    pub const MANUAL_INSTALL: &str =
        "help: Install it manually, then run `korova-tasks doctor` to verify";
}

/// Errors surfaced to the operator.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("unsupported platform `{os}`")]
    UnsupportedPlatform { os: String },

    #[error("required tool `{tool}` not found\n{hint}")]
    ToolMissing { tool: String, hint: String },

    #[error("`{name}` {found} is older than the required {minimum}")]
    VersionTooOld {
        name: String,
        found: String,
        minimum: String,
    },

    #[error("no build backend could build `{}`\n{output}", .build_dir.display())]
    BuildBackendUnavailable { build_dir: PathBuf, output: String },

    #[error("{what} not found under {}", .build_dir.display())]
    ArtifactNotFound { what: String, build_dir: PathBuf },

    #[error(
        "refusing to remove build directory {}: it is not inside the project at {}",
        .build_dir.display(),
        .root.display()
    )]
    UnsafeBuildDir { build_dir: PathBuf, root: PathBuf },

    #[error("formatter `{tool}` is not installed\n{}", suggestions::FORMATTER_UNAVAILABLE)]
    FormatterUnavailable { tool: String },

    #[error("`{command}` failed ({})\n{output}", describe_exit(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },
}

impl TaskError {
    /// The suggestion printed after this error, if any.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            TaskError::UnsupportedPlatform { .. } => Some(suggestions::UNSUPPORTED_PLATFORM),
            TaskError::ToolMissing { .. } => Some(suggestions::TOOL_MISSING),
            TaskError::BuildBackendUnavailable { .. } => Some(suggestions::BACKEND_UNAVAILABLE),
            TaskError::ArtifactNotFound { .. } => Some(suggestions::ARTIFACT_NOT_FOUND),
            TaskError::UnsafeBuildDir { .. } => Some(suggestions::UNSAFE_BUILD_DIR),
            TaskError::VersionTooOld { .. }
            | TaskError::FormatterUnavailable { .. }
            | TaskError::CommandFailed { .. } => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_includes_output() {
        let err = TaskError::CommandFailed {
            command: "cmake --build build".to_string(),
            code: Some(2),
            output: "ninja: error: loading 'build.ninja'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cmake --build build"));
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("build.ninja"));
    }

    #[test]
    fn test_signal_exit_description() {
        let err = TaskError::CommandFailed {
            command: "make".to_string(),
            code: None,
            output: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_help_for_unsupported_platform() {
        let err = TaskError::UnsupportedPlatform {
            os: "plan9".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported platform `plan9`");
        assert_eq!(err.help(), Some(suggestions::UNSUPPORTED_PLATFORM));
    }
}
