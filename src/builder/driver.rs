//! Configuring and building the CMake project.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::artifact::{ArtifactKind, ArtifactLocator};
use crate::builder::backend::BuildBackend;
use crate::builder::toolchain::{locate, qt_candidates};
use crate::util::context::ProjectContext;
use crate::util::diagnostic::TaskError;
use crate::util::fs::{ensure_dir, format_size};
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// File whose presence means the build directory has been configured.
pub const BUILD_DESCRIPTOR: &str = "CMakeCache.txt";

/// What the configure step passed to CMake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureResult {
    pub build_dir: PathBuf,
    /// Qt location handed over as `CMAKE_PREFIX_PATH`, if one was found.
    pub toolchain: Option<PathBuf>,
    /// Generator requested with `-G`, if any.
    pub generator: Option<&'static str>,
}

/// Result of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The preferred backend built the project.
    Success {
        backend: BuildBackend,
        artifact: Option<PathBuf>,
    },
    /// The preferred backend failed and the alternate one succeeded.
    BackendFallbackUsed {
        preferred: BuildBackend,
        used: BuildBackend,
        artifact: Option<PathBuf>,
    },
    /// Neither backend succeeded.
    Failed { reason: String },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, BuildOutcome::Failed { .. })
    }

    /// The located executable of a successful build.
    pub fn artifact(&self) -> Option<&Path> {
        match self {
            BuildOutcome::Success { artifact, .. }
            | BuildOutcome::BackendFallbackUsed { artifact, .. } => artifact.as_deref(),
            BuildOutcome::Failed { .. } => None,
        }
    }

    /// Turn a failed outcome into an error.
    pub fn into_artifact(self, build_dir: &Path) -> Result<Option<PathBuf>, TaskError> {
        match self {
            BuildOutcome::Success { artifact, .. }
            | BuildOutcome::BackendFallbackUsed { artifact, .. } => Ok(artifact),
            BuildOutcome::Failed { reason } => Err(TaskError::BuildBackendUnavailable {
                build_dir: build_dir.to_path_buf(),
                output: reason,
            }),
        }
    }
}

/// Drives CMake configure and the build backends for one project.
pub struct BuildDriver<'a> {
    ctx: &'a ProjectContext,
    runner: &'a dyn CommandRunner,
    shell: &'a Shell,
}

impl<'a> BuildDriver<'a> {
    pub fn new(ctx: &'a ProjectContext, runner: &'a dyn CommandRunner, shell: &'a Shell) -> Self {
        BuildDriver { ctx, runner, shell }
    }

    /// Whether CMake has already configured the build directory.
    pub fn is_configured(&self) -> bool {
        self.ctx.build_dir().join(BUILD_DESCRIPTOR).is_file()
    }

    /// Run the CMake configure step.
    pub fn configure(&self) -> Result<ConfigureResult> {
        let config = self.ctx.config();
        let build_dir = self.ctx.build_dir();
        let build_type = config.project.build_type();

        self.shell.status(
            Status::Configuring,
            format!("{} ({})", self.ctx.app_name(), build_type),
        );

        // A configured tree keeps its generator; asking for another one is an error.
        let generator = if !self.is_configured()
            && config.backend.preferred() == BuildBackend::Ninja
            && self.runner.has_program("ninja")
        {
            Some("Ninja")
        } else {
            None
        };

        ensure_dir(&build_dir)?;

        let toolchain = locate(&qt_candidates(&config.toolchain, self.ctx.platform()));

        let mut cmd = ProcessBuilder::new("cmake")
            .arg("-S")
            .arg(self.ctx.root())
            .arg("-B")
            .arg(&build_dir)
            .arg(format!("-DCMAKE_BUILD_TYPE={}", build_type));

        if let Some(generator) = generator {
            cmd = cmd.arg("-G").arg(generator);
        }

        match &toolchain {
            Some(path) => {
                self.shell
                    .status(Status::Found, format!("Qt at {}", path.display()));
                cmd = cmd.arg(format!("-DCMAKE_PREFIX_PATH={}", path.display()));
            }
            None => {
                tracing::info!("Qt not found in known locations; using CMake package discovery");
            }
        }

        if config.backend.emit_compile_commands {
            cmd = cmd.arg("-DCMAKE_EXPORT_COMPILE_COMMANDS=ON");
        }

        cmd = cmd.args(&config.backend.cmake_args).cwd(self.ctx.root());

        self.runner.require(&cmd)?;

        self.shell.status(
            Status::Finished,
            format!("configure -> {}", build_dir.display()),
        );

        Ok(ConfigureResult {
            build_dir,
            toolchain,
            generator,
        })
    }

    /// Build the project, configuring first when needed.
    ///
    /// The preferred backend is tried first; if it fails for any reason the
    /// alternate backend is tried once. There is no third attempt.
    pub fn build(&self, clean_first: bool) -> Result<BuildOutcome> {
        if clean_first {
            self.clean_and_reconfigure()?;
        } else if !self.is_configured() {
            tracing::info!("{} missing, configuring first", BUILD_DESCRIPTOR);
            self.configure()?;
        }

        let backend_config = &self.ctx.config().backend;
        let preferred = backend_config.preferred();
        let alternate = backend_config.alternate();

        let used = match self.try_backend(preferred) {
            Ok(()) => preferred,
            Err(first) => {
                if alternate == preferred {
                    return Ok(BuildOutcome::Failed { reason: first });
                }
                self.shell.warn(format!(
                    "{} failed, falling back to {}",
                    preferred, alternate
                ));
                self.shell.detail(&first);
                if let Err(second) = self.try_backend(alternate) {
                    return Ok(BuildOutcome::Failed { reason: second });
                }
                alternate
            }
        };

        let artifact = ArtifactLocator::for_project(self.ctx).locate(ArtifactKind::Executable);
        self.report_artifact(artifact.as_deref());

        if used == preferred {
            Ok(BuildOutcome::Success {
                backend: used,
                artifact,
            })
        } else {
            Ok(BuildOutcome::BackendFallbackUsed {
                preferred,
                used,
                artifact,
            })
        }
    }

    /// Run one backend; `Err` carries the failure description.
    fn try_backend(&self, backend: BuildBackend) -> std::result::Result<(), String> {
        self.shell.status(
            Status::Building,
            format!("{} with {}", self.ctx.app_name(), backend),
        );

        let cmd = backend
            .build_command(&self.ctx.build_dir(), self.ctx.config().backend.jobs)
            .cwd(self.ctx.root());
        let probe = self.runner.probe(&cmd);
        if probe.succeeded() {
            Ok(())
        } else {
            Err(format!(
                "`{}` failed:\n{}",
                cmd.display_command(),
                probe.describe()
            ))
        }
    }

    /// `cmake --build <dir> --target clean`, then configure again.
    fn clean_and_reconfigure(&self) -> Result<()> {
        if self.is_configured() {
            self.shell.status(Status::Cleaning, self.ctx.app_name());
            let cmd = ProcessBuilder::new("cmake")
                .arg("--build")
                .arg(self.ctx.build_dir())
                .args(["--target", "clean"])
                .cwd(self.ctx.root());
            let probe = self.runner.probe(&cmd);
            if !probe.succeeded() {
                self.shell.warn("clean target failed, continuing");
                self.shell.detail(&probe.describe());
            }
        }
        self.configure()?;
        Ok(())
    }

    fn report_artifact(&self, artifact: Option<&Path>) {
        let Some(path) = artifact else {
            return;
        };
        match std::fs::metadata(path) {
            Ok(meta) => self.shell.status(
                Status::Finished,
                format!("{} ({})", path.display(), format_size(meta.len())),
            ),
            Err(e) => tracing::debug!("cannot stat {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::PlatformKind;
    use crate::test_support::{MockRunner, TempProject};
    use crate::util::config::Config;
    use crate::util::process::CommandOutput;

    /// Config that never finds a Qt install on the test machine.
    fn isolated_config(project: &TempProject) -> Config {
        let mut config = Config::default();
        config.toolchain.qt_candidates =
            Some(vec![project.root().join("no-qt").display().to_string()]);
        config
    }

    #[test]
    fn test_configure_passes_found_toolchain() {
        let project = TempProject::new();
        let qt = project.root().join("Qt/6.9.0/gcc_64");
        std::fs::create_dir_all(&qt).unwrap();

        let mut config = Config::default();
        config.toolchain.qt_candidates = Some(vec![
            project.root().join("missing").display().to_string(),
            qt.display().to_string(),
        ]);
        let ctx = project.context_with(config, PlatformKind::Linux);

        let runner = MockRunner::new();
        runner.with_program("ninja");
        runner.expect_prefix("cmake -S", CommandOutput::from_code(0));

        let shell = Shell::quiet();
        let result = BuildDriver::new(&ctx, &runner, &shell).configure().unwrap();

        assert_eq!(result.toolchain, Some(qt.clone()));
        assert_eq!(result.generator, Some("Ninja"));
        assert!(ctx.build_dir().is_dir());

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains(&format!("-DCMAKE_PREFIX_PATH={}", qt.display())));
        assert!(calls[0].contains("-G Ninja"));
        assert!(calls[0].contains("-DCMAKE_BUILD_TYPE=Debug"));
    }

    #[test]
    fn test_configure_without_toolchain_lets_cmake_discover() {
        let project = TempProject::new();
        let ctx = project.context_with(isolated_config(&project), PlatformKind::Linux);

        let runner = MockRunner::new();
        runner.expect_prefix("cmake -S", CommandOutput::from_code(0));

        let shell = Shell::quiet();
        let result = BuildDriver::new(&ctx, &runner, &shell).configure().unwrap();

        assert_eq!(result.toolchain, None);
        assert_eq!(result.generator, None);
        assert!(!runner.calls()[0].contains("CMAKE_PREFIX_PATH"));
    }

    #[test]
    fn test_configure_failure_is_fatal() {
        let project = TempProject::new();
        let ctx = project.context_with(isolated_config(&project), PlatformKind::Linux);

        let runner = MockRunner::new();
        runner.expect_prefix(
            "cmake -S",
            CommandOutput::failure(1, "Could not find a package configuration file provided by \"Qt6\""),
        );

        let shell = Shell::quiet();
        let err = BuildDriver::new(&ctx, &runner, &shell)
            .configure()
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Qt6"));
    }

    #[test]
    fn test_implicit_configure_before_build() {
        let project = TempProject::new();
        let ctx = project.context_with(isolated_config(&project), PlatformKind::Linux);

        let runner = MockRunner::new();
        runner.expect_prefix("cmake -S", CommandOutput::from_code(0));
        runner.expect_prefix("ninja -C", CommandOutput::from_code(0));

        let shell = Shell::quiet();
        let outcome = BuildDriver::new(&ctx, &runner, &shell).build(false).unwrap();

        assert!(matches!(
            outcome,
            BuildOutcome::Success {
                backend: BuildBackend::Ninja,
                artifact: None
            }
        ));
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("cmake -S"));
        assert!(calls[1].starts_with("ninja -C"));
    }

    #[test]
    fn test_configured_tree_is_not_reconfigured() {
        let project = TempProject::new();
        project.configured();
        let artifact = project.executable("build/korova");
        let ctx = project.context_with(isolated_config(&project), PlatformKind::Linux);

        let runner = MockRunner::new();
        runner.expect_prefix("ninja -C", CommandOutput::from_code(0));

        let shell = Shell::quiet();
        let outcome = BuildDriver::new(&ctx, &runner, &shell).build(false).unwrap();

        assert_eq!(outcome.artifact(), Some(artifact.as_path()));
        assert_eq!(runner.count_prefix("cmake"), 0);
    }

    #[test]
    fn test_alternate_backend_tried_exactly_once() {
        let project = TempProject::new();
        project.configured();
        let ctx = project.context_with(isolated_config(&project), PlatformKind::Linux);

        let runner = MockRunner::new();
        runner.expect_missing("ninja");
        runner.expect_prefix("cmake --build", CommandOutput::from_code(0));

        let shell = Shell::quiet();
        let outcome = BuildDriver::new(&ctx, &runner, &shell).build(false).unwrap();

        assert!(matches!(
            outcome,
            BuildOutcome::BackendFallbackUsed {
                preferred: BuildBackend::Ninja,
                used: BuildBackend::CMake,
                ..
            }
        ));
        assert_eq!(runner.count_prefix("ninja"), 1);
        assert_eq!(runner.count_prefix("cmake --build"), 1);
    }

    #[test]
    fn test_both_backends_fail() {
        let project = TempProject::new();
        project.configured();
        let ctx = project.context_with(isolated_config(&project), PlatformKind::Linux);

        let runner = MockRunner::new();
        runner.expect_missing("ninja");
        runner.expect_prefix(
            "cmake --build",
            CommandOutput::failure(2, "main.cpp:1:10: fatal error: opencv2/core.hpp: No such file"),
        );

        let shell = Shell::quiet();
        let outcome = BuildDriver::new(&ctx, &runner, &shell).build(false).unwrap();

        match &outcome {
            BuildOutcome::Failed { reason } => assert!(reason.contains("opencv2/core.hpp")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(runner.calls().len(), 2);
        assert!(!runner.calls().iter().any(|c| c.starts_with("make")));

        let err = outcome.into_artifact(&ctx.build_dir()).unwrap_err();
        assert!(matches!(err, TaskError::BuildBackendUnavailable { .. }));
    }

    #[test]
    fn test_same_preferred_and_alternate_runs_once() {
        let project = TempProject::new();
        project.configured();
        let mut config = isolated_config(&project);
        config.backend.preferred = Some("make".to_string());
        config.backend.alternate = Some("make".to_string());
        let ctx = project.context_with(config, PlatformKind::Linux);

        let runner = MockRunner::new();
        runner.expect_prefix("make", CommandOutput::failure(2, "make: *** No targets"));

        let shell = Shell::quiet();
        let outcome = BuildDriver::new(&ctx, &runner, &shell).build(false).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_clean_first_cleans_then_reconfigures() {
        let project = TempProject::new();
        project.configured();
        let ctx = project.context_with(isolated_config(&project), PlatformKind::Linux);

        let runner = MockRunner::new();
        runner.expect_contains("--target clean", CommandOutput::from_code(0));
        runner.expect_prefix("cmake -S", CommandOutput::from_code(0));
        runner.expect_prefix("ninja -C", CommandOutput::from_code(0));

        let shell = Shell::quiet();
        BuildDriver::new(&ctx, &runner, &shell).build(true).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].ends_with("--target clean"));
        assert!(calls[1].starts_with("cmake -S"));
        assert!(calls[2].starts_with("ninja -C"));
    }
}
