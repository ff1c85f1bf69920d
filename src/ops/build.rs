//! Implementation of `configure`, `build`, `run` and `rebuild`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::artifact::{ArtifactKind, ArtifactLocator};
use crate::builder::driver::{BuildDriver, BuildOutcome, ConfigureResult};
use crate::ops::clean::clean;
use crate::util::context::ProjectContext;
use crate::util::diagnostic::TaskError;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Options for the build command.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Run the executable after a successful build
    pub run: bool,

    /// Clean the build tree and reconfigure first
    pub clean_first: bool,
}

/// Configure the build directory.
pub fn configure(
    ctx: &ProjectContext,
    runner: &dyn CommandRunner,
    shell: &Shell,
) -> Result<ConfigureResult> {
    BuildDriver::new(ctx, runner, shell).configure()
}

/// Build the project and optionally run it.
///
/// Returns the exit code the process should end with: zero after a plain
/// build, the application's own code after `--run`.
pub fn build(
    ctx: &ProjectContext,
    runner: &dyn CommandRunner,
    shell: &Shell,
    opts: BuildOptions,
) -> Result<i32> {
    let outcome = BuildDriver::new(ctx, runner, shell).build(opts.clean_first)?;

    if let BuildOutcome::BackendFallbackUsed { preferred, used, .. } = &outcome {
        shell.note(format!("built with {} after {} failed", used, preferred));
    }

    let artifact = outcome.into_artifact(&ctx.build_dir())?;

    if !opts.run {
        if artifact.is_none() {
            shell.warn(format!("build finished but `{}` was not found", ctx.app_name()));
            list_executables(ctx, shell);
        }
        return Ok(0);
    }

    match artifact {
        Some(path) => run_artifact(ctx, runner, shell, &path),
        None => Err(artifact_not_found(ctx, shell).into()),
    }
}

/// Locate the built executable and run it.
pub fn run(ctx: &ProjectContext, runner: &dyn CommandRunner, shell: &Shell) -> Result<i32> {
    let locator = ArtifactLocator::for_project(ctx);
    match locator.locate(ArtifactKind::Executable) {
        Some(path) => run_artifact(ctx, runner, shell, &path),
        None => Err(artifact_not_found(ctx, shell).into()),
    }
}

/// Clean everything, then configure and build from scratch.
pub fn rebuild(
    ctx: &ProjectContext,
    runner: &dyn CommandRunner,
    shell: &Shell,
    run: bool,
) -> Result<i32> {
    clean(ctx, shell)?;
    build(
        ctx,
        runner,
        shell,
        BuildOptions {
            run,
            clean_first: false,
        },
    )
}

fn run_artifact(
    ctx: &ProjectContext,
    runner: &dyn CommandRunner,
    shell: &Shell,
    path: &Path,
) -> Result<i32> {
    shell.status(Status::Running, path.display());
    let cmd = ProcessBuilder::new(path).cwd(ctx.root());
    let out = runner.interactive(&cmd).map_err(|e| TaskError::CommandFailed {
        command: cmd.display_command(),
        code: None,
        output: e.to_string(),
    })?;
    let code = out.code.unwrap_or(1);
    if code != 0 {
        tracing::info!("{} exited with code {}", ctx.app_name(), code);
    }
    Ok(code)
}

/// List what the build tree does contain, then build the error.
fn artifact_not_found(ctx: &ProjectContext, shell: &Shell) -> TaskError {
    list_executables(ctx, shell);
    TaskError::ArtifactNotFound {
        what: format!("executable `{}`", ctx.app_name()),
        build_dir: ctx.build_dir(),
    }
}

/// Show every executable under the build tree.
fn list_executables(ctx: &ProjectContext, shell: &Shell) -> Vec<PathBuf> {
    let locator = ArtifactLocator::for_project(ctx);
    let executables = locator.executables();
    if executables.is_empty() {
        shell.note(format!(
            "no executables under {}",
            locator.build_dir().display()
        ));
    } else {
        shell.note("executables in the build tree:");
        for exe in &executables {
            shell.detail(&exe.display().to_string());
        }
    }
    executables
}
