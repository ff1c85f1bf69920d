//! Implementation of `test`.

use anyhow::Result;

use crate::builder::artifact::{ArtifactKind, ArtifactLocator};
use crate::builder::driver::BuildDriver;
use crate::util::context::ProjectContext;
use crate::util::diagnostic::TaskError;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Build, then run one test binary or the whole CTest suite.
///
/// The returned exit code mirrors the test result.
pub fn test(
    ctx: &ProjectContext,
    runner: &dyn CommandRunner,
    shell: &Shell,
    name: Option<&str>,
) -> Result<i32> {
    BuildDriver::new(ctx, runner, shell)
        .build(false)?
        .into_artifact(&ctx.build_dir())?;

    let locator = ArtifactLocator::for_project(ctx);
    let Some(test_dir) = locator.locate(ArtifactKind::TestSuite) else {
        return Err(TaskError::ArtifactNotFound {
            what: ArtifactKind::TestSuite.to_string(),
            build_dir: ctx.build_dir(),
        }
        .into());
    };
    tracing::debug!("tests in {}", test_dir.display());

    let cmd = match name {
        Some(name) => {
            let Some(binary) = locator.locate_test(name) else {
                return Err(TaskError::ArtifactNotFound {
                    what: format!("test `{}`", name),
                    build_dir: ctx.build_dir(),
                }
                .into());
            };
            shell.status(Status::Testing, name);
            ProcessBuilder::new(binary).cwd(&test_dir)
        }
        None => {
            shell.status(Status::Testing, "all tests");
            ProcessBuilder::new("ctest")
                .arg("--test-dir")
                .arg(ctx.build_dir())
                .arg("--output-on-failure")
                .args(["-C", ctx.config().project.build_type()])
                .cwd(ctx.root())
        }
    };

    let out = runner.interactive(&cmd).map_err(|e| TaskError::ToolMissing {
        tool: cmd.program_name(),
        hint: format!("failed to spawn `{}`: {}", cmd.display_command(), e),
    })?;
    let code = out.code.unwrap_or(1);
    if code == 0 {
        shell.status(Status::Finished, "tests passed");
    } else {
        shell.error(format!("tests failed (exit code {})", code));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::PlatformKind;
    use crate::test_support::{MockRunner, TempProject};
    use crate::util::config::Config;
    use crate::util::process::CommandOutput;

    fn configured_project() -> (TempProject, ProjectContext) {
        let project = TempProject::new();
        project.configured();
        let mut config = Config::default();
        config.toolchain.qt_candidates =
            Some(vec![project.root().join("no-qt").display().to_string()]);
        let ctx = project.context_with(config, PlatformKind::Linux);
        (project, ctx)
    }

    #[test]
    fn test_full_suite_through_ctest() {
        let (project, ctx) = configured_project();
        project.executable("build/tests/test_opencv");

        let runner = MockRunner::new();
        runner.expect_prefix("ninja -C", CommandOutput::from_code(0));
        runner.expect_prefix("ctest", CommandOutput::from_code(8));

        let code = test(&ctx, &runner, &Shell::quiet(), None).unwrap();
        assert_eq!(code, 8);

        let calls = runner.calls();
        assert_eq!(
            calls[1],
            format!(
                "ctest --test-dir {} --output-on-failure -C Debug",
                ctx.build_dir().display()
            )
        );
    }

    #[test]
    fn test_named_test_binary() {
        let (project, ctx) = configured_project();
        let binary = project.executable("build/src/tests/test_opencv");

        let runner = MockRunner::new();
        runner.expect_prefix("ninja -C", CommandOutput::from_code(0));
        runner.expect(&binary.display().to_string(), CommandOutput::from_code(0));

        let code = test(&ctx, &runner, &Shell::quiet(), Some("test_opencv")).unwrap();
        assert_eq!(code, 0);
        assert_eq!(runner.count_prefix("ctest"), 0);

        let err = test(&ctx, &runner, &Shell::quiet(), Some("test_missing")).unwrap_err();
        assert!(err.to_string().contains("test `test_missing`"));
    }

    #[test]
    fn test_missing_test_directory_is_fatal() {
        let (_project, ctx) = configured_project();

        let runner = MockRunner::new();
        runner.expect_prefix("ninja -C", CommandOutput::from_code(0));

        let err = test(&ctx, &runner, &Shell::quiet(), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TaskError>(),
            Some(TaskError::ArtifactNotFound { .. })
        ));
        assert_eq!(runner.count_prefix("ctest"), 0);
    }
}
