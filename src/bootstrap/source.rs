//! Building a dependency from its upstream repository.
//!
//! The checkout lives in a temporary directory that is removed afterwards.
//! Libraries are built static and installed into the strategy's prefix.

use anyhow::{anyhow, Context, Result};
use tempfile::TempDir;

use super::PlatformStrategy;
use crate::core::dependency::Dependency;
use crate::util::diagnostic::suggestions;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Clone, configure, build and install `dep` from source.
pub fn build_from_source(
    strategy: &dyn PlatformStrategy,
    dep: &Dependency,
    runner: &dyn CommandRunner,
    shell: &Shell,
) -> Result<()> {
    let recipe = dep.source.as_ref().ok_or_else(|| {
        anyhow!(
            "no source build available for {}\n{}",
            dep.name,
            suggestions::MANUAL_INSTALL
        )
    })?;
    let prefix = strategy.source_prefix().ok_or_else(|| {
        anyhow!(
            "source builds are not supported on {}\n{}",
            strategy.platform(),
            suggestions::MANUAL_INSTALL
        )
    })?;

    let scratch = tempfile::Builder::new()
        .prefix(&format!("korova-{}-", dep.name))
        .tempdir()
        .context("failed to create a scratch directory for the source build")?;
    let checkout = scratch.path().join(&dep.name);
    let build = checkout.join("build");

    let spinner = shell.spinner(
        Status::Building,
        format!("{} {} from source", dep.name, recipe.tag),
    );

    let steps = [
        ProcessBuilder::new("git")
            .args(["clone", "--depth", "1", "--branch"])
            .arg(&recipe.tag)
            .arg(&recipe.repository)
            .arg(&checkout)
            .cwd(scratch.path()),
        ProcessBuilder::new("cmake")
            .arg("-S")
            .arg(&checkout)
            .arg("-B")
            .arg(&build)
            .args(["-DCMAKE_BUILD_TYPE=Release", "-DBUILD_SHARED_LIBS=OFF"])
            .arg(format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display()))
            .args(&recipe.cmake_args),
        ProcessBuilder::new("cmake")
            .arg("--build")
            .arg(&build)
            .args(["--parallel", "--config", "Release"]),
        strategy.elevate(ProcessBuilder::new("cmake").arg("--install").arg(&build)),
    ];

    for step in steps {
        let step = if step.get_cwd().is_none() {
            step.cwd(&checkout)
        } else {
            step
        };
        spinner.set_message(format!("{}: {}", dep.name, step.display_command()));
        if let Err(e) = runner.require(&step) {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    }

    if let Some(refresh) = strategy.refresh_linker_cache() {
        spinner.set_message("refreshing linker cache");
        if let Err(e) = runner.require(&refresh) {
            spinner.finish_and_clear();
            return Err(e.into());
        }
    }

    spinner.finish_and_clear();
    shell.status(
        Status::Installed,
        format!("{} {} into {}", dep.name, recipe.tag, prefix.display()),
    );

    close(scratch);
    Ok(())
}

fn close(scratch: TempDir) {
    let path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        tracing::warn!("failed to remove {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{LinuxStrategy, WindowsStrategy};
    use crate::test_support::MockRunner;
    use crate::util::config::BootstrapConfig;
    use crate::util::process::CommandOutput;

    #[test]
    fn test_source_build_steps_in_order() {
        let runner = MockRunner::new();
        runner.expect_prefix("git clone", CommandOutput::from_code(0));
        runner.expect_prefix("cmake", CommandOutput::from_code(0));
        runner.expect_prefix("sudo cmake --install", CommandOutput::from_code(0));
        runner.expect("sudo ldconfig", CommandOutput::from_code(0));

        let strategy = LinuxStrategy::new(&BootstrapConfig::default());
        build_from_source(&strategy, &Dependency::opencv("4.10.0"), &runner, &Shell::quiet())
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 5);
        assert!(calls[0].starts_with(
            "git clone --depth 1 --branch 4.10.0 https://github.com/opencv/opencv.git"
        ));
        assert!(calls[1].contains("-DBUILD_SHARED_LIBS=OFF"));
        assert!(calls[1].contains("-DCMAKE_INSTALL_PREFIX=/usr/local"));
        assert!(calls[1].contains("-DBUILD_TESTS=OFF"));
        assert!(calls[2].starts_with("cmake --build"));
        assert!(calls[3].starts_with("sudo cmake --install"));
        assert_eq!(calls[4], "sudo ldconfig");
    }

    #[test]
    fn test_clone_failure_stops_the_build() {
        let runner = MockRunner::new();
        runner.expect_prefix(
            "git clone",
            CommandOutput::failure(128, "fatal: Remote branch 9.9.9 not found in upstream origin"),
        );

        let strategy = LinuxStrategy::new(&BootstrapConfig::default());
        let err = build_from_source(&strategy, &Dependency::opencv("9.9.9"), &runner, &Shell::quiet())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Remote branch 9.9.9"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_unavailable_without_recipe_or_prefix() {
        let runner = MockRunner::new();
        let shell = Shell::quiet();

        let linux = LinuxStrategy::new(&BootstrapConfig::default());
        assert!(build_from_source(&linux, &Dependency::qt(), &runner, &shell).is_err());

        let windows = WindowsStrategy::new();
        let err = build_from_source(&windows, &Dependency::opencv("4.10.0"), &runner, &shell)
            .unwrap_err();
        assert!(err.to_string().contains("not supported on windows"));
        assert!(runner.calls().is_empty());
    }
}
