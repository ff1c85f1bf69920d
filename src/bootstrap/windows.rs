//! Windows bootstrap through Chocolatey.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::PlatformStrategy;
use crate::core::dependency::Dependency;
use crate::core::platform::PlatformKind;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

pub const PREREQUISITES: &[&str] = &["cmake", "ninja", "git", "llvm"];

/// PowerShell one-liner from the Chocolatey install page.
const CHOCOLATEY_INSTALL_SCRIPT: &str = "Set-ExecutionPolicy Bypass -Scope Process -Force; \
     [System.Net.ServicePointManager]::SecurityProtocol = \
     [System.Net.ServicePointManager]::SecurityProtocol -bor 3072; \
     iex ((New-Object System.Net.WebClient).DownloadString('https://community.chocolatey.org/install.ps1'))";

const PROGRAM_DATA_VAR: &str = "ProgramData";

/// Chocolatey-based strategy.
///
/// Chocolatey must run from an elevated shell; nothing is wrapped. Source
/// builds are not offered.
#[derive(Debug, Clone, Default)]
pub struct WindowsStrategy;

impl WindowsStrategy {
    pub fn new() -> Self {
        WindowsStrategy
    }

    /// `choco` from PATH, or its default install location right after a
    /// fresh install, before PATH has been refreshed.
    fn choco(&self, runner: &dyn CommandRunner) -> ProcessBuilder {
        let program = if runner.has_program("choco") {
            PathBuf::from("choco")
        } else {
            default_choco_path(|var| std::env::var(var).ok())
        };
        ProcessBuilder::new(program)
    }
}

fn default_choco_path<F>(env: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let program_data = env(PROGRAM_DATA_VAR)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "C:\\ProgramData".to_string());
    Path::new(&program_data)
        .join("chocolatey")
        .join("bin")
        .join("choco.exe")
}

impl PlatformStrategy for WindowsStrategy {
    fn platform(&self) -> PlatformKind {
        PlatformKind::Windows
    }

    fn package_manager(&self) -> &'static str {
        "choco"
    }

    fn prepare(&self, runner: &dyn CommandRunner, shell: &Shell) -> Result<()> {
        if !runner.has_program("choco") {
            shell.status(Status::Installing, "Chocolatey");
            runner.require(&ProcessBuilder::new("powershell").args([
                "-NoProfile",
                "-InputFormat",
                "None",
                "-ExecutionPolicy",
                "Bypass",
                "-Command",
                CHOCOLATEY_INSTALL_SCRIPT,
            ]))?;
        }

        shell.status(Status::Installing, PREREQUISITES.join(" "));
        runner.require(&self.choco(runner).args(["install", "-y"]).args(PREREQUISITES))?;
        Ok(())
    }

    fn installed_version(&self, dep: &Dependency, runner: &dyn CommandRunner) -> Option<String> {
        let probe = match (&dep.choco_package, &dep.version_query) {
            (Some(package), _) => runner.probe(&self.choco(runner).args([
                "list",
                "--exact",
                package.as_str(),
                "--limit-output",
            ])),
            (None, Some(query)) => {
                let (program, args) = query.split_first()?;
                runner.probe(&ProcessBuilder::new(program).args(args))
            }
            (None, None) => return None,
        };

        // `--limit-output` prints "name|version"; nothing when absent.
        let out = probe.stdout()?.lines().find(|l| !l.trim().is_empty())?;
        let version = out.split_once('|').map_or(out, |(_, v)| v);
        Some(version.trim().to_string())
    }

    fn install_command(
        &self,
        dep: &Dependency,
        runner: &dyn CommandRunner,
    ) -> Option<ProcessBuilder> {
        let package = dep.choco_package.as_ref()?;
        Some(self.choco(runner).args(["install", "-y", package.as_str()]))
    }

    fn source_prefix(&self) -> Option<&Path> {
        None
    }

    fn static_library_patterns(&self, _dep: &Dependency) -> Vec<String> {
        Vec::new()
    }
}
