//! Debian/Ubuntu bootstrap through apt.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::PlatformStrategy;
use crate::core::dependency::Dependency;
use crate::core::platform::PlatformKind;
use crate::util::config::BootstrapConfig;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Packages needed before any dependency can be built.
pub const PREREQUISITES: &[&str] = &[
    "build-essential",
    "cmake",
    "ninja-build",
    "git",
    "pkg-config",
    "clang-format",
    "libgl1-mesa-dev",
    "libxkbcommon-dev",
    "libusb-1.0-0-dev",
];

/// Directories searched for static archives.
const LIBRARY_DIRS: &[&str] = &["/usr/local/lib", "/usr/lib/x86_64-linux-gnu", "/usr/lib"];

/// apt-based strategy.
#[derive(Debug, Clone)]
pub struct LinuxStrategy {
    sudo: bool,
    prefix: PathBuf,
}

impl LinuxStrategy {
    pub fn new(config: &BootstrapConfig) -> Self {
        LinuxStrategy {
            sudo: config.sudo(),
            prefix: config.source_prefix().to_path_buf(),
        }
    }

    fn apt_get(&self) -> ProcessBuilder {
        self.elevate(ProcessBuilder::new("apt-get").cwd("/"))
    }
}

impl PlatformStrategy for LinuxStrategy {
    fn platform(&self) -> PlatformKind {
        PlatformKind::Linux
    }

    fn package_manager(&self) -> &'static str {
        "apt-get"
    }

    fn prepare(&self, runner: &dyn CommandRunner, shell: &Shell) -> Result<()> {
        shell.status(Status::Installing, "updating apt package lists");
        runner.require(&self.apt_get().arg("update"))?;

        shell.status(Status::Installing, PREREQUISITES.join(" "));
        runner.require(&self.apt_get().args(["install", "-y"]).args(PREREQUISITES))?;
        Ok(())
    }

    fn installed_version(&self, dep: &Dependency, runner: &dyn CommandRunner) -> Option<String> {
        let module = dep.pkg_config_module.as_ref()?;
        let probe = runner.probe(
            &ProcessBuilder::new("pkg-config")
                .args(["--modversion", module.as_str()])
                .cwd("/"),
        );
        probe
            .stdout()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn install_command(
        &self,
        dep: &Dependency,
        _runner: &dyn CommandRunner,
    ) -> Option<ProcessBuilder> {
        let package = dep.apt_package.as_ref()?;
        Some(self.apt_get().args(["install", "-y", package.as_str()]))
    }

    fn source_prefix(&self) -> Option<&Path> {
        Some(&self.prefix)
    }

    fn elevate(&self, cmd: ProcessBuilder) -> ProcessBuilder {
        if self.sudo {
            cmd.wrapped("sudo")
        } else {
            cmd
        }
    }

    fn refresh_linker_cache(&self) -> Option<ProcessBuilder> {
        Some(self.elevate(ProcessBuilder::new("ldconfig").cwd("/")))
    }

    fn static_library_patterns(&self, dep: &Dependency) -> Vec<String> {
        let mut dirs: Vec<PathBuf> = vec![self.prefix.join("lib")];
        for dir in LIBRARY_DIRS.iter().map(PathBuf::from) {
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }

        dep.static_libraries
            .iter()
            .flat_map(|lib| {
                dirs.iter()
                    .map(move |dir| dir.join(format!("lib{}.a", lib)).display().to_string())
            })
            .collect()
    }
}
