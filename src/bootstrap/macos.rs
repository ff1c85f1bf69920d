//! macOS bootstrap through Homebrew.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::PlatformStrategy;
use crate::core::dependency::Dependency;
use crate::core::platform::PlatformKind;
use crate::util::config::BootstrapConfig;
use crate::util::diagnostic::TaskError;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

pub const PREREQUISITES: &[&str] = &["cmake", "ninja", "git", "pkg-config", "clang-format", "libusb"];

const HOMEBREW_INSTALL_HINT: &str = "install Homebrew from https://brew.sh first:\n  \
     /bin/bash -c \"$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)\"";

/// Homebrew prefixes, Apple Silicon first.
const BREW_PREFIXES: &[&str] = &["/opt/homebrew", "/usr/local"];

/// Homebrew-based strategy.
#[derive(Debug, Clone)]
pub struct MacStrategy {
    sudo: bool,
    prefix: PathBuf,
}

impl MacStrategy {
    pub fn new(config: &BootstrapConfig) -> Self {
        MacStrategy {
            sudo: config.sudo(),
            prefix: config.source_prefix().to_path_buf(),
        }
    }

    // brew refuses to run as root, so it is never elevated.
    fn brew(&self) -> ProcessBuilder {
        ProcessBuilder::new("brew").cwd("/")
    }
}

impl PlatformStrategy for MacStrategy {
    fn platform(&self) -> PlatformKind {
        PlatformKind::MacOS
    }

    fn package_manager(&self) -> &'static str {
        "brew"
    }

    fn prepare(&self, runner: &dyn CommandRunner, shell: &Shell) -> Result<()> {
        if !runner.has_program("brew") {
            return Err(TaskError::ToolMissing {
                tool: "brew".to_string(),
                hint: HOMEBREW_INSTALL_HINT.to_string(),
            }
            .into());
        }

        shell.status(Status::Installing, PREREQUISITES.join(" "));
        runner.require(&self.brew().arg("install").args(PREREQUISITES))?;
        Ok(())
    }

    fn installed_version(&self, dep: &Dependency, runner: &dyn CommandRunner) -> Option<String> {
        let formula = dep.brew_formula.as_ref()?;
        let probe = runner.probe(&self.brew().args(["list", "--versions", formula.as_str()]));
        // `brew list --versions <f>` prints "<f> <v1> [<v2> ...]"; the newest is last.
        probe
            .stdout()
            .and_then(|out| out.split_whitespace().skip(1).last())
            .map(str::to_string)
    }

    fn install_command(
        &self,
        dep: &Dependency,
        _runner: &dyn CommandRunner,
    ) -> Option<ProcessBuilder> {
        let formula = dep.brew_formula.as_ref()?;
        Some(self.brew().args(["install", formula.as_str()]))
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

    fn static_library_patterns(&self, dep: &Dependency) -> Vec<String> {
        let mut patterns = Vec::new();
        for lib in &dep.static_libraries {
            let archive = format!("lib{}.a", lib);
            patterns.push(self.prefix.join("lib").join(&archive).display().to_string());
            if let Some(formula) = &dep.brew_formula {
                for brew in BREW_PREFIXES {
                    patterns.push(format!("{}/opt/{}/lib/{}", brew, formula, archive));
                }
            }
        }
        patterns
    }
}
