//! Installing the native toolchain and libraries.
//!
//! Each supported platform has a [`PlatformStrategy`] that knows its package
//! manager. The per-dependency flow is the same everywhere:
//!
//! ```text
//! check installed ──absent──▶ install via package manager ──fail──▶ build from source
//!        │                              │ ok                               │
//!        │                        re-check version ──too old──────────────▶│
//!        ▼                                                                 ▼
//!  verify version ──too old / unparsable──────────────────────────▶ build from source
//! ```
//!
//! This is the only part of the tool with host-wide side effects: privileged
//! package installs, writes under the source-build prefix and a refresh of
//! the dynamic linker cache.

pub mod linux;
pub mod macos;
pub mod source;
pub mod windows;

use std::fmt;
use std::path::Path;

use anyhow::{bail, Result};

use crate::core::dependency::Dependency;
use crate::core::platform::PlatformKind;
use crate::core::version::{extract_version, satisfies};
use crate::util::config::BootstrapConfig;
use crate::util::diagnostic::{suggestions, TaskError};
use crate::util::fs::glob_paths;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

pub use linux::LinuxStrategy;
pub use macos::MacStrategy;
pub use windows::WindowsStrategy;

/// Platform-specific half of the bootstrap.
pub trait PlatformStrategy {
    /// The platform this strategy installs for.
    fn platform(&self) -> PlatformKind;

    /// Name of the package manager, for messages.
    fn package_manager(&self) -> &'static str;

    /// Make the package manager usable and install build prerequisites.
    ///
    /// Failures here are fatal.
    fn prepare(&self, runner: &dyn CommandRunner, shell: &Shell) -> Result<()>;

    /// Raw version text of an installed dependency, `None` if absent.
    fn installed_version(&self, dep: &Dependency, runner: &dyn CommandRunner) -> Option<String>;

    /// Command installing `dep`, `None` if the package manager does not carry it.
    fn install_command(&self, dep: &Dependency, runner: &dyn CommandRunner)
        -> Option<ProcessBuilder>;

    /// Where source builds install to. `None` disables source builds.
    fn source_prefix(&self) -> Option<&Path>;

    /// Wrap a command that writes to system locations.
    fn elevate(&self, cmd: ProcessBuilder) -> ProcessBuilder {
        cmd
    }

    /// Command refreshing the dynamic linker cache after an install.
    fn refresh_linker_cache(&self) -> Option<ProcessBuilder> {
        None
    }

    /// Glob patterns matching the static archives of `dep`.
    fn static_library_patterns(&self, dep: &Dependency) -> Vec<String>;
}

/// Look up the strategy for a platform.
pub fn strategy_for(
    platform: &PlatformKind,
    config: &BootstrapConfig,
) -> Result<Box<dyn PlatformStrategy>, TaskError> {
    match platform {
        PlatformKind::Linux => Ok(Box::new(LinuxStrategy::new(config))),
        PlatformKind::MacOS => Ok(Box::new(MacStrategy::new(config))),
        PlatformKind::Windows => Ok(Box::new(WindowsStrategy::new())),
        PlatformKind::Unsupported(os) => Err(TaskError::UnsupportedPlatform { os: os.clone() }),
    }
}

/// How one dependency ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapResult {
    /// Installed by the package manager during this run.
    Installed,
    /// A recent enough version was already present.
    AlreadySatisfied,
    /// Built and installed from source.
    FellBackToSource,
    /// Could not be provided.
    Failed(String),
}

impl BootstrapResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, BootstrapResult::Failed(_))
    }
}

impl fmt::Display for BootstrapResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapResult::Installed => f.write_str("installed"),
            BootstrapResult::AlreadySatisfied => f.write_str("already satisfied"),
            BootstrapResult::FellBackToSource => f.write_str("built from source"),
            BootstrapResult::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Per-dependency results, in bootstrap order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub results: Vec<(String, BootstrapResult)>,
}

impl BootstrapReport {
    pub fn is_success(&self) -> bool {
        !self.results.iter().any(|(_, r)| r.is_failed())
    }

    /// The dependency that stopped the run, with the reason.
    pub fn failure(&self) -> Option<(&str, &str)> {
        self.results.iter().find_map(|(name, result)| match result {
            BootstrapResult::Failed(reason) => Some((name.as_str(), reason.as_str())),
            _ => None,
        })
    }
}

/// Outcome of comparing an installed version with the minimum.
#[derive(Debug, Clone, PartialEq, Eq)]
enum VersionCheck {
    Satisfied(String),
    TooOld(String),
    Unverifiable(String),
}

fn check_version(dep: &Dependency, raw: &str) -> VersionCheck {
    let Some(found) = extract_version(raw) else {
        return VersionCheck::Unverifiable(raw.trim().to_string());
    };
    match satisfies(&found, &dep.minimum) {
        Ok(true) => VersionCheck::Satisfied(found),
        Ok(false) => VersionCheck::TooOld(found),
        Err(e) => {
            tracing::debug!("cannot compare {} versions: {}", dep.name, e);
            VersionCheck::Unverifiable(found)
        }
    }
}

/// Runs the bootstrap for one platform.
pub struct Bootstrapper<'a> {
    strategy: Box<dyn PlatformStrategy>,
    runner: &'a dyn CommandRunner,
    shell: &'a Shell,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(
        strategy: Box<dyn PlatformStrategy>,
        runner: &'a dyn CommandRunner,
        shell: &'a Shell,
    ) -> Self {
        Bootstrapper {
            strategy,
            runner,
            shell,
        }
    }

    pub fn strategy(&self) -> &dyn PlatformStrategy {
        self.strategy.as_ref()
    }

    /// Prepare the host, then bring every dependency up to its minimum.
    ///
    /// Stops at the first dependency that cannot be provided.
    pub fn run(&self, deps: &[Dependency]) -> Result<BootstrapReport> {
        self.strategy.prepare(self.runner, self.shell)?;

        let mut report = BootstrapReport::default();
        for dep in deps {
            let result = self.bootstrap_one(dep);
            let failed = result.is_failed();
            if !failed {
                self.shell
                    .status(Status::Finished, format!("{} {}", dep.name, result));
                self.verify_static_libraries(dep);
            }
            report.results.push((dep.name.clone(), result));
            if failed {
                break;
            }
        }
        Ok(report)
    }

    /// Prepare the host and install every dependency with the package
    /// manager, without version checks or source fallback.
    pub fn install_packages(&self, deps: &[Dependency]) -> Result<()> {
        self.strategy.prepare(self.runner, self.shell)?;

        for dep in deps {
            let Some(cmd) = self.strategy.install_command(dep, self.runner) else {
                self.shell.warn(format!(
                    "{} has no {} package, skipping",
                    dep.name,
                    self.strategy.package_manager()
                ));
                continue;
            };
            self.shell.status(Status::Installing, &dep.name);
            self.runner.require(&cmd)?;
        }
        Ok(())
    }

    fn bootstrap_one(&self, dep: &Dependency) -> BootstrapResult {
        self.shell.status(
            Status::Bootstrapping,
            format!("{} (>= {})", dep.name, dep.minimum),
        );

        match self.strategy.installed_version(dep, self.runner) {
            None => {
                tracing::info!("{} not installed", dep.name);
                if let Err(reason) = self.install_package(dep) {
                    self.shell.warn(format!(
                        "{} install of {} failed, building from source",
                        self.strategy.package_manager(),
                        dep.name
                    ));
                    self.shell.detail(&reason);
                    return self.from_source(dep);
                }
                match self.strategy.installed_version(dep, self.runner) {
                    Some(raw) => match check_version(dep, &raw) {
                        VersionCheck::Satisfied(_) => BootstrapResult::Installed,
                        check => {
                            self.report_unsatisfied(dep, &check);
                            self.from_source(dep)
                        }
                    },
                    None => {
                        self.shell.warn(format!(
                            "{} still not detected after install, building from source",
                            dep.name
                        ));
                        self.from_source(dep)
                    }
                }
            }
            Some(raw) => match check_version(dep, &raw) {
                VersionCheck::Satisfied(found) => {
                    self.shell.status(Status::Found, format!("{} {}", dep.name, found));
                    BootstrapResult::AlreadySatisfied
                }
                check => {
                    self.report_unsatisfied(dep, &check);
                    self.from_source(dep)
                }
            },
        }
    }

    fn install_package(&self, dep: &Dependency) -> std::result::Result<(), String> {
        let Some(cmd) = self.strategy.install_command(dep, self.runner) else {
            return Err(format!(
                "{} does not provide {}",
                self.strategy.package_manager(),
                dep.name
            ));
        };
        self.shell.status(
            Status::Installing,
            format!("{} via {}", dep.name, self.strategy.package_manager()),
        );
        let probe = self.runner.probe(&cmd);
        if probe.succeeded() {
            Ok(())
        } else {
            Err(probe.describe())
        }
    }

    fn report_unsatisfied(&self, dep: &Dependency, check: &VersionCheck) {
        match check {
            VersionCheck::TooOld(found) => {
                let err = TaskError::VersionTooOld {
                    name: dep.name.clone(),
                    found: found.clone(),
                    minimum: dep.minimum.clone(),
                };
                self.shell.warn(format!("{}, building from source", err));
            }
            VersionCheck::Unverifiable(raw) => {
                self.shell.warn(format!(
                    "cannot read {} version from `{}`, building from source",
                    dep.name, raw
                ));
            }
            VersionCheck::Satisfied(_) => {}
        }
    }

    fn from_source(&self, dep: &Dependency) -> BootstrapResult {
        if dep.source.is_none() {
            return BootstrapResult::Failed(format!(
                "no source build available for {}\n{}",
                dep.name,
                suggestions::MANUAL_INSTALL
            ));
        }
        if self.strategy.source_prefix().is_none() {
            return BootstrapResult::Failed(format!(
                "source builds are not supported on {}\n{}",
                self.strategy.platform(),
                suggestions::MANUAL_INSTALL
            ));
        }

        match source::build_from_source(self.strategy.as_ref(), dep, self.runner, self.shell) {
            Ok(()) => BootstrapResult::FellBackToSource,
            Err(e) => BootstrapResult::Failed(format!("{:#}", e)),
        }
    }

    /// Best effort: a missing static archive means dynamic linking.
    fn verify_static_libraries(&self, dep: &Dependency) {
        let patterns = self.strategy.static_library_patterns(dep);
        if patterns.is_empty() {
            return;
        }
        let found = glob_paths(&patterns);
        if found.is_empty() {
            self.shell.warn(format!(
                "no static libraries found for {}; the app will link dynamically",
                dep.name
            ));
        } else {
            tracing::debug!("static libraries for {}: {:?}", dep.name, found);
        }
    }
}

/// Install everything Korova needs on `platform`.
pub fn bootstrap(
    platform: &PlatformKind,
    config: &BootstrapConfig,
    deps: &[Dependency],
    runner: &dyn CommandRunner,
    shell: &Shell,
) -> Result<BootstrapReport> {
    let strategy = strategy_for(platform, config)?;

    shell.warn(format!(
        "bootstrap installs system packages with {} and may write under {}",
        strategy.package_manager(),
        strategy
            .source_prefix()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "the package manager's prefix".to_string())
    ));

    Bootstrapper::new(strategy, runner, shell).run(deps)
}

/// Package-manager-only install; Linux only.
pub fn install_deps(
    platform: &PlatformKind,
    config: &BootstrapConfig,
    deps: &[Dependency],
    runner: &dyn CommandRunner,
    shell: &Shell,
) -> Result<()> {
    let strategy = strategy_for(platform, config)?;
    if *platform != PlatformKind::Linux {
        bail!(
            "install-deps only supports linux; use `korova-tasks bootstrap` on {}",
            platform
        );
    }
    Bootstrapper::new(strategy, runner, shell).install_packages(deps)
}
