//! Environment and toolchain health checks.
//!
//! `doctor` reports what `bootstrap` and `build` would find, without
//! installing or writing anything.
//!
//! ## Checks Performed
//!
//! - Host platform is supported
//! - CMake on PATH
//! - Preferred and alternate build backends on PATH
//! - Installed Qt and OpenCV versions against their minimums
//! - Qt toolchain location handed to CMake
//! - Formatter and git availability

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::bootstrap::strategy_for;
use crate::builder::toolchain::{locate, qt_candidates};
use crate::core::dependency::required_dependencies;
use crate::core::version::{extract_version, satisfies};
use crate::util::context::ProjectContext;
use crate::util::process::{CommandRunner, ProcessBuilder};

/// One line of the doctor report.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Optional checks never fail the report.
    pub required: bool,
}

impl CheckResult {
    fn new(name: impl Into<String>, passed: bool, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed,
            message: message.into(),
            path: None,
            version: None,
            required: true,
        }
    }

    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, true, message)
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, false, message)
    }

    pub fn optional(self) -> Self {
        CheckResult {
            required: false,
            ..self
        }
    }

    pub fn with_path(self, path: PathBuf) -> Self {
        CheckResult {
            path: Some(path),
            ..self
        }
    }

    pub fn with_version(self, version: impl Into<String>) -> Self {
        CheckResult {
            version: Some(version.into()),
            ..self
        }
    }
}

/// Every check, in the order it ran, for one platform.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DoctorReport {
    pub platform: String,
    pub checks: Vec<CheckResult>,
}

impl DoctorReport {
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// True when no required check failed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Run every check. Never installs or writes anything.
pub fn doctor(ctx: &ProjectContext, runner: &dyn CommandRunner) -> Result<DoctorReport> {
    let platform = ctx.platform();
    let config = ctx.config();
    let mut report = DoctorReport {
        platform: platform.to_string(),
        checks: Vec::new(),
    };

    let strategy = match strategy_for(platform, &config.bootstrap) {
        Ok(strategy) => {
            report.add(CheckResult::pass("Platform", format!("{} is supported", platform)));
            Some(strategy)
        }
        Err(e) => {
            report.add(CheckResult::fail("Platform", e.to_string()));
            None
        }
    };

    report.add(check_tool(runner, "CMake", "cmake", true));

    let preferred = config.backend.preferred();
    let alternate = config.backend.alternate();
    let backends = [preferred, alternate];
    let available: Vec<_> = backends
        .iter()
        .filter(|b| runner.has_program(b.program()))
        .collect();
    report.add(match available.first() {
        Some(backend) => CheckResult::pass("Build backend", format!("{} is available", backend))
            .with_path(runner.find_program(backend.program()).unwrap_or_default()),
        None => CheckResult::fail(
            "Build backend",
            format!("neither {} nor {} found on PATH", preferred, alternate),
        ),
    });

    if let Some(strategy) = &strategy {
        for dep in required_dependencies(&config.bootstrap) {
            let name = format!("{} >= {}", dep.name, dep.minimum);
            let check = match strategy.installed_version(&dep, runner) {
                None => CheckResult::fail(name, "not installed; run `korova-tasks bootstrap`"),
                Some(raw) => match extract_version(&raw) {
                    Some(found) if satisfies(&found, &dep.minimum).unwrap_or(false) => {
                        CheckResult::pass(name, format!("{} {}", dep.name, found))
                            .with_version(found)
                    }
                    Some(found) => CheckResult::fail(name, format!("{} is too old", found))
                        .with_version(found),
                    None => CheckResult::fail(name, format!("unrecognized version `{}`", raw)),
                },
            };
            report.add(check);
        }
    }

    report.add(
        match locate(&qt_candidates(&config.toolchain, platform)) {
            Some(path) => CheckResult::pass("Qt toolchain", "passed to CMake as CMAKE_PREFIX_PATH")
                .with_path(path),
            None => CheckResult::fail(
                "Qt toolchain",
                "no known Qt location found; CMake will search on its own",
            ),
        }
        .optional(),
    );

    let formatter = config.lint.formatter();
    report.add(check_tool(runner, "Formatter", formatter, false));
    report.add(check_tool(runner, "Git", "git", false));

    Ok(report)
}

fn check_tool(runner: &dyn CommandRunner, name: &str, program: &str, required: bool) -> CheckResult {
    let check = match runner.find_program(program) {
        Some(path) => {
            let probe = runner.probe(&ProcessBuilder::new(&path).arg("--version"));
            let check = CheckResult::pass(name, format!("{} is available", program)).with_path(path);
            match probe.stdout().and_then(extract_version) {
                Some(version) => check.with_version(version),
                None => check,
            }
        }
        None => CheckResult::fail(name, format!("{} not found on PATH", program)),
    };
    if required {
        check
    } else {
        check.optional()
    }
}

/// Human-readable rendering of a report.
pub struct ReportDisplay<'a> {
    report: &'a DoctorReport,
    verbose: bool,
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> ReportDisplay<'_> {
    ReportDisplay { report, verbose }
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "korova-tasks doctor ({})", report.platform)?;
        writeln!(f)?;

        for check in &report.checks {
            let status = if check.passed { "[OK]" } else { "[!!]" };
            let required = if check.required { "" } else { " (optional)" };
            match &check.version {
                Some(version) => writeln!(f, "  {} {}{} {}", status, check.name, required, version)?,
                None => writeln!(f, "  {} {}{}", status, check.name, required)?,
            }

            if self.verbose || !check.passed {
                writeln!(f, "      {}", check.message)?;
            }
            if self.verbose {
                if let Some(path) = &check.path {
                    writeln!(f, "      Path: {}", path.display())?;
                }
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Summary: {} passed, {} failed",
            report.passed_count(),
            report.failed_count()
        )?;

        let required_failed = report.required_failed_count();
        if required_failed > 0 {
            writeln!(f, "{} required check(s) failed.", required_failed)
        } else {
            writeln!(f, "All required checks passed.")
        }
    }
}
