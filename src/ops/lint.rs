//! Implementation of `lint`: clang-format over the native sources.
//!
//! Vendored and generated trees are pruned during the walk, so their files
//! are never enumerated, let alone formatted.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::util::context::ProjectContext;
use crate::util::diagnostic::TaskError;
use crate::util::process::{CommandRunner, Probe, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Result of checking one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintVerdict {
    Clean,
    NeedsFormatting,
    /// The formatter could not be run for this file.
    ToolUnavailable,
}

impl fmt::Display for LintVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintVerdict::Clean => f.write_str("clean"),
            LintVerdict::NeedsFormatting => f.write_str("needs formatting"),
            LintVerdict::ToolUnavailable => f.write_str("formatter unavailable"),
        }
    }
}

/// Verdict per file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub verdicts: BTreeMap<PathBuf, LintVerdict>,
}

impl LintReport {
    /// Every file checked out clean (or was formatted).
    pub fn is_clean(&self) -> bool {
        self.verdicts.values().all(|v| *v == LintVerdict::Clean)
    }

    /// Files that need formatting.
    pub fn unformatted(&self) -> Vec<&Path> {
        self.verdicts
            .iter()
            .filter(|(_, v)| **v == LintVerdict::NeedsFormatting)
            .map(|(p, _)| p.as_path())
            .collect()
    }
}

/// Runs the formatter over the project's sources.
pub struct LintRunner<'a> {
    ctx: &'a ProjectContext,
    runner: &'a dyn CommandRunner,
    shell: &'a Shell,
}

impl<'a> LintRunner<'a> {
    pub fn new(ctx: &'a ProjectContext, runner: &'a dyn CommandRunner, shell: &'a Shell) -> Self {
        LintRunner { ctx, runner, shell }
    }

    /// Source files to format, sorted, with excluded directories pruned.
    pub fn files(&self) -> Vec<PathBuf> {
        let lint = &self.ctx.config().lint;
        let exclude = lint.exclude();
        let extensions = lint.extensions();
        let root = self.ctx.source_dir();

        if !root.is_dir() {
            tracing::warn!("source directory {} does not exist", root.display());
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&root)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !exclude.iter().any(|x| e.file_name() == x.as_str())
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }

    /// Check (or with `fix`, rewrite) every source file.
    pub fn run(&self, fix: bool) -> Result<LintReport> {
        let formatter = self.ctx.config().lint.formatter();
        if !self.runner.has_program(formatter) {
            return Err(TaskError::FormatterUnavailable {
                tool: formatter.to_string(),
            }
            .into());
        }

        let files = self.files();
        let status = if fix { Status::Formatting } else { Status::Linting };
        self.shell
            .status(status, format!("{} file(s) with {}", files.len(), formatter));

        let mut report = LintReport::default();
        for file in files {
            let display = self.display_path(&file);
            let cmd = self.format_command(formatter, &file, fix);

            let verdict = match self.runner.probe(&cmd) {
                Probe::Succeeded(_) => LintVerdict::Clean,
                Probe::Failed(out) if fix => {
                    return Err(TaskError::CommandFailed {
                        command: cmd.display_command(),
                        code: out.code,
                        output: out.combined(),
                    }
                    .into());
                }
                Probe::Failed(out) => {
                    self.shell.warn(format!("{} needs formatting", display));
                    if self.shell.is_verbose() {
                        self.shell.detail(&out.combined());
                    }
                    LintVerdict::NeedsFormatting
                }
                Probe::Missing(reason) => {
                    self.shell.error(format!("{}: {}", display, reason));
                    report.verdicts.insert(file, LintVerdict::ToolUnavailable);
                    break;
                }
            };
            report.verdicts.insert(file, verdict);
        }

        let unformatted = report.unformatted().len();
        if report.is_clean() {
            self.shell.status(
                Status::Finished,
                format!("{} file(s) clean", report.verdicts.len()),
            );
        } else if unformatted > 0 {
            self.shell.error(format!(
                "{} file(s) need formatting; run `korova-tasks lint --fix`",
                unformatted
            ));
        }
        Ok(report)
    }

    fn format_command(&self, formatter: &str, file: &Path, fix: bool) -> ProcessBuilder {
        let cmd = ProcessBuilder::new(formatter).arg("--style=file");
        let cmd = if fix {
            cmd.arg("-i")
        } else {
            cmd.args(["--dry-run", "--Werror"])
        };
        cmd.arg(file).cwd(self.ctx.root())
    }

    fn display_path(&self, file: &Path) -> String {
        pathdiff::diff_paths(file, self.ctx.root())
            .unwrap_or_else(|| file.to_path_buf())
            .display()
            .to_string()
    }
}
