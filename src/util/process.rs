//! Subprocess execution utilities.
//!
//! All external commands go through a [`CommandRunner`], which has two
//! execution modes:
//!
//! - [`CommandRunner::probe`] is for commands that may legitimately fail as
//!   part of normal control flow (is a tool installed, which version is it).
//!   Any failure, including a missing program, comes back as a [`Probe`].
//! - [`CommandRunner::require`] is for commands whose failure ends the run.
//!   A non-zero exit or a missing program becomes a [`TaskError`] carrying
//!   the command's output.
//!
//! The working directory is always passed explicitly through
//! [`ProcessBuilder::cwd`]; nothing here changes the process-wide cwd.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::util::diagnostic::TaskError;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Run this command through `wrapper` (e.g. `sudo`), keeping cwd and env.
    pub fn wrapped(self, wrapper: impl AsRef<Path>) -> Self {
        let mut args = vec![self.program.display().to_string()];
        args.extend(self.args);
        ProcessBuilder {
            program: wrapper.as_ref().to_path_buf(),
            args,
            env: self.env,
            cwd: self.cwd,
        }
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Program name without directories, used in messages.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Exit code and captured output of one finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a process that exited with the given code and printed nothing.
    pub fn from_code(code: i32) -> Self {
        CommandOutput {
            code: Some(code),
            ..Default::default()
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout and stderr joined, trimmed, for error reports.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (false, true) => stdout.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Result of a command run in probe mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The command ran and exited zero.
    Succeeded(CommandOutput),
    /// The command ran and exited non-zero.
    Failed(CommandOutput),
    /// The command could not be started at all.
    Missing(String),
}

impl Probe {
    pub fn succeeded(&self) -> bool {
        matches!(self, Probe::Succeeded(_))
    }

    /// Stdout of a successful run.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            Probe::Succeeded(out) => Some(&out.stdout),
            _ => None,
        }
    }

    /// Output of the run, whether it succeeded or not.
    pub fn output(&self) -> Option<&CommandOutput> {
        match self {
            Probe::Succeeded(out) | Probe::Failed(out) => Some(out),
            Probe::Missing(_) => None,
        }
    }

    /// Human-readable explanation of a failed probe.
    pub fn describe(&self) -> String {
        match self {
            Probe::Succeeded(_) => "succeeded".to_string(),
            Probe::Failed(out) => out.combined(),
            Probe::Missing(reason) => reason.clone(),
        }
    }
}

/// Executes external commands, one at a time, to completion.
pub trait CommandRunner {
    /// Run the command with captured stdout/stderr.
    ///
    /// An `Err` means the process could not be spawned.
    fn output(&self, cmd: &ProcessBuilder) -> io::Result<CommandOutput>;

    /// Run the command attached to the terminal. Captured streams are empty.
    fn interactive(&self, cmd: &ProcessBuilder) -> io::Result<CommandOutput>;

    /// Look up a program on PATH.
    fn find_program(&self, name: &str) -> Option<PathBuf>;

    /// Whether a program is on PATH.
    fn has_program(&self, name: &str) -> bool {
        self.find_program(name).is_some()
    }

    /// Run a command whose failure is an expected outcome.
    fn probe(&self, cmd: &ProcessBuilder) -> Probe {
        tracing::debug!("probe: {}", cmd.display_command());
        match self.output(cmd) {
            Ok(out) if out.success() => Probe::Succeeded(out),
            Ok(out) => Probe::Failed(out),
            Err(e) => Probe::Missing(format!("failed to spawn `{}`: {}", cmd.program_name(), e)),
        }
    }

    /// Run a command whose failure ends the run.
    fn require(&self, cmd: &ProcessBuilder) -> Result<CommandOutput, TaskError> {
        tracing::debug!("run: {}", cmd.display_command());
        let result = self.output(cmd);
        check_result(cmd, result)
    }

    /// Run an interactive command whose failure ends the run.
    fn require_interactive(&self, cmd: &ProcessBuilder) -> Result<CommandOutput, TaskError> {
        tracing::debug!("run: {}", cmd.display_command());
        let result = self.interactive(cmd);
        check_result(cmd, result)
    }
}

fn check_result(
    cmd: &ProcessBuilder,
    result: io::Result<CommandOutput>,
) -> Result<CommandOutput, TaskError> {
    match result {
        Ok(out) if out.success() => Ok(out),
        Ok(out) => Err(TaskError::CommandFailed {
            command: cmd.display_command(),
            code: out.code,
            output: out.combined(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(TaskError::ToolMissing {
            tool: cmd.program_name(),
            hint: format!("failed to spawn `{}`: {}", cmd.display_command(), e),
        }),
        Err(e) => Err(TaskError::CommandFailed {
            command: cmd.display_command(),
            code: None,
            output: e.to_string(),
        }),
    }
}

/// Runner backed by real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn output(&self, cmd: &ProcessBuilder) -> io::Result<CommandOutput> {
        let mut command = cmd.build_command();
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        let output = command.output()?;
        Ok(output.into())
    }

    fn interactive(&self, cmd: &ProcessBuilder) -> io::Result<CommandOutput> {
        let status = cmd.build_command().status()?;
        Ok(CommandOutput {
            code: status.code(),
            ..Default::default()
        })
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        find_executable(name)
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
