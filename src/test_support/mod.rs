//! Test utilities and mocks for unit tests.
//!
//! [`MockRunner`] stands in for the system command runner: it records every
//! command line it is asked to run and answers from scripted expectations.
//! Commands that match no expectation behave like a program that is not
//! installed, which is exactly what the fallback paths need to be tested
//! against.
//!
//! # Example
//!
//! ```rust,ignore
//! let runner = MockRunner::new();
//! runner.expect_prefix("pkg-config --modversion opencv4", CommandOutput::stdout("4.6.0\n"));
//!
//! let probe = runner.probe(&ProcessBuilder::new("pkg-config").args(["--modversion", "opencv4"]));
//! assert_eq!(probe.stdout(), Some("4.6.0\n"));
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::util::process::{CommandOutput, CommandRunner, ProcessBuilder};

// Re-export fixtures for convenience
pub use fixtures::*;

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn stdout(text: &str) -> Self {
        CommandOutput {
            code: Some(0),
            stdout: text.to_string(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failure(code: i32, stderr: &str) -> Self {
        CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Pattern for matching commands in MockRunner.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match using a regex pattern.
    Regex(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(cmd))
                .unwrap_or(false),
        }
    }
}

/// What a matched command does.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The process runs and produces this output.
    Output(CommandOutput),
    /// The process cannot be spawned.
    Missing,
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    /// Pattern to match against commands.
    pub pattern: CommandPattern,
    /// Response when matched.
    pub response: MockResponse,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    /// Number of times this expectation has been used.
    pub used: usize,
}

impl CommandExpectation {
    pub fn new(pattern: CommandPattern, response: MockResponse) -> Self {
        CommandExpectation {
            pattern,
            response,
            times: None,
            used: 0,
        }
    }

    /// Set the number of times this expectation can be used.
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// Check if this expectation can still be used.
    pub fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

/// Mock command runner.
///
/// Expectations are matched in the order they were added; the first
/// available match wins.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: RefCell<Vec<CommandExpectation>>,
    calls: RefCell<Vec<String>>,
    programs: RefCell<BTreeMap<String, PathBuf>>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&self, cmd: &str, output: CommandOutput) -> &Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Exact(cmd.to_string()),
            MockResponse::Output(output),
        ))
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&self, prefix: &str, output: CommandOutput) -> &Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            MockResponse::Output(output),
        ))
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&self, substring: &str, output: CommandOutput) -> &Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Contains(substring.to_string()),
            MockResponse::Output(output),
        ))
    }

    /// Commands starting with `prefix` fail to spawn.
    pub fn expect_missing(&self, prefix: &str) -> &Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            MockResponse::Missing,
        ))
    }

    /// Add a custom expectation.
    pub fn expect_pattern(&self, expectation: CommandExpectation) -> &Self {
        self.expectations.borrow_mut().push(expectation);
        self
    }

    /// Make `find_program(name)` succeed.
    pub fn with_program(&self, name: &str) -> &Self {
        self.programs
            .borrow_mut()
            .insert(name.to_string(), PathBuf::from("/usr/bin").join(name));
        self
    }

    /// Get all commands that were called, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Verify that all expectations with a specific count were satisfied.
    pub fn verify(&self) -> Result<()> {
        for (i, exp) in self.expectations.borrow().iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    bail!(
                        "expectation {} was used {} times, expected {}",
                        i,
                        exp.used,
                        expected
                    );
                }
            }
        }
        Ok(())
    }

    fn respond(&self, cmd: &ProcessBuilder) -> io::Result<CommandOutput> {
        let full_cmd = cmd.display_command();
        self.calls.borrow_mut().push(full_cmd.clone());

        for exp in self.expectations.borrow_mut().iter_mut() {
            if exp.pattern.matches(&full_cmd) && exp.available() {
                exp.used += 1;
                return match &exp.response {
                    MockResponse::Output(output) => Ok(output.clone()),
                    MockResponse::Missing => Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("{}: command not found", cmd.program_name()),
                    )),
                };
            }
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("unexpected command: {}", full_cmd),
        ))
    }
}

impl CommandRunner for MockRunner {
    fn output(&self, cmd: &ProcessBuilder) -> io::Result<CommandOutput> {
        self.respond(cmd)
    }

    fn interactive(&self, cmd: &ProcessBuilder) -> io::Result<CommandOutput> {
        self.respond(cmd)
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        self.programs.borrow().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::process::Probe;

    #[test]
    fn test_expectations_match_in_order_and_count() {
        let runner = MockRunner::new();
        runner.expect_pattern(
            CommandExpectation::new(
                CommandPattern::StartsWith("ninja".to_string()),
                MockResponse::Output(CommandOutput::failure(1, "boom")),
            )
            .times(1),
        );
        runner.expect_prefix("ninja", CommandOutput::stdout("ok"));

        let cmd = ProcessBuilder::new("ninja").args(["-C", "build"]);
        assert!(matches!(runner.probe(&cmd), Probe::Failed(_)));
        assert!(runner.probe(&cmd).succeeded());
        assert_eq!(runner.count_prefix("ninja -C build"), 2);
        runner.verify().unwrap();
    }

    #[test]
    fn test_unmatched_command_is_missing() {
        let runner = MockRunner::new();
        let probe = runner.probe(&ProcessBuilder::new("brew").arg("--version"));
        assert!(matches!(probe, Probe::Missing(_)));
        assert_eq!(runner.calls(), vec!["brew --version".to_string()]);
    }

    #[test]
    fn test_regex_pattern() {
        let pattern = CommandPattern::Regex(r"^cmake -S .* -B .*build$".to_string());
        assert!(pattern.matches("cmake -S /p -B /p/build"));
        assert!(!pattern.matches("cmake --build /p/build"));
    }
}
