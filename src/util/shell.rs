//! Status output for the CLI.
//!
//! Every phase prints a status line when it starts and when it ends:
//!
//! ```text
//!  Configuring korova (Debug)
//!     Building with ninja
//!     Finished korova (12.40 MB)
//! ```
//!
//! Lines go to stderr so stdout stays free for tool output such as
//! `doctor --json` or shell completions.

use std::fmt::Display;
use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// How much the shell prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `--quiet`: errors only
    Quiet,
    #[default]
    Normal,
    /// `--verbose`: debug logs, spinners replaced by plain lines
    Verbose,
}

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Color when stderr is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ("auto", ColorChoice::Auto),
            ("always", ColorChoice::Always),
            ("never", ColorChoice::Never),
        ]
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(s.trim()))
        .map(|(_, choice)| choice)
        .ok_or_else(|| format!("unknown color mode `{}` (use auto, always or never)", s))
    }
}

/// Verb shown in the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Finished,
    Installed,
    Removed,
    Found,

    Bootstrapping,
    Installing,
    Configuring,
    Building,
    Cleaning,
    Running,
    Testing,
    Linting,
    Formatting,

    Info,

    Skipped,
    Warning,

    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Installed => "Installed",
            Status::Removed => "Removed",
            Status::Found => "Found",
            Status::Bootstrapping => "Bootstrapping",
            Status::Installing => "Installing",
            Status::Configuring => "Configuring",
            Status::Building => "Building",
            Status::Cleaning => "Cleaning",
            Status::Running => "Running",
            Status::Testing => "Testing",
            Status::Linting => "Linting",
            Status::Formatting => "Formatting",
            Status::Info => "Note",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    /// Bold ANSI color: green when done, cyan while working, blue for
    /// notes, yellow for warnings and red for errors.
    fn ansi(&self) -> &'static str {
        const GREEN: &str = "\x1b[1;32m";
        const CYAN: &str = "\x1b[1;36m";
        const BLUE: &str = "\x1b[1;34m";
        const YELLOW: &str = "\x1b[1;33m";
        const RED: &str = "\x1b[1;31m";

        match self {
            Status::Finished | Status::Installed | Status::Removed | Status::Found => GREEN,
            Status::Info => BLUE,
            Status::Skipped | Status::Warning => YELLOW,
            Status::Error => RED,
            _ => CYAN,
        }
    }
}

/// Width of the right-aligned status column.
const STATUS_WIDTH: usize = 13;

/// Central shell for all CLI output.
#[derive(Debug, Clone)]
pub struct Shell {
    verbosity: Verbosity,
    use_color: bool,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        };
        Shell {
            verbosity,
            use_color,
        }
    }

    /// Create a shell from CLI flags. Quiet wins over verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Shell::new(verbosity, color)
    }

    /// A shell that prints errors only and never colors; for tests.
    pub fn quiet() -> Self {
        Shell {
            verbosity: Verbosity::Quiet,
            use_color: false,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Print a status message: `{status:>13} {message}`.
    ///
    /// In quiet mode, only Error status is printed.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_quiet() && status != Status::Error {
            return;
        }
        eprintln!("{} {}", self.format_status(status), msg);
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    pub fn error(&self, msg: impl Display) {
        self.status(Status::Error, msg);
    }

    /// Print indented detail lines under the previous status line.
    pub fn detail(&self, text: &str) {
        if self.is_quiet() {
            return;
        }
        for line in text.lines() {
            eprintln!("{:width$}   {}", "", line, width = STATUS_WIDTH);
        }
    }

    /// Spinner for a long-running external command.
    ///
    /// Hidden in quiet and verbose mode and when stderr is not a terminal.
    pub fn spinner(&self, status: Status, msg: impl Display) -> ProgressBar {
        if self.verbosity != Verbosity::Normal || !io::stderr().is_terminal() {
            self.status(status, &msg);
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        let template = format!("{{prefix:>{}.cyan.bold}} {{spinner}} {{msg}}", STATUS_WIDTH);
        if let Ok(style) = ProgressStyle::with_template(&template) {
            pb.set_style(style);
        }
        pb.set_prefix(status.as_str());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.ansi(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto)
    }
}
