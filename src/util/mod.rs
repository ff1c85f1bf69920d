//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod fs;
pub mod process;
pub mod shell;

pub use config::Config;
pub use context::ProjectContext;
pub use diagnostic::TaskError;
pub use process::{CommandOutput, CommandRunner, Probe, ProcessBuilder, SystemRunner};
pub use shell::{Shell, Status};
