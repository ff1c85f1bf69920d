//! High-level operations.
//!
//! This module contains the implementation of the korova-tasks commands.

pub mod build;
pub mod clean;
pub mod doctor;
pub mod lint;
pub mod test;

pub use build::{build, configure, rebuild, run, BuildOptions};
pub use clean::clean;
pub use doctor::{doctor, format_report, CheckResult, DoctorReport};
pub use lint::{LintReport, LintRunner, LintVerdict};
pub use test::test;
