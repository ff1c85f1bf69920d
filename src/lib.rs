//! korova-tasks - build orchestration for the Korova Qt/OpenCV application
//!
//! This crate provides the library behind the `korova-tasks` binary:
//! dependency bootstrap per platform, CMake configure and build with backend
//! fallback, artifact lookup, test running and source formatting.

pub mod bootstrap;
pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a scripted command runner and on-disk project fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{Dependency, PlatformKind};
pub use bootstrap::{BootstrapReport, BootstrapResult, PlatformStrategy};
pub use builder::{BuildDriver, BuildOutcome};
pub use util::context::ProjectContext;
