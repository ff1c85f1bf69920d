//! Core data model: platforms, versions and the required libraries.

pub mod dependency;
pub mod platform;
pub mod version;

pub use dependency::{Dependency, SourceRecipe};
pub use platform::PlatformKind;
pub use version::{satisfies, Version, VersionParseError};
