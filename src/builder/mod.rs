//! Configuring, building and locating build output.
//!
//! The builder drives CMake: the toolchain probe finds Qt, the driver runs
//! the configure step and the build backends, and the artifact locator finds
//! the executable in whichever layout the generator produced.

pub mod artifact;
pub mod backend;
pub mod driver;
pub mod toolchain;

pub use artifact::{ArtifactKind, ArtifactLocator};
pub use backend::BuildBackend;
pub use driver::{BuildDriver, BuildOutcome, ConfigureResult};
pub use toolchain::CandidatePath;
