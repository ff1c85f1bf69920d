//! Finding what the build produced.
//!
//! The output layout depends on the generator and on how the CMake project
//! has been arranged over time: single-config generators put the app either
//! at the top of the build tree or in a directory mirroring `src/app`,
//! multi-config generators add a `Debug`/`Release` level, and macOS builds
//! produce an application bundle. Candidates are checked in declaration
//! order; the first existing one wins.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::platform::PlatformKind;
use crate::util::context::ProjectContext;
use crate::util::fs::executables_under;

/// What to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The application executable.
    Executable,
    /// The directory holding the test binaries.
    TestSuite,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Executable => f.write_str("executable"),
            ArtifactKind::TestSuite => f.write_str("test directory"),
        }
    }
}

const CONFIGURATIONS: [&str; 2] = ["Debug", "Release"];

/// Searches a build tree for artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    build_dir: PathBuf,
    app_name: String,
    platform: PlatformKind,
}

impl ArtifactLocator {
    pub fn new(build_dir: impl Into<PathBuf>, app_name: &str, platform: PlatformKind) -> Self {
        ArtifactLocator {
            build_dir: build_dir.into(),
            app_name: app_name.to_string(),
            platform,
        }
    }

    pub fn for_project(ctx: &ProjectContext) -> Self {
        Self::new(ctx.build_dir(), ctx.app_name(), ctx.platform().clone())
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Candidate paths for `kind`, highest priority first.
    pub fn candidates(&self, kind: ArtifactKind) -> Vec<PathBuf> {
        let build = &self.build_dir;
        let nested = build.join("src").join("app");
        let mut paths = Vec::new();

        match kind {
            ArtifactKind::Executable => {
                let exe = format!("{}{}", self.app_name, self.platform.exe_suffix());
                paths.push(build.join(&exe));
                paths.push(nested.join(&exe));
                for config in CONFIGURATIONS {
                    paths.push(build.join(config).join(&exe));
                }
                for config in CONFIGURATIONS {
                    paths.push(nested.join(config).join(&exe));
                }
                if self.platform == PlatformKind::MacOS {
                    let bundle = Path::new(&format!("{}.app", self.app_name))
                        .join("Contents")
                        .join("MacOS")
                        .join(&self.app_name);
                    paths.push(build.join(&bundle));
                    paths.push(nested.join(&bundle));
                }
            }
            ArtifactKind::TestSuite => {
                let nested_tests = build.join("src").join("tests");
                paths.push(build.join("tests"));
                paths.push(nested_tests.clone());
                for config in CONFIGURATIONS {
                    paths.push(build.join(config).join("tests"));
                }
                for config in CONFIGURATIONS {
                    paths.push(nested_tests.join(config));
                }
            }
        }

        paths
    }

    /// First existing candidate for `kind`.
    pub fn locate(&self, kind: ArtifactKind) -> Option<PathBuf> {
        self.candidates(kind).into_iter().find(|path| match kind {
            ArtifactKind::Executable => path.is_file(),
            ArtifactKind::TestSuite => path.is_dir(),
        })
    }

    /// A single test binary named `name` inside any test directory.
    pub fn locate_test(&self, name: &str) -> Option<PathBuf> {
        let file = format!("{}{}", name, self.platform.exe_suffix());
        self.candidates(ArtifactKind::TestSuite)
            .into_iter()
            .filter(|dir| dir.is_dir())
            .flat_map(|dir| {
                let mut paths = vec![dir.join(&file)];
                paths.extend(CONFIGURATIONS.iter().map(|c| dir.join(c).join(&file)));
                paths
            })
            .find(|path| path.is_file())
    }

    /// Every executable in the build tree; printed when the lookup fails.
    pub fn executables(&self) -> Vec<PathBuf> {
        if self.build_dir.is_dir() {
            executables_under(&self.build_dir)
        } else {
            Vec::new()
        }
    }
}
