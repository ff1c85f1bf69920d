//! Build backends: the programs that compile a configured build tree.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::util::process::ProcessBuilder;

/// A program able to drive the compilation of a configured CMake tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildBackend {
    /// `ninja -C <build>`; needs a Ninja-generated tree.
    Ninja,
    /// `cmake --build <build>`; works with whatever generator configured the tree.
    CMake,
    /// `make -C <build>`; needs a Makefile-generated tree.
    Make,
}

impl BuildBackend {
    /// Program name on PATH.
    pub fn program(&self) -> &'static str {
        match self {
            BuildBackend::Ninja => "ninja",
            BuildBackend::CMake => "cmake",
            BuildBackend::Make => "make",
        }
    }

    /// Command that builds everything in `build_dir`.
    pub fn build_command(&self, build_dir: &Path, jobs: Option<usize>) -> ProcessBuilder {
        match self {
            BuildBackend::Ninja => {
                let mut cmd = ProcessBuilder::new("ninja").arg("-C").arg(build_dir);
                if let Some(jobs) = jobs {
                    cmd = cmd.arg(format!("-j{}", jobs));
                }
                cmd
            }
            BuildBackend::CMake => {
                let cmd = ProcessBuilder::new("cmake")
                    .arg("--build")
                    .arg(build_dir)
                    .arg("--parallel");
                match jobs {
                    Some(jobs) => cmd.arg(jobs.to_string()),
                    None => cmd,
                }
            }
            BuildBackend::Make => {
                let mut cmd = ProcessBuilder::new("make").arg("-C").arg(build_dir);
                if let Some(jobs) = jobs {
                    cmd = cmd.arg(format!("-j{}", jobs));
                }
                cmd
            }
        }
    }
}

impl FromStr for BuildBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ninja" => Ok(BuildBackend::Ninja),
            "cmake" => Ok(BuildBackend::CMake),
            "make" | "makefiles" => Ok(BuildBackend::Make),
            _ => Err(format!(
                "unknown build backend '{}'; expected 'ninja', 'cmake', or 'make'",
                s
            )),
        }
    }
}

impl fmt::Display for BuildBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}
