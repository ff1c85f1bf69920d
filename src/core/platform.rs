//! Host platform detection.

use std::fmt;
use std::str::FromStr;

/// The operating system family the tool is running for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    Linux,
    MacOS,
    Windows,
    /// Anything else; keeps the reported OS name for messages.
    Unsupported(String),
}

impl PlatformKind {
    /// Detect the platform this binary was compiled for.
    pub fn host() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS name (as in `std::env::consts::OS`) to a platform.
    pub fn from_os(os: &str) -> Self {
        match os.to_ascii_lowercase().as_str() {
            "linux" => PlatformKind::Linux,
            "macos" | "darwin" | "osx" => PlatformKind::MacOS,
            "windows" | "win32" => PlatformKind::Windows,
            _ => PlatformKind::Unsupported(os.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, PlatformKind::Unsupported(_))
    }

    /// Suffix of executables on this platform.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            PlatformKind::Windows => ".exe",
            _ => "",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlatformKind::Linux => "linux",
            PlatformKind::MacOS => "macos",
            PlatformKind::Windows => "windows",
            PlatformKind::Unsupported(os) => os,
        }
    }
}

impl FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("platform name must not be empty".to_string());
        }
        Ok(Self::from_os(s.trim()))
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
