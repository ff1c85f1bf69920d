//! Toolchain location probing.
//!
//! The Qt SDK can live in several places depending on how it was installed
//! (online installer under the home directory, distro packages, Homebrew).
//! Candidates are tried in list order and the first existing path is handed
//! to CMake as `CMAKE_PREFIX_PATH`. When nothing matches, CMake's own package
//! discovery is left to find Qt.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::dependency::QT_SDK_VERSION;
use crate::core::platform::PlatformKind;
use crate::util::config::ToolchainConfig;

/// Environment variable holding the user's home directory.
pub const HOME_VAR: &str = "HOME";

/// One place a toolchain might be installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidatePath {
    /// A fixed path.
    Literal(PathBuf),
    /// A path under the directory named by an environment variable.
    EnvRelative { var: String, rest: PathBuf },
}

impl CandidatePath {
    /// Parse a path template.
    ///
    /// `$VAR/rest`, `${VAR}/rest` and `~/rest` (meaning `$HOME/rest`) are
    /// environment-relative; anything else is literal.
    pub fn parse(template: &str) -> Self {
        if let Some(rest) = template
            .strip_prefix("~/")
            .or_else(|| template.strip_prefix("~\\"))
        {
            return CandidatePath::EnvRelative {
                var: HOME_VAR.to_string(),
                rest: PathBuf::from(rest),
            };
        }

        if let Some(after) = template.strip_prefix('$') {
            let (var, rest) = if let Some(braced) = after.strip_prefix('{') {
                match braced.split_once('}') {
                    Some((var, rest)) => (var, rest),
                    None => return CandidatePath::Literal(PathBuf::from(template)),
                }
            } else {
                match after.find(['/', '\\']) {
                    Some(idx) => after.split_at(idx),
                    None => (after, ""),
                }
            };
            let rest = rest.trim_start_matches(['/', '\\']);
            return CandidatePath::EnvRelative {
                var: var.to_string(),
                rest: PathBuf::from(rest),
            };
        }

        CandidatePath::Literal(PathBuf::from(template))
    }

    /// Path relative to the home directory.
    pub fn home(rest: impl Into<PathBuf>) -> Self {
        CandidatePath::EnvRelative {
            var: HOME_VAR.to_string(),
            rest: rest.into(),
        }
    }

    /// Expand the template. An unset or empty variable yields `None`.
    pub fn resolve<F>(&self, env: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            CandidatePath::Literal(path) => Some(path.clone()),
            CandidatePath::EnvRelative { var, rest } => {
                let base = env(var).filter(|v| !v.is_empty())?;
                Some(Path::new(&base).join(rest))
            }
        }
    }
}

impl fmt::Display for CandidatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidatePath::Literal(path) => write!(f, "{}", path.display()),
            CandidatePath::EnvRelative { var, rest } => write!(f, "${}/{}", var, rest.display()),
        }
    }
}

/// First candidate that exists, using the process environment.
pub fn locate(candidates: &[CandidatePath]) -> Option<PathBuf> {
    locate_with(candidates, |var| std::env::var(var).ok())
}

/// First candidate that exists, resolving variables through `env`.
pub fn locate_with<F>(candidates: &[CandidatePath], env: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    for candidate in candidates {
        let Some(path) = candidate.resolve(&env) else {
            tracing::debug!("skipping {}: variable not set", candidate);
            continue;
        };
        if path.exists() {
            tracing::debug!("found toolchain at {}", path.display());
            return Some(path);
        }
    }
    None
}

/// Built-in Qt locations for a platform, highest priority first.
pub fn default_qt_candidates(platform: &PlatformKind) -> Vec<CandidatePath> {
    let sdk = Path::new("Qt").join(QT_SDK_VERSION);
    match platform {
        PlatformKind::Linux => vec![
            CandidatePath::home(sdk.join("gcc_64")),
            CandidatePath::Literal(Path::new("/opt").join(&sdk).join("gcc_64")),
            CandidatePath::Literal(PathBuf::from("/usr/lib/x86_64-linux-gnu/cmake/Qt6")),
            CandidatePath::Literal(PathBuf::from("/usr/lib/qt6")),
        ],
        PlatformKind::MacOS => vec![
            CandidatePath::home(sdk.join("macos")),
            CandidatePath::Literal(PathBuf::from("/opt/homebrew/opt/qt")),
            CandidatePath::Literal(PathBuf::from("/usr/local/opt/qt")),
        ],
        PlatformKind::Windows => vec![
            CandidatePath::home(sdk.join("msvc2022_64")),
            CandidatePath::Literal(Path::new("C:\\").join(&sdk).join("msvc2022_64")),
            CandidatePath::Literal(Path::new("C:\\").join(&sdk).join("mingw_64")),
        ],
        PlatformKind::Unsupported(_) => Vec::new(),
    }
}

/// Qt candidates from configuration, or the built-in list.
pub fn qt_candidates(config: &ToolchainConfig, platform: &PlatformKind) -> Vec<CandidatePath> {
    match &config.qt_candidates {
        Some(templates) => templates.iter().map(|t| CandidatePath::parse(t)).collect(),
        None => default_qt_candidates(platform),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_first_existing_candidate_in_list_order() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        let c = tmp.path().join("c");
        fs::create_dir(&b).unwrap();

        let candidates = vec![
            CandidatePath::Literal(a.clone()),
            CandidatePath::Literal(b.clone()),
            CandidatePath::Literal(c.clone()),
        ];
        assert_eq!(locate_with(&candidates, no_env), Some(b.clone()));

        // Both exist: declaration order decides, not directory order.
        fs::create_dir(&c).unwrap();
        let reversed = vec![
            CandidatePath::Literal(c.clone()),
            CandidatePath::Literal(b.clone()),
        ];
        assert_eq!(locate_with(&reversed, no_env), Some(c));
    }

    #[test]
    fn test_no_candidate_exists() {
        let tmp = TempDir::new().unwrap();
        let candidates = vec![
            CandidatePath::Literal(tmp.path().join("x")),
            CandidatePath::Literal(tmp.path().join("y")),
        ];
        assert_eq!(locate_with(&candidates, no_env), None);
        assert_eq!(locate_with(&[], no_env), None);
    }

    #[test]
    fn test_unset_variable_means_absent() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("Qt/6.9.0/gcc_64")).unwrap();
        let fallback = tmp.path().join("fallback");
        fs::create_dir(&fallback).unwrap();

        let candidates = vec![
            CandidatePath::home("Qt/6.9.0/gcc_64"),
            CandidatePath::Literal(fallback.clone()),
        ];

        assert_eq!(locate_with(&candidates, no_env), Some(fallback.clone()));
        assert_eq!(
            locate_with(&candidates, |_| Some(String::new())),
            Some(fallback)
        );

        let home = tmp.path().display().to_string();
        assert_eq!(
            locate_with(&candidates, |var| (var == HOME_VAR).then(|| home.clone())),
            Some(tmp.path().join("Qt/6.9.0/gcc_64"))
        );
    }

    #[test]
    fn test_parse_templates() {
        assert_eq!(
            CandidatePath::parse("~/Qt/6.9.0/gcc_64"),
            CandidatePath::home("Qt/6.9.0/gcc_64")
        );
        assert_eq!(
            CandidatePath::parse("$QT_ROOT/6.9.0"),
            CandidatePath::EnvRelative {
                var: "QT_ROOT".to_string(),
                rest: PathBuf::from("6.9.0"),
            }
        );
        assert_eq!(
            CandidatePath::parse("${HOME}/Qt"),
            CandidatePath::home("Qt")
        );
        assert_eq!(
            CandidatePath::parse("/usr/lib/qt6"),
            CandidatePath::Literal(PathBuf::from("/usr/lib/qt6"))
        );
    }

    #[test]
    fn test_configured_candidates_replace_defaults() {
        let config = ToolchainConfig {
            qt_candidates: Some(vec!["/opt/qt".to_string()]),
        };
        assert_eq!(
            qt_candidates(&config, &PlatformKind::Linux),
            vec![CandidatePath::Literal(PathBuf::from("/opt/qt"))]
        );
        assert_eq!(
            qt_candidates(&ToolchainConfig::default(), &PlatformKind::MacOS)[0],
            CandidatePath::home("Qt/6.9.0/macos")
        );
        assert!(default_qt_candidates(&PlatformKind::Unsupported("aix".into())).is_empty());
    }
}
