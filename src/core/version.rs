//! Dotted numeric versions and the minimum-version policy.
//!
//! Versions reported by pkg-config, Homebrew and Chocolatey are plain dotted
//! numbers ("4.6.0", "6.9", "4.10.0.20240611"), so they are compared as
//! integer tuples padded with zeros rather than as semver.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Error parsing a version string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version `{input}`: {reason}")]
pub struct VersionParseError {
    pub input: String,
    pub reason: String,
}

/// A dotted numeric version.
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<u64>,
}

impl Version {
    pub fn components(&self) -> &[u64] {
        &self.components
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionParseError {
                input: s.to_string(),
                reason: "empty version".to_string(),
            });
        }

        let components = trimmed
            .split('.')
            .map(|part| {
                let not_a_number = || VersionParseError {
                    input: s.to_string(),
                    reason: format!("`{}` is not a number", part),
                };
                // u64::from_str would accept a leading `+`
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(not_a_number());
                }
                part.parse::<u64>().map_err(|_| not_a_number())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Version { components })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let a = self.components.get(i).copied().unwrap_or(0);
            let b = other.components.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// "4.5" == "4.5.0"
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Whether `observed` is at least `minimum`.
pub fn satisfies(observed: &str, minimum: &str) -> Result<bool, VersionParseError> {
    let observed: Version = observed.parse()?;
    let minimum: Version = minimum.parse()?;
    Ok(observed >= minimum)
}

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)+").expect("version regex is valid"));

/// Pull the first dotted number out of tool output.
///
/// `opencv 4.10.0_12` → `4.10.0`, `6.9.0\n` → `6.9.0`.
pub fn extract_version(text: &str) -> Option<String> {
    VERSION_RE.find(text).map(|m| m.as_str().to_string())
}
