//! Semantic version comparison for the minimum-app-version gate.

use std::cmp::Ordering;

/// Parsed semantic version for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SemVer {
    major: u32,
    minor: u32,
    patch: u32,
    prerelease: Option<String>,
}

impl SemVer {
    /// Parse a version string into SemVer components.
    fn parse(version: &str) -> Option<Self> {
        // Remove leading 'v' if present
        let version = version.strip_prefix('v').unwrap_or(version);

        // Split by '-' to separate prerelease
        let (version_part, prerelease) = match version.split_once('-') {
            Some((v, pre)) => (v, Some(pre.to_string())),
            None => (version, None),
        };

        let parts: Vec<&str> = version_part.split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return None;
        }

        let major = parts[0].parse::<u32>().ok()?;
        let minor = parts[1].parse::<u32>().ok()?;
        let patch = if parts.len() == 3 {
            parts[2].parse::<u32>().ok()?
        } else {
            0
        };

        Some(Self {
            major,
            minor,
            patch,
            prerelease,
        })
    }
}

impl PartialOrd for SemVer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemVer {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.major.cmp(&other.major) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.minor.cmp(&other.minor) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match self.patch.cmp(&other.patch) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Prerelease versions have lower precedence than release versions
        // e.g., 1.0.0-alpha < 1.0.0
        match (&self.prerelease, &other.prerelease) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

/// Compare two version strings using semantic versioning.
///
/// Returns `None` when either string is not a valid version.
pub fn compare_versions(left: &str, right: &str) -> Option<Ordering> {
    Some(SemVer::parse(left)?.cmp(&SemVer::parse(right)?))
}

/// Check whether `current` is older than `minimum`.
///
/// An unparsable version on either side compares as not-older, so a
/// malformed server value can never brick the app into a forced update.
pub fn is_older_than(current: &str, minimum: &str) -> bool {
    matches!(compare_versions(current, minimum), Some(Ordering::Less))
}
