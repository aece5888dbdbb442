use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Outcome of comparing an installed version with the marketplace's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Outdated,
    UpToDate,
    Unknown,
}

impl UpdateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outdated => "outdated",
            Self::UpToDate => "up_to_date",
            Self::Unknown => "unknown",
        }
    }
}

/// Dot-separated numeric version with an optional prerelease tag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NumericVersion {
    core: Vec<u64>,
    prerelease: Option<String>,
}

impl NumericVersion {
    fn parse(version: &str) -> Option<Self> {
        // Split off build metadata first
        let without_build = version
            .split_once('+')
            .map(|(left, _)| left)
            .unwrap_or(version);

        let (core, prerelease) = match without_build.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return None,
            None => (without_build, None),
        };

        let core = core
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        Some(Self { core, prerelease })
    }

    fn padded_core(&self, len: usize) -> Vec<u64> {
        let mut core = self.core.clone();
        core.resize(len, 0);
        core
    }

    /// `None` when the two versions do not share a comparable shape.
    fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.prerelease.is_none() && other.prerelease.is_none() {
            let len = self.core.len().max(other.core.len());
            return Some(self.padded_core(len).cmp(&other.padded_core(len)));
        }

        if self.core.len() != other.core.len() {
            return None;
        }

        let core_cmp = self.core.cmp(&other.core);
        if core_cmp != Ordering::Equal {
            return Some(core_cmp);
        }
        // A prerelease sorts below the release of the same core.
        Some(match (&self.prerelease, &other.prerelease) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => compare_prerelease(a, b),
        })
    }
}

/// Identifier-wise prerelease ordering: numeric identifiers compare by value
/// and sort below alphanumeric ones; a shorter matching prefix sorts first.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        let ord = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match (x.parse::<u64>(), y.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => x.cmp(y),
            },
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn normalize(version: &str) -> &str {
    let version = version.trim();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(version)
}

/// Classify an installed version against the latest remote version.
///
/// An empty remote version means the lookup produced nothing to compare.
/// Numeric versions are ordered component-wise; free-form versions only
/// report whether they differ; a numeric version never compares with a
/// free-form one.
pub fn compare_versions(local: &str, remote: &str) -> UpdateStatus {
    let remote = normalize(remote);
    if remote.is_empty() {
        return UpdateStatus::Unknown;
    }

    let local = normalize(local);
    if local == remote {
        return UpdateStatus::UpToDate;
    }

    match (NumericVersion::parse(local), NumericVersion::parse(remote)) {
        (Some(local), Some(remote)) => match local.compare(&remote) {
            Some(Ordering::Less) => UpdateStatus::Outdated,
            Some(_) => UpdateStatus::UpToDate,
            None => UpdateStatus::Unknown,
        },
        (None, None) if !local.is_empty() => UpdateStatus::Outdated,
        _ => UpdateStatus::Unknown,
    }
}
