//! On-disk cache of update-check results.
//!
//! The file is read once per run and rewritten once at the end of a
//! successful run. Concurrent runs are not coordinated; the last writer wins.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::RemoteSkill;

/// A cached result is reused for this many seconds.
pub const FRESHNESS_WINDOW_SECS: i64 = 3600;

const CACHE_FORMAT_VERSION: u32 = 1;

/// Last known marketplace state of one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unix seconds of the last successful remote check.
    pub last_checked: i64,
    pub remote_version: Option<String>,
    pub rating: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_url: Option<String>,
}

impl CacheEntry {
    pub fn from_remote(remote: &RemoteSkill, checked_at: i64) -> Self {
        Self {
            last_checked: checked_at,
            remote_version: remote.remote_version().map(str::to_string),
            rating: remote.stars,
            github_url: remote.repository().map(str::to_string),
            skill_url: remote.skill_url.clone(),
        }
    }

    pub fn is_fresh_at(&self, now: i64) -> bool {
        now - self.last_checked < FRESHNESS_WINDOW_SECS
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
}

/// Update-check results keyed by skill identifier.
#[derive(Debug, Clone)]
pub struct UpdateCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl UpdateCache {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the cache file. A missing or unreadable file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %err, "Ignoring unreadable update cache");
                }
                return Self::empty(path);
            }
        };

        match serde_json::from_str::<CacheFile>(&content) {
            Ok(file) => {
                debug!(path = %path.display(), entries = file.entries.len(), "Loaded update cache");
                Self {
                    path,
                    entries: file.entries,
                }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring corrupt update cache");
                Self::empty(path)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, skill_id: &str) -> Option<&CacheEntry> {
        self.entries.get(skill_id)
    }

    pub fn entries(&self) -> &BTreeMap<String, CacheEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `skill_id` needs a remote lookup now.
    pub fn needs_check(&self, skill_id: &str, force: bool) -> bool {
        self.needs_check_at(skill_id, force, Utc::now().timestamp())
    }

    pub fn needs_check_at(&self, skill_id: &str, force: bool, now: i64) -> bool {
        if force {
            return true;
        }
        match self.entries.get(skill_id) {
            Some(entry) => !entry.is_fresh_at(now),
            None => true,
        }
    }

    pub fn record(
        &mut self,
        skill_id: &str,
        remote_version: Option<String>,
        rating: u64,
        timestamp: i64,
    ) {
        self.insert(
            skill_id,
            CacheEntry {
                last_checked: timestamp,
                remote_version,
                rating,
                github_url: None,
                skill_url: None,
            },
        );
    }

    /// Overwrite the entry for `skill_id`.
    pub fn insert(&mut self, skill_id: &str, entry: CacheEntry) {
        self.entries.insert(skill_id.to_string(), entry);
    }

    /// Write the cache atomically: a temporary file in the same directory is
    /// renamed over the old one, so readers never see a torn file.
    pub fn persist(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(&json)?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "Persisted update cache");
        Ok(())
    }
}
