use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::cache::{CacheEntry, UpdateCache};
use super::version::{UpdateStatus, compare_versions};
use crate::api::SkillCatalog;
use crate::error::Result;
use crate::models::SkillRecord;
use crate::registry::SkillRegistry;

/// Pause between consecutive remote lookups.
const DEFAULT_LOOKUP_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Ignore cache freshness for every skill in this run.
    pub force: bool,
    pub lookup_delay: Duration,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            force: false,
            lookup_delay: DEFAULT_LOOKUP_DELAY,
        }
    }
}

/// Result of checking one installed skill.
#[derive(Debug, Clone, Serialize)]
pub struct SkillCheck {
    pub name: String,
    pub path: PathBuf,
    pub local_version: Option<String>,
    pub remote_version: Option<String>,
    pub status: UpdateStatus,
    pub stars: u64,
    pub github_url: Option<String>,
    pub skill_url: Option<String>,
    /// Unix seconds of the remote data this result is based on.
    pub checked_at: i64,
    /// True when the remote data came from the cache.
    pub cached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingSkill {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillCheckError {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReport {
    pub updates: Vec<SkillCheck>,
    pub up_to_date: Vec<SkillCheck>,
    pub unknown: Vec<SkillCheck>,
    pub not_found: Vec<MissingSkill>,
    pub errors: Vec<SkillCheckError>,
}

impl UpdateReport {
    pub fn total_checked(&self) -> usize {
        self.updates.len() + self.up_to_date.len() + self.unknown.len()
    }

    pub fn from_cache_count(&self) -> usize {
        self.updates
            .iter()
            .chain(&self.up_to_date)
            .chain(&self.unknown)
            .filter(|check| check.cached)
            .count()
    }

    fn push(&mut self, check: SkillCheck) {
        match check.status {
            UpdateStatus::Outdated => self.updates.push(check),
            UpdateStatus::UpToDate => self.up_to_date.push(check),
            UpdateStatus::Unknown => self.unknown.push(check),
        }
    }
}

/// Runs the update-check workflow over a registry.
pub struct UpdateChecker<'a> {
    catalog: &'a dyn SkillCatalog,
    registry: &'a SkillRegistry,
    options: CheckOptions,
}

impl<'a> UpdateChecker<'a> {
    pub fn new(catalog: &'a dyn SkillCatalog, registry: &'a SkillRegistry, options: CheckOptions) -> Self {
        Self {
            catalog,
            registry,
            options,
        }
    }

    /// Check every installed skill.
    ///
    /// The cache is taken by value and handed back updated; the caller
    /// persists it only when the run succeeds. Credential and transport
    /// failures abort the run, other lookup failures are reported per skill.
    pub async fn run(&self, mut cache: UpdateCache) -> Result<(UpdateReport, UpdateCache)> {
        let skills = self.registry.list_sorted()?;
        let mut report = UpdateReport::default();
        let mut remote_lookups = 0usize;

        info!(count = skills.len(), force = self.options.force, "Checking installed skills for updates");

        for skill in skills {
            let id = skill.id();

            if !cache.needs_check(&id, self.options.force)
                && let Some(entry) = cache.get(&id)
            {
                debug!(skill = %skill.name, "Using cached update result");
                report.push(Self::classify(&skill, entry, true));
                continue;
            }

            if remote_lookups > 0 && !self.options.lookup_delay.is_zero() {
                tokio::time::sleep(self.options.lookup_delay).await;
            }
            remote_lookups += 1;

            match self.catalog.find_skill(&skill.name).await {
                Ok(Some(remote)) => {
                    let entry = CacheEntry::from_remote(&remote, Utc::now().timestamp());
                    let check = Self::classify(&skill, &entry, false);
                    cache.insert(&id, entry);
                    report.push(check);
                }
                Ok(None) => {
                    debug!(skill = %skill.name, "Skill not found on marketplace");
                    report.not_found.push(MissingSkill {
                        name: skill.name,
                        path: skill.path,
                    });
                }
                Err(err) if err.is_fatal_for_batch() => return Err(err),
                Err(err) => {
                    warn!(skill = %skill.name, error = %err, "Update lookup failed");
                    report.errors.push(SkillCheckError {
                        name: skill.name,
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok((report, cache))
    }

    fn classify(skill: &SkillRecord, entry: &CacheEntry, cached: bool) -> SkillCheck {
        let status = compare_versions(
            skill.version_str(),
            entry.remote_version.as_deref().unwrap_or(""),
        );
        SkillCheck {
            name: skill.name.clone(),
            path: skill.path.clone(),
            local_version: skill.version.clone(),
            remote_version: entry.remote_version.clone(),
            status,
            stars: entry.rating,
            github_url: entry.github_url.clone(),
            skill_url: entry.skill_url.clone(),
            checked_at: entry.last_checked,
            cached,
        }
    }
}
