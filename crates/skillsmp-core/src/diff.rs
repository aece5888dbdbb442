//! Field-by-field comparison of an installed skill with its marketplace record.

use serde::Serialize;
use std::path::PathBuf;

use crate::api::SkillCatalog;
use crate::error::{Result, SkillsmpError};
use crate::models::{RemoteSkill, SkillRecord};
use crate::registry::SkillRegistry;
use crate::updates::{UpdateStatus, compare_versions};

/// Characters of the description shown in a diff.
const DESCRIPTION_PREVIEW: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub local: String,
    pub remote: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillDiff {
    pub name: String,
    pub path: PathBuf,
    pub local_version: Option<String>,
    pub remote_version: Option<String>,
    pub status: UpdateStatus,
    pub stars: u64,
    pub github_url: Option<String>,
    pub skill_url: Option<String>,
    pub updated_at: Option<i64>,
    pub changes: Vec<FieldChange>,
}

impl SkillDiff {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Compare descriptor fields present on both sides.
pub fn diff_skill(local: &SkillRecord, remote: &RemoteSkill) -> SkillDiff {
    let mut changes = Vec::new();
    push_change(&mut changes, "name", Some(local.name.as_str()), Some(remote.name.as_str()));
    push_change(
        &mut changes,
        "description",
        local.description.as_deref(),
        remote.description.as_deref(),
    );
    push_change(&mut changes, "author", local.author.as_deref(), remote.author.as_deref());
    push_change(&mut changes, "version", local.version.as_deref(), remote.remote_version());

    SkillDiff {
        name: local.name.clone(),
        path: local.path.clone(),
        local_version: local.version.clone(),
        remote_version: remote.remote_version().map(str::to_string),
        status: compare_versions(local.version_str(), remote.remote_version().unwrap_or("")),
        stars: remote.stars,
        github_url: remote.repository().map(str::to_string),
        skill_url: remote.skill_url.clone(),
        updated_at: remote.updated_at,
        changes,
    }
}

/// Look up an installed skill remotely and diff it.
pub async fn diff_installed(
    catalog: &dyn SkillCatalog,
    registry: &SkillRegistry,
    name: &str,
) -> Result<SkillDiff> {
    let local = registry.find(name)?;
    let remote = catalog.find_skill(&local.name).await?.ok_or_else(|| {
        SkillsmpError::NotFound(format!("Skill '{}' not found on SkillsMP", local.name))
    })?;
    Ok(diff_skill(&local, &remote))
}

fn push_change(
    changes: &mut Vec<FieldChange>,
    field: &'static str,
    local: Option<&str>,
    remote: Option<&str>,
) {
    let local = local.map(str::trim).unwrap_or_default();
    let remote = remote.map(str::trim).unwrap_or_default();
    if !local.is_empty() && !remote.is_empty() && local != remote {
        let shown = |value: &str| match field {
            "description" => value.chars().take(DESCRIPTION_PREVIEW).collect(),
            _ => value.to_string(),
        };
        changes.push(FieldChange {
            field,
            local: shown(local),
            remote: shown(remote),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> SkillRecord {
        SkillRecord {
            name: "pdf".to_string(),
            version: Some("1.0.0".to_string()),
            path: PathBuf::from("/skills/pdf"),
            description: Some("Work with PDF files".to_string()),
            author: Some("acme".to_string()),
            tags: Vec::new(),
            modified_at: None,
        }
    }

    #[test]
    fn reports_changed_fields_and_stars() {
        let remote = RemoteSkill {
            name: "pdf".to_string(),
            description: Some("Work with PDF and DOCX files".to_string()),
            author: Some("acme-labs".to_string()),
            version: Some("1.2.0".to_string()),
            stars: 42,
            ..Default::default()
        };

        let diff = diff_skill(&local(), &remote);
        let fields: Vec<_> = diff.changes.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec!["description", "author", "version"]);
        assert_eq!(diff.stars, 42);
        assert_eq!(diff.status, UpdateStatus::Outdated);
    }

    #[test]
    fn missing_remote_fields_are_not_changes() {
        let remote = RemoteSkill {
            name: "pdf".to_string(),
            version: Some("1.0.0".to_string()),
            ..Default::default()
        };
        let diff = diff_skill(&local(), &remote);
        assert!(!diff.has_changes());
        assert_eq!(diff.status, UpdateStatus::UpToDate);
    }

    #[test]
    fn long_descriptions_are_truncated_in_changes() {
        let base = "x".repeat(DESCRIPTION_PREVIEW);
        let mut skill = local();
        skill.description = Some(format!("{base} local tail"));
        let remote = RemoteSkill {
            name: "pdf".to_string(),
            description: Some(format!("{base} remote tail")),
            ..Default::default()
        };
        let diff = diff_skill(&skill, &remote);
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].local, base);
        assert_eq!(diff.changes[0].remote, base);
    }
}
