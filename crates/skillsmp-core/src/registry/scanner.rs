use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{Result, SkillsmpError};
use crate::models::{SKILL_DESCRIPTOR, SkillDescriptor, SkillRecord};

/// Directory holding one subdirectory per installed skill.
#[derive(Debug, Clone)]
pub struct SkillRegistry {
    base_dir: PathBuf,
}

impl SkillRegistry {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Installed skills in directory enumeration order.
    ///
    /// Subdirectories without a readable descriptor are skipped.
    pub fn list_installed(&self) -> Result<Vec<SkillRecord>> {
        let mut skills = Vec::new();
        if !self.base_dir.exists() {
            return Ok(skills);
        }

        for entry in WalkDir::new(&self.base_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable registry entry");
                    continue;
                }
            };
            if !entry.file_type().is_dir() || is_hidden(entry.path()) {
                continue;
            }

            match Self::load_skill_folder(entry.path()) {
                Ok(Some(skill)) => skills.push(skill),
                Ok(None) => {}
                Err(err) => warn!(path = %entry.path().display(), error = %err, "Skipping skill folder"),
            }
        }

        Ok(skills)
    }

    /// Installed skills sorted by name, for deterministic output.
    pub fn list_sorted(&self) -> Result<Vec<SkillRecord>> {
        let mut skills = self.list_installed()?;
        skills.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(skills)
    }

    /// Find an installed skill by its declared name, case-insensitively.
    pub fn find(&self, name: &str) -> Result<SkillRecord> {
        let wanted = name.to_lowercase();
        self.list_installed()?
            .into_iter()
            .find(|skill| skill.name.to_lowercase() == wanted)
            .ok_or_else(|| SkillsmpError::NotFound(format!("Skill '{name}' not found locally")))
    }

    /// Read one skill folder. `Ok(None)` when it has no descriptor.
    pub fn load_skill_folder(folder_path: &Path) -> Result<Option<SkillRecord>> {
        let descriptor_path = folder_path.join(SKILL_DESCRIPTOR);
        if !descriptor_path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&descriptor_path)?;
        let descriptor =
            SkillDescriptor::from_markdown(&descriptor_path.to_string_lossy(), &content)?;

        let mut record = SkillRecord::from_descriptor(descriptor, folder_path.to_path_buf());
        record.modified_at = std::fs::metadata(folder_path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|duration| duration.as_secs() as i64);
        Ok(Some(record))
    }
}

/// Staging and backup directories start with a dot.
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_skill(base: &Path, dir: &str, descriptor: &str) {
        let folder = base.join(dir);
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join(SKILL_DESCRIPTOR), descriptor).unwrap();
    }

    #[test]
    fn lists_skills_with_descriptors() {
        let temp = TempDir::new().unwrap();
        write_skill(
            temp.path(),
            "zeta",
            "---\nname: Zeta\nversion: 1.0.0\nauthor: Z\n---\n# Zeta",
        );
        write_skill(temp.path(), "alpha", "---\nname: alpha\n---\n# Alpha");

        let registry = SkillRegistry::new(temp.path());
        let skills = registry.list_sorted().unwrap();

        assert_eq!(skills.len(), 2);
        assert_eq!(skills[0].name, "alpha");
        assert_eq!(skills[0].version, None);
        assert_eq!(skills[1].name, "Zeta");
        assert_eq!(skills[1].version.as_deref(), Some("1.0.0"));
        assert_eq!(skills[1].author.as_deref(), Some("Z"));
        assert_eq!(skills[1].path, temp.path().join("zeta"));
        assert!(skills[1].modified_at.is_some());
    }

    #[test]
    fn skips_folders_without_readable_descriptor() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "good", "---\nname: good\n---\n");
        write_skill(temp.path(), "broken", "no frontmatter here");
        std::fs::create_dir_all(temp.path().join("empty")).unwrap();
        std::fs::write(temp.path().join("stray.txt"), "x").unwrap();
        write_skill(temp.path(), ".staging-abc", "---\nname: partial\n---\n");

        let skills = SkillRegistry::new(temp.path()).list_installed().unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "good");
    }

    #[test]
    fn missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path().join("does-not-exist"));
        assert!(registry.list_installed().unwrap().is_empty());
    }

    #[test]
    fn finds_by_name_case_insensitively() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "pdf", "---\nname: PDF-Tools\n---\n");

        let registry = SkillRegistry::new(temp.path());
        assert_eq!(registry.find("pdf-tools").unwrap().name, "PDF-Tools");
        assert!(matches!(
            registry.find("nope"),
            Err(SkillsmpError::NotFound(_))
        ));
    }
}
