use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, SkillsmpError};

/// File name of the descriptor every installed skill carries.
pub const SKILL_DESCRIPTOR: &str = "SKILL.md";

/// Frontmatter of a `SKILL.md` descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub name: String,
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// YAML reads `version: 2` as a number; keep its text.
fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

impl SkillDescriptor {
    /// Parse the YAML frontmatter at the top of a markdown descriptor.
    pub fn from_markdown(path: &str, markdown: &str) -> Result<Self> {
        let invalid = |reason: &str| SkillsmpError::Descriptor {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let markdown = markdown.trim_start_matches('\u{feff}');
        if !markdown.starts_with("---") {
            return Err(invalid("missing frontmatter"));
        }

        let rest = &markdown[3..];
        let end_index = rest
            .find("\n---")
            .ok_or_else(|| invalid("frontmatter not closed"))?;
        let frontmatter = rest[..end_index].trim();

        let descriptor: SkillDescriptor =
            serde_yaml::from_str(frontmatter).map_err(|e| invalid(&e.to_string()))?;

        if descriptor.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }

        Ok(Self {
            name: descriptor.name.trim().to_string(),
            version: descriptor
                .version
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            ..descriptor
        })
    }

    /// Directory name the skill is installed under.
    pub fn identifier(&self) -> String {
        slugify(&self.name)
    }
}

/// An installed skill as found on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub name: String,
    pub version: Option<String>,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Last modification of the skill directory, Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<i64>,
}

impl SkillRecord {
    pub fn from_descriptor(descriptor: SkillDescriptor, path: PathBuf) -> Self {
        Self {
            name: descriptor.name,
            version: descriptor.version,
            path,
            description: descriptor.description,
            author: descriptor.author,
            tags: descriptor.tags,
            modified_at: None,
        }
    }

    /// Cache key for this skill.
    pub fn id(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn version_str(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }
}

/// Lowercase slug restricted to `[a-z0-9-]`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
