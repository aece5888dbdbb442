//! Wire types for the SkillsMP marketplace API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// A skill as reported by the marketplace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSkill {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub stars: u64,
    #[serde(
        default,
        alias = "relevance_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub relevance_score: Option<f64>,
    /// Unix timestamp (seconds) of the last upstream change.
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(default, alias = "github_url", skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, alias = "skill_url", skip_serializing_if = "Option::is_none")]
    pub skill_url: Option<String>,
    #[serde(default, alias = "download_url", skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(
        default,
        alias = "repository_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub repository_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    /// Fields the client does not model, kept so JSON output stays lossless.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RemoteSkill {
    /// Repository link, whichever field the API populated.
    pub fn repository(&self) -> Option<&str> {
        self.github_url
            .as_deref()
            .or(self.repository_url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    pub fn remote_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .map(str::trim)
            .filter(|version| !version.is_empty())
    }
}

/// Page of keyword search results. Ranking is the server's.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub skills: Vec<RemoteSkill>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

/// Semantic search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticResults {
    #[serde(default)]
    pub skills: Vec<RemoteSkill>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Stars,
    Recent,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stars => "stars",
            Self::Recent => "recent",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stars" => Ok(Self::Stars),
            "recent" => Ok(Self::Recent),
            other => Err(format!("unsupported sort order: {other}")),
        }
    }
}

/// Parameters of a keyword search.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortBy,
}

impl SearchQuery {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            sort_by: SortBy::Stars,
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, Self::MAX_LIMIT);
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }
}
