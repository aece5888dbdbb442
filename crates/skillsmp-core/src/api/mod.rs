//! Access to the SkillsMP marketplace.

mod client;
mod lazy;

pub use client::{BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, SkillsmpClient};
pub use lazy::LazyCatalog;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{RemoteSkill, SearchPage, SearchQuery, SemanticResults, SortBy};

/// Number of candidates fetched when resolving an installed skill remotely.
const LOOKUP_LIMIT: u32 = 5;

/// Remote source of skills. Implemented by the HTTP client and by test doubles.
#[async_trait]
pub trait SkillCatalog: Send + Sync {
    /// Keyword search, `GET /skills/search`.
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage>;

    /// Semantic search, `GET /skills/ai-search`.
    async fn semantic_search(&self, query: &str) -> Result<SemanticResults>;

    /// Full record of a single skill.
    async fn skill_details(&self, id: &str) -> Result<RemoteSkill>;

    /// Download a packaged skill.
    async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>>;

    /// Find the marketplace record for an installed skill name.
    ///
    /// An exact case-insensitive name match wins; otherwise the best ranked
    /// result is returned.
    async fn find_skill(&self, name: &str) -> Result<Option<RemoteSkill>> {
        let query = SearchQuery::new(name)
            .limit(LOOKUP_LIMIT)
            .sort_by(SortBy::Stars);
        let page = self.search(&query).await?;
        Ok(best_match(name, page.skills))
    }
}

fn best_match(name: &str, skills: Vec<RemoteSkill>) -> Option<RemoteSkill> {
    let wanted = name.to_lowercase();
    if let Some(position) = skills
        .iter()
        .position(|skill| skill.name.to_lowercase() == wanted)
    {
        return skills.into_iter().nth(position);
    }
    skills.into_iter().next()
}
