use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::SkillCatalog;
use crate::error::Result;
use crate::models::{RemoteSkill, SearchPage, SearchQuery, SemanticResults};

/// Catalog built on first use.
///
/// Commands that may finish from local state alone (an empty registry, a
/// fully fresh update cache) wrap the client in this so a missing
/// credential only fails the run once a remote call is made.
pub struct LazyCatalog<C, F> {
    cell: OnceCell<C>,
    init: F,
}

impl<C, F> LazyCatalog<C, F>
where
    C: SkillCatalog,
    F: Fn() -> Result<C> + Send + Sync,
{
    pub fn new(init: F) -> Self {
        Self {
            cell: OnceCell::new(),
            init,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    async fn inner(&self) -> Result<&C> {
        self.cell.get_or_try_init(|| async { (self.init)() }).await
    }
}

#[async_trait]
impl<C, F> SkillCatalog for LazyCatalog<C, F>
where
    C: SkillCatalog,
    F: Fn() -> Result<C> + Send + Sync,
{
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        self.inner().await?.search(query).await
    }

    async fn semantic_search(&self, query: &str) -> Result<SemanticResults> {
        self.inner().await?.semantic_search(query).await
    }

    async fn skill_details(&self, id: &str) -> Result<RemoteSkill> {
        self.inner().await?.skill_details(id).await
    }

    async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>> {
        self.inner().await?.fetch_archive(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkillsmpError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticCatalog;

    #[async_trait]
    impl SkillCatalog for StaticCatalog {
        async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
            Ok(SearchPage {
                page: query.page,
                limit: query.limit,
                ..Default::default()
            })
        }

        async fn semantic_search(&self, _query: &str) -> Result<SemanticResults> {
            Ok(SemanticResults::default())
        }

        async fn skill_details(&self, id: &str) -> Result<RemoteSkill> {
            Ok(RemoteSkill {
                id: id.to_string(),
                ..Default::default()
            })
        }

        async fn fetch_archive(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn builds_inner_catalog_once_on_first_call() {
        let builds = AtomicUsize::new(0);
        let catalog = LazyCatalog::new(|| {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok(StaticCatalog)
        });
        assert!(!catalog.is_initialized());
        assert_eq!(builds.load(Ordering::SeqCst), 0);

        catalog.search(&SearchQuery::new("pdf")).await.unwrap();
        let skill = catalog.skill_details("pdf-1").await.unwrap();
        assert_eq!(skill.id, "pdf-1");
        assert!(catalog.is_initialized());
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn init_failure_surfaces_on_use() {
        let catalog: LazyCatalog<StaticCatalog, _> =
            LazyCatalog::new(|| {
                Err(SkillsmpError::MissingCredential {
                    dev_file: "api_key_real.txt".to_string(),
                    template_file: "api_key.txt".to_string(),
                })
            });
        assert!(!catalog.is_initialized());

        let err = catalog.search(&SearchQuery::new("pdf")).await.unwrap_err();
        assert!(matches!(err, SkillsmpError::MissingCredential { .. }));
        assert!(!catalog.is_initialized());
    }
}
