use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::archive;
use super::source::{InstallSource, infer_download_url};
use crate::api::SkillCatalog;
use crate::error::{Result, SkillsmpError};
use crate::models::{RemoteSkill, SKILL_DESCRIPTOR, SearchQuery, SkillDescriptor, SortBy};
use crate::registry::SkillRegistry;

/// Selection of a search result when installing by query.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// 1-based rank in the search results.
    pub index: usize,
    pub page: u32,
    pub sort_by: SortBy,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            index: 1,
            page: 1,
            sort_by: SortBy::Stars,
        }
    }
}

/// A skill that has just been written into the registry.
#[derive(Debug, Clone, Serialize)]
pub struct InstalledSkill {
    pub name: String,
    pub version: Option<String>,
    pub path: PathBuf,
    /// URL or file the archive came from.
    pub source: String,
    /// True when an existing installation was replaced.
    pub replaced: bool,
}

/// What `update` would do for one installed skill.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatePlan {
    pub name: String,
    pub path: PathBuf,
    pub local_version: Option<String>,
    pub remote_version: Option<String>,
    pub download_url: String,
}

/// Unpacks archives into a registry directory.
#[derive(Debug, Clone)]
pub struct ArchiveInstaller {
    skills_dir: PathBuf,
}

impl ArchiveInstaller {
    pub fn new(registry: &SkillRegistry) -> Self {
        Self {
            skills_dir: registry.base_dir().to_path_buf(),
        }
    }

    /// Install a local `.skill`, `.zip` or `.tar.gz` file.
    pub fn install_file(&self, path: &Path) -> Result<InstalledSkill> {
        if !path.is_file() {
            return Err(SkillsmpError::NotFound(format!(
                "Skill package not found: {}",
                path.display()
            )));
        }
        let bytes = fs::read(path)?;
        self.install_bytes(&bytes, &path.display().to_string(), None)
    }

    /// Install archive bytes.
    ///
    /// The skill lands in `target`, or in a directory named after the slug of
    /// its declared name. On any error nothing is left in the registry and an
    /// existing installation at the target is kept.
    pub fn install_bytes(
        &self,
        bytes: &[u8],
        origin: &str,
        target: Option<&Path>,
    ) -> Result<InstalledSkill> {
        fs::create_dir_all(&self.skills_dir)?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.skills_dir)?;

        let kind = archive::extract(bytes, staging.path())?;
        let root = archive::locate_skill_root(staging.path())?;
        let descriptor_path = root.join(SKILL_DESCRIPTOR);
        let markdown = fs::read_to_string(&descriptor_path)?;
        let descriptor =
            SkillDescriptor::from_markdown(&descriptor_path.display().to_string(), &markdown)?;

        let target = match target {
            Some(target) => target.to_path_buf(),
            None => {
                let identifier = descriptor.identifier();
                if identifier.is_empty() {
                    return Err(SkillsmpError::Descriptor {
                        path: descriptor_path.display().to_string(),
                        reason: format!("name '{}' has no usable characters", descriptor.name),
                    });
                }
                self.skills_dir.join(identifier)
            }
        };
        debug!(?kind, target = %target.display(), "Validated skill archive");

        let replaced = swap_into_place(&root, &target)?;
        drop(staging);

        info!(skill = %descriptor.name, path = %target.display(), replaced, "Installed skill");
        Ok(InstalledSkill {
            name: descriptor.name,
            version: descriptor.version,
            path: target,
            source: origin.to_string(),
            replaced,
        })
    }
}

/// Move `staged` to `target`, replacing any existing directory.
///
/// The old directory is renamed aside first and restored if the final rename
/// fails.
fn swap_into_place(staged: &Path, target: &Path) -> Result<bool> {
    if !target.exists() {
        fs::rename(staged, target)?;
        return Ok(false);
    }

    let backup = backup_path(target);
    fs::rename(target, &backup)?;

    if let Err(err) = fs::rename(staged, target) {
        if let Err(restore_err) = fs::rename(&backup, target) {
            warn!(
                backup = %backup.display(),
                error = %restore_err,
                "Failed to restore previous installation"
            );
        }
        return Err(err.into());
    }

    if let Err(err) = fs::remove_dir_all(&backup) {
        warn!(backup = %backup.display(), error = %err, "Failed to remove backup");
    }
    Ok(true)
}

fn backup_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "skill".to_string());
    let stamp = chrono::Utc::now().timestamp_millis();
    target.with_file_name(format!(".backup-{name}-{stamp}"))
}

/// Installs and updates skills from the marketplace or from URLs.
pub struct SkillInstaller<'a> {
    catalog: &'a dyn SkillCatalog,
    registry: &'a SkillRegistry,
    archives: ArchiveInstaller,
}

impl<'a> SkillInstaller<'a> {
    pub fn new(catalog: &'a dyn SkillCatalog, registry: &'a SkillRegistry) -> Self {
        Self {
            catalog,
            registry,
            archives: ArchiveInstaller::new(registry),
        }
    }

    pub async fn install(
        &self,
        source: &InstallSource,
        options: &InstallOptions,
    ) -> Result<InstalledSkill> {
        match source {
            InstallSource::Path(path) => self.archives.install_file(path),
            InstallSource::Url(url) => self.install_url(url, None).await,
            InstallSource::Query(query) => {
                let selected = self.select_result(query, options).await?;
                let url = download_url_for(&selected).ok_or_else(|| {
                    SkillsmpError::NotFound(format!(
                        "No download URL available for '{}'",
                        selected.name
                    ))
                })?;
                info!(skill = %selected.name, %url, "Installing search result");
                self.install_url(&url, None).await
            }
        }
    }

    /// The `index`-th result (1-based) of a keyword search.
    pub async fn select_result(&self, query: &str, options: &InstallOptions) -> Result<RemoteSkill> {
        if options.index == 0 {
            return Err(SkillsmpError::Validation(
                "--index must be 1 or greater".to_string(),
            ));
        }
        // Fixed page size so `--page` addresses the same slice for any index.
        let limit = SearchQuery::DEFAULT_LIMIT;
        if options.index > limit as usize {
            return Err(SkillsmpError::NotFound(format!(
                "Result #{} not found: a results page holds at most {limit} skills",
                options.index
            )));
        }
        let search = SearchQuery::new(query)
            .page(options.page)
            .limit(limit)
            .sort_by(options.sort_by);

        let page = self.catalog.search(&search).await?;
        let found = page.skills.len();
        page.skills
            .into_iter()
            .nth(options.index - 1)
            .ok_or_else(|| {
                SkillsmpError::NotFound(format!(
                    "Result #{} not found: search for '{query}' returned {found} skill(s)",
                    options.index
                ))
            })
    }

    async fn install_url(&self, url: &str, target: Option<&Path>) -> Result<InstalledSkill> {
        let bytes = self.catalog.fetch_archive(url).await?;
        debug!(%url, size = bytes.len(), "Downloaded archive");
        self.archives.install_bytes(&bytes, url, target)
    }

    /// Work out where an update of `name` would be downloaded from.
    ///
    /// An explicit download URL wins, then one inferred from `github_url`,
    /// then the marketplace record of the skill.
    pub async fn plan_update(
        &self,
        name: &str,
        download_url: Option<&str>,
        github_url: Option<&str>,
    ) -> Result<UpdatePlan> {
        let local = self.registry.find(name)?;

        let explicit = download_url
            .map(str::to_string)
            .or_else(|| github_url.and_then(|url| infer_download_url(url, &local.name)));

        let (download_url, remote_version) = match explicit {
            Some(url) => (url, None),
            None => {
                let remote = self.catalog.find_skill(&local.name).await?.ok_or_else(|| {
                    SkillsmpError::NotFound(format!(
                        "Skill '{}' not found on the marketplace",
                        local.name
                    ))
                })?;
                let url = download_url_for(&remote).ok_or_else(|| {
                    SkillsmpError::NotFound(format!(
                        "No download URL available for '{}'; pass --download-url or --github-url",
                        local.name
                    ))
                })?;
                (url, remote.remote_version().map(str::to_string))
            }
        };

        Ok(UpdatePlan {
            name: local.name,
            path: local.path,
            local_version: local.version,
            remote_version,
            download_url,
        })
    }

    /// Replace the installed directory named in `plan`.
    pub async fn apply_update(&self, plan: &UpdatePlan) -> Result<InstalledSkill> {
        self.install_url(&plan.download_url, Some(&plan.path)).await
    }
}

fn download_url_for(skill: &RemoteSkill) -> Option<String> {
    skill
        .download_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .or_else(|| {
            skill
                .repository()
                .and_then(|repo| infer_download_url(repo, &skill.name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::archive::test_support::{descriptor, tar_gz_bytes, zip_bytes};
    use crate::models::{SearchPage, SemanticResults};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeCatalog {
        results: Vec<RemoteSkill>,
        archives: HashMap<String, Vec<u8>>,
        queries: Mutex<Vec<SearchQuery>>,
    }

    #[async_trait]
    impl SkillCatalog for FakeCatalog {
        async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
            self.queries.lock().unwrap().push(query.clone());
            let start = (query.page.saturating_sub(1) * query.limit) as usize;
            Ok(SearchPage {
                skills: self
                    .results
                    .iter()
                    .skip(start)
                    .take(query.limit as usize)
                    .cloned()
                    .collect(),
                total: self.results.len() as u64,
                page: query.page,
                limit: query.limit,
            })
        }

        async fn semantic_search(&self, _query: &str) -> Result<SemanticResults> {
            Ok(SemanticResults::default())
        }

        async fn skill_details(&self, id: &str) -> Result<RemoteSkill> {
            Err(SkillsmpError::NotFound(id.to_string()))
        }

        async fn fetch_archive(&self, url: &str) -> Result<Vec<u8>> {
            self.archives
                .get(url)
                .cloned()
                .ok_or_else(|| SkillsmpError::NotFound(url.to_string()))
        }
    }

    fn result(name: &str, version: &str) -> RemoteSkill {
        RemoteSkill {
            id: name.to_string(),
            name: name.to_string(),
            version: Some(version.to_string()),
            download_url: Some(format!("https://cdn.test/{name}.skill")),
            ..Default::default()
        }
    }

    fn three_result_catalog() -> FakeCatalog {
        let mut catalog = FakeCatalog {
            results: vec![result("alpha", "1.0.0"), result("beta", "2.0.0"), result("gamma", "3.0.0")],
            ..Default::default()
        };
        for skill in catalog.results.clone() {
            let path = format!("{}/SKILL.md", skill.name);
            let content = descriptor(&skill.name, skill.version.as_deref().unwrap());
            catalog.archives.insert(
                format!("https://cdn.test/{}.skill", skill.name),
                zip_bytes(&[(path.as_str(), content.as_str())]),
            );
        }
        catalog
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn query_index_selects_ranked_result() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path().join("skills"));
        let catalog = three_result_catalog();
        let installer = SkillInstaller::new(&catalog, &registry);

        let options = InstallOptions {
            index: 2,
            ..Default::default()
        };
        let installed = installer
            .install(&InstallSource::Query("skill".to_string()), &options)
            .await
            .unwrap();

        assert_eq!(installed.name, "beta");
        assert_eq!(installed.version.as_deref(), Some("2.0.0"));
        assert_eq!(installed.path, registry.base_dir().join("beta"));
        assert!(!installed.replaced);
        assert_eq!(entries(registry.base_dir()), vec!["beta"]);
        let record = registry.find("beta").unwrap();
        assert_eq!(record.version.as_deref(), Some("2.0.0"));

        let queries = catalog.queries.lock().unwrap();
        assert_eq!(queries[0].query, "skill");
        assert_eq!(queries[0].sort_by, SortBy::Stars);
    }

    #[tokio::test]
    async fn index_past_results_is_not_found() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path().join("skills"));
        let catalog = three_result_catalog();
        let installer = SkillInstaller::new(&catalog, &registry);

        let options = InstallOptions {
            index: 4,
            ..Default::default()
        };
        let err = installer
            .install(&InstallSource::Query("skill".to_string()), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, SkillsmpError::NotFound(_)));
        assert!(!registry.base_dir().exists());

        let options = InstallOptions {
            index: 0,
            ..Default::default()
        };
        let err = installer.select_result("skill", &options).await.unwrap_err();
        assert!(matches!(err, SkillsmpError::Validation(_)));
    }

    #[tokio::test]
    async fn later_pages_keep_a_fixed_page_size() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path().join("skills"));
        let catalog = FakeCatalog {
            results: (1..=100).map(|n| result(&format!("r{n}"), "1.0.0")).collect(),
            ..Default::default()
        };
        let installer = SkillInstaller::new(&catalog, &registry);

        for (index, expected) in [(1, "r21"), (20, "r40")] {
            let options = InstallOptions {
                index,
                page: 2,
                ..Default::default()
            };
            let selected = installer.select_result("skill", &options).await.unwrap();
            assert_eq!(selected.name, expected);
        }

        let options = InstallOptions {
            index: 21,
            page: 2,
            ..Default::default()
        };
        let err = installer.select_result("skill", &options).await.unwrap_err();
        assert!(matches!(err, SkillsmpError::NotFound(_)));

        let queries = catalog.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert!(queries.iter().all(|q| q.page == 2 && q.limit == 20));
    }

    #[tokio::test]
    async fn result_without_download_location_is_not_found() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path());
        let catalog = FakeCatalog {
            results: vec![RemoteSkill {
                name: "orphan".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = SkillInstaller::new(&catalog, &registry)
            .install(&InstallSource::Query("orphan".to_string()), &InstallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SkillsmpError::NotFound(_)));
    }

    #[test]
    fn corrupt_tar_gz_leaves_no_residue() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path());
        let installer = ArchiveInstaller::new(&registry);

        // valid gzip header followed by an invalid deflate block
        let mut bytes = vec![0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0xff];
        bytes.extend_from_slice(&[0xff; 256]);

        let err = installer.install_bytes(&bytes, "test", None).unwrap_err();
        assert!(matches!(err, SkillsmpError::Archive(_)));
        assert!(entries(temp.path()).is_empty());
    }

    #[test]
    fn invalid_zip_is_an_archive_error() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path());
        let installer = ArchiveInstaller::new(&registry);

        let mut bytes = b"PK\x03\x04".to_vec();
        bytes.extend_from_slice(b"definitely not a zip payload");
        let err = installer.install_bytes(&bytes, "test", None).unwrap_err();
        assert!(matches!(err, SkillsmpError::Archive(_)));
        assert!(entries(temp.path()).is_empty());
    }

    #[test]
    fn archive_without_descriptor_is_cleaned_up() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path());
        let installer = ArchiveInstaller::new(&registry);

        let bytes = tar_gz_bytes(&[("pdf/README.md", "no descriptor")]);
        assert!(installer.install_bytes(&bytes, "test", None).is_err());
        assert!(entries(temp.path()).is_empty());
    }

    #[test]
    fn reinstall_replaces_existing_directory() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path());
        let installer = ArchiveInstaller::new(&registry);

        let v1 = zip_bytes(&[
            ("SKILL.md", descriptor("PDF Tools", "1.0.0").as_str()),
            ("old.txt", "stale"),
        ]);
        let first = installer.install_bytes(&v1, "v1", None).unwrap();
        assert_eq!(first.path, temp.path().join("pdf-tools"));
        assert!(first.path.join("old.txt").is_file());

        let v2 = zip_bytes(&[("SKILL.md", descriptor("PDF Tools", "1.1.0").as_str())]);
        let second = installer.install_bytes(&v2, "v2", None).unwrap();
        assert!(second.replaced);
        assert_eq!(second.version.as_deref(), Some("1.1.0"));
        assert!(!second.path.join("old.txt").exists());
        assert_eq!(entries(temp.path()), vec!["pdf-tools"]);
    }

    #[test]
    fn failed_reinstall_keeps_previous_version() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path());
        let installer = ArchiveInstaller::new(&registry);

        let v1 = zip_bytes(&[("SKILL.md", descriptor("pdf", "1.0.0").as_str())]);
        installer.install_bytes(&v1, "v1", None).unwrap();

        let broken = zip_bytes(&[("SKILL.md", "no frontmatter here")]);
        assert!(installer.install_bytes(&broken, "v2", None).is_err());

        let skill = registry.find("pdf").unwrap();
        assert_eq!(skill.version.as_deref(), Some("1.0.0"));
        assert_eq!(entries(temp.path()), vec!["pdf"]);
    }

    #[test]
    fn installs_local_package_file() {
        let temp = TempDir::new().unwrap();
        let package = temp.path().join("pdf.skill");
        fs::write(&package, zip_bytes(&[("SKILL.md", descriptor("pdf", "1.0.0").as_str())])).unwrap();

        let registry = SkillRegistry::new(temp.path().join("skills"));
        let installed = ArchiveInstaller::new(&registry).install_file(&package).unwrap();
        assert_eq!(installed.name, "pdf");
        assert_eq!(installed.source, package.display().to_string());

        let missing = ArchiveInstaller::new(&registry).install_file(&temp.path().join("nope.skill"));
        assert!(matches!(missing, Err(SkillsmpError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_reinstalls_into_existing_directory() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path());
        let legacy = temp.path().join("my-legacy-dir");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("SKILL.md"), descriptor("beta", "1.0.0")).unwrap();

        let catalog = three_result_catalog();
        let installer = SkillInstaller::new(&catalog, &registry);

        let plan = installer.plan_update("BETA", None, None).await.unwrap();
        assert_eq!(plan.path, legacy);
        assert_eq!(plan.download_url, "https://cdn.test/beta.skill");
        assert_eq!(plan.remote_version.as_deref(), Some("2.0.0"));

        let installed = installer.apply_update(&plan).await.unwrap();
        assert!(installed.replaced);
        assert_eq!(installed.path, legacy);
        assert_eq!(registry.find("beta").unwrap().version.as_deref(), Some("2.0.0"));
        assert_eq!(entries(temp.path()), vec!["my-legacy-dir"]);
    }

    #[tokio::test]
    async fn update_plan_prefers_explicit_urls() {
        let temp = TempDir::new().unwrap();
        let registry = SkillRegistry::new(temp.path());
        let dir = temp.path().join("pdf");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("SKILL.md"), descriptor("pdf", "1.0.0")).unwrap();

        let catalog = FakeCatalog::default();
        let installer = SkillInstaller::new(&catalog, &registry);

        let plan = installer
            .plan_update("pdf", Some("https://example.com/pdf.zip"), None)
            .await
            .unwrap();
        assert_eq!(plan.download_url, "https://example.com/pdf.zip");

        let plan = installer
            .plan_update("pdf", None, Some("https://github.com/acme/tools"))
            .await
            .unwrap();
        assert_eq!(
            plan.download_url,
            "https://github.com/acme/tools/releases/latest/download/pdf.skill"
        );
        assert!(catalog.queries.lock().unwrap().is_empty());

        let err = installer.plan_update("pdf", None, None).await.unwrap_err();
        assert!(matches!(err, SkillsmpError::NotFound(_)));
        assert!(matches!(
            installer.plan_update("missing", None, None).await,
            Err(SkillsmpError::NotFound(_))
        ));
    }
}
