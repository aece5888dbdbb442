use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static GITHUB_REPO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/([^/\s]+)/([^/\s?#]+)").expect("Invalid regex"));

const ARCHIVE_SUFFIXES: [&str; 4] = [".skill", ".zip", ".tar.gz", ".tgz"];

/// Where an install reads its archive from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSource {
    Url(String),
    Path(PathBuf),
    /// Keyword search; one ranked result is installed.
    Query(String),
}

impl InstallSource {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let lower = input.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Self::Url(input.to_string());
        }
        if Path::new(input).is_file() || ARCHIVE_SUFFIXES.iter().any(|s| lower.ends_with(s)) {
            return Self::Path(PathBuf::from(input));
        }
        Self::Query(input.to_string())
    }
}

/// Latest-release download URL for a skill hosted on GitHub.
///
/// Accepts repository URLs as well as deep links such as
/// `https://github.com/owner/repo/tree/main/skills/name`.
pub fn infer_download_url(github_url: &str, skill_name: &str) -> Option<String> {
    let captures = GITHUB_REPO.captures(github_url)?;
    let owner = captures.get(1)?.as_str();
    let repo = captures.get(2)?.as_str().trim_end_matches(".git");
    if repo.is_empty() || skill_name.trim().is_empty() {
        return None;
    }
    Some(format!(
        "https://github.com/{owner}/{repo}/releases/latest/download/{}.skill",
        skill_name.trim()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urls_paths_and_queries() {
        assert_eq!(
            InstallSource::parse("https://example.com/pdf.skill"),
            InstallSource::Url("https://example.com/pdf.skill".to_string())
        );
        assert_eq!(
            InstallSource::parse("downloads/pdf.skill"),
            InstallSource::Path(PathBuf::from("downloads/pdf.skill"))
        );
        assert_eq!(
            InstallSource::parse("bundle.tar.gz"),
            InstallSource::Path(PathBuf::from("bundle.tar.gz"))
        );
        assert_eq!(
            InstallSource::parse("seo writer"),
            InstallSource::Query("seo writer".to_string())
        );
    }

    #[test]
    fn only_existing_files_are_paths() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("pdf");
        std::fs::create_dir(&dir).unwrap();
        let dir_input = dir.to_string_lossy().to_string();
        assert_eq!(
            InstallSource::parse(&dir_input),
            InstallSource::Query(dir_input.clone())
        );

        let file = temp.path().join("pdf-package");
        std::fs::write(&file, b"PK").unwrap();
        assert_eq!(
            InstallSource::parse(&file.to_string_lossy()),
            InstallSource::Path(file.clone())
        );
    }

    #[test]
    fn infers_release_url_from_repository_links() {
        assert_eq!(
            infer_download_url("https://github.com/acme/skills", "pdf").as_deref(),
            Some("https://github.com/acme/skills/releases/latest/download/pdf.skill")
        );
        assert_eq!(
            infer_download_url("https://github.com/acme/skills.git", "pdf").as_deref(),
            Some("https://github.com/acme/skills/releases/latest/download/pdf.skill")
        );
        assert_eq!(
            infer_download_url("https://github.com/acme/skills/tree/main/skills/pdf", "pdf")
                .as_deref(),
            Some("https://github.com/acme/skills/releases/latest/download/pdf.skill")
        );
        assert!(infer_download_url("https://gitlab.com/acme/skills", "pdf").is_none());
        assert!(infer_download_url("https://github.com/acme", "pdf").is_none());
    }
}
