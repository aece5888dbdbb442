//! API key resolution.
//!
//! Sources are consulted in order and the first one yielding a key wins:
//! explicit value, environment variable, config file, development secret
//! file, template file.

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Result, SkillsmpError};
use crate::paths;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "SKILLSMP_API_KEY";

/// Placeholder shipped in the template key file.
const TEMPLATE_PLACEHOLDER: &str = "your_api_key_here";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Explicit,
    Environment,
    ConfigFile,
    DevSecretFile,
    TemplateFile,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Explicit => "command line",
            Self::Environment => "environment",
            Self::ConfigFile => "config file",
            Self::DevSecretFile => "development secret file",
            Self::TemplateFile => "template file",
        };
        f.write_str(label)
    }
}

/// Bearer token for the marketplace API.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential {
    key: String,
    source: CredentialSource,
}

impl ApiCredential {
    pub fn new(key: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            key: key.into(),
            source,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("key", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// One place an API key may come from.
pub trait CredentialProvider {
    fn source(&self) -> CredentialSource;

    fn resolve(&self) -> Option<String>;
}

/// A value supplied directly, e.g. `--api-key` or the config file.
pub struct StaticProvider {
    value: Option<String>,
    source: CredentialSource,
}

impl StaticProvider {
    pub fn new(value: Option<String>, source: CredentialSource) -> Self {
        Self { value, source }
    }
}

impl CredentialProvider for StaticProvider {
    fn source(&self) -> CredentialSource {
        self.source
    }

    fn resolve(&self) -> Option<String> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}

pub struct EnvProvider {
    var: String,
}

impl EnvProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvProvider {
    fn source(&self) -> CredentialSource {
        CredentialSource::Environment
    }

    fn resolve(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// A key stored in a local text file.
pub struct FileProvider {
    path: PathBuf,
    source: CredentialSource,
}

impl FileProvider {
    pub fn dev_secret(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: CredentialSource::DevSecretFile,
        }
    }

    pub fn template(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: CredentialSource::TemplateFile,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl CredentialProvider for FileProvider {
    fn source(&self) -> CredentialSource {
        self.source
    }

    fn resolve(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let key = content.trim();
        if key.is_empty() || key.starts_with('#') {
            return None;
        }
        if self.source == CredentialSource::TemplateFile && key.contains(TEMPLATE_PLACEHOLDER) {
            debug!(path = %self.path.display(), "Template key file still holds the placeholder");
            return None;
        }
        Some(key.to_string())
    }
}

/// Ordered list of credential providers; the first hit wins.
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
    dev_file: PathBuf,
    template_file: PathBuf,
}

impl CredentialChain {
    /// Build the standard chain: explicit > env > config > dev file > template.
    pub fn standard(explicit: Option<String>, config_key: Option<String>) -> Result<Self> {
        Ok(Self::with_files(
            explicit,
            config_key,
            paths::api_key_real_path()?,
            paths::api_key_template_path()?,
        ))
    }

    pub fn with_files(
        explicit: Option<String>,
        config_key: Option<String>,
        dev_file: PathBuf,
        template_file: PathBuf,
    ) -> Self {
        Self::with_env_var(explicit, API_KEY_ENV, config_key, dev_file, template_file)
    }

    pub fn with_env_var(
        explicit: Option<String>,
        env_var: &str,
        config_key: Option<String>,
        dev_file: PathBuf,
        template_file: PathBuf,
    ) -> Self {
        let providers: Vec<Box<dyn CredentialProvider>> = vec![
            Box::new(StaticProvider::new(explicit, CredentialSource::Explicit)),
            Box::new(EnvProvider::new(env_var)),
            Box::new(StaticProvider::new(config_key, CredentialSource::ConfigFile)),
            Box::new(FileProvider::dev_secret(dev_file.clone())),
            Box::new(FileProvider::template(template_file.clone())),
        ];
        Self {
            providers,
            dev_file,
            template_file,
        }
    }

    pub fn resolve(&self) -> Result<ApiCredential> {
        self.providers
            .iter()
            .find_map(|provider| {
                provider.resolve().map(|key| {
                    debug!(source = %provider.source(), "Resolved API key");
                    ApiCredential::new(key, provider.source())
                })
            })
            .ok_or_else(|| SkillsmpError::MissingCredential {
                dev_file: self.dev_file.display().to_string(),
                template_file: self.template_file.display().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn explicit_value_wins() {
        let dir = TempDir::new().unwrap();
        let dev = write(&dir, "api_key_real.txt", "dev_key");
        let chain = CredentialChain::with_env_var(
            Some("cli_key".to_string()),
            "SKILLSMP_TEST_KEY_EXPLICIT_UNSET",
            None,
            dev,
            dir.path().join("api_key.txt"),
        );
        let credential = chain.resolve().unwrap();
        assert_eq!(credential.key(), "cli_key");
        assert_eq!(credential.source(), CredentialSource::Explicit);
    }

    #[test]
    fn environment_beats_dev_secret_file() {
        let dir = TempDir::new().unwrap();
        let dev = write(&dir, "api_key_real.txt", "dev_key");
        let var = "SKILLSMP_TEST_KEY_ENV_ORDER";
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var(var, "env_key") };

        let chain =
            CredentialChain::with_env_var(None, var, None, dev, dir.path().join("api_key.txt"));
        let credential = chain.resolve().unwrap();

        // SAFETY: see above.
        unsafe { std::env::remove_var(var) };
        assert_eq!(credential.key(), "env_key");
        assert_eq!(credential.source(), CredentialSource::Environment);
    }

    #[test]
    fn dev_secret_file_beats_template() {
        let dir = TempDir::new().unwrap();
        let dev = write(&dir, "api_key_real.txt", "  sk_dev_456\n");
        let template = write(&dir, "api_key.txt", "sk_template_789");
        let chain = CredentialChain::with_env_var(
            None,
            "SKILLSMP_TEST_KEY_DEV_UNSET",
            None,
            dev,
            template,
        );
        assert_eq!(chain.resolve().unwrap().key(), "sk_dev_456");
    }

    #[test]
    fn config_key_sits_between_env_and_files() {
        let dir = TempDir::new().unwrap();
        let dev = write(&dir, "api_key_real.txt", "dev_key");
        let chain = CredentialChain::with_env_var(
            None,
            "SKILLSMP_TEST_KEY_CONFIG_UNSET",
            Some("config_key".to_string()),
            dev,
            dir.path().join("api_key.txt"),
        );
        let credential = chain.resolve().unwrap();
        assert_eq!(credential.key(), "config_key");
        assert_eq!(credential.source(), CredentialSource::ConfigFile);
    }

    #[test]
    fn template_file_is_used_when_edited() {
        let dir = TempDir::new().unwrap();
        let template = write(&dir, "api_key.txt", "sk_live_real_key_789");
        let chain = CredentialChain::with_env_var(
            None,
            "SKILLSMP_TEST_KEY_TEMPLATE_UNSET",
            None,
            dir.path().join("missing.txt"),
            template,
        );
        let credential = chain.resolve().unwrap();
        assert_eq!(credential.key(), "sk_live_real_key_789");
        assert_eq!(credential.source(), CredentialSource::TemplateFile);
    }

    #[test]
    fn placeholder_and_comments_are_skipped() {
        let dir = TempDir::new().unwrap();
        let dev = write(&dir, "api_key_real.txt", "# put your key here");
        let template = write(&dir, "api_key.txt", "sk_live_your_api_key_here");
        let chain = CredentialChain::with_env_var(
            None,
            "SKILLSMP_TEST_KEY_PLACEHOLDER_UNSET",
            None,
            dev,
            template,
        );
        let err = chain.resolve().unwrap_err();
        assert!(matches!(err, SkillsmpError::MissingCredential { .. }));
        assert!(err.to_string().contains("SKILLSMP_API_KEY"));
    }

    #[test]
    fn debug_output_redacts_key() {
        let credential = ApiCredential::new("secret", CredentialSource::Explicit);
        assert!(!format!("{credential:?}").contains("secret"));
    }
}
