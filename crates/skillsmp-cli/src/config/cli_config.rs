//! CLI configuration file support
//!
//! Loads configuration from ~/.config/skillsmp/config.toml, or from the file
//! named by `SKILLSMP_CONFIG`.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use skillsmp_core::api::DEFAULT_TIMEOUT;

/// Environment variable pointing at an alternative config file
pub const CONFIG_PATH_ENV: &str = "SKILLSMP_CONFIG";

const DEFAULT_CHECK_DELAY_MS: u64 = 300;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Marketplace API key
    pub api_key: Option<String>,
    /// Marketplace API base URL
    pub base_url: Option<String>,
    /// Installed skills directory
    pub skills_dir: Option<PathBuf>,
    /// HTTP request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Pause between remote lookups of `check-updates`, in milliseconds
    pub check_delay_ms: Option<u64>,
}

impl CliConfig {
    /// Load configuration from default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&path, &content),
            Err(err) => {
                warn_ignored(&path, &err.to_string());
                Self::default()
            }
        }
    }

    fn parse(path: &Path, content: &str) -> Self {
        match toml::from_str(content) {
            Ok(config) => config,
            Err(err) => {
                warn_ignored(path, &err.to_string());
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|p| p.join("skillsmp").join("config.toml"))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn check_delay(&self) -> Duration {
        Duration::from_millis(self.check_delay_ms.unwrap_or(DEFAULT_CHECK_DELAY_MS))
    }
}

fn warn_ignored(path: &Path, reason: &str) {
    eprintln!(
        "{} ignoring config file {}: {reason}",
        "Warning:".yellow().bold(),
        path.display()
    );
}
