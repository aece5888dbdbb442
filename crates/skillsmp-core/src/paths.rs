use std::path::PathBuf;

use crate::error::{Result, SkillsmpError};

const SKILLSMP_DIR: &str = ".skillsmp";
const UPDATE_CACHE_FILE: &str = "update_cache.json";
const API_KEY_REAL_FILE: &str = "api_key_real.txt";
const API_KEY_TEMPLATE_FILE: &str = "api_key.txt";
const LOGS_DIR: &str = "logs";

/// Environment variable to override the SkillsMP data directory.
pub const SKILLSMP_DIR_ENV: &str = "SKILLSMP_DIR";

/// Resolve the SkillsMP data directory.
/// Priority: SKILLSMP_DIR env var > ~/.skillsmp/
pub fn resolve_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(SKILLSMP_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(SKILLSMP_DIR))
        .ok_or_else(missing_home)
}

fn missing_home() -> SkillsmpError {
    SkillsmpError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "Failed to determine home directory",
    ))
}

/// Ensure the data directory exists and return its path.
pub fn ensure_data_dir() -> Result<PathBuf> {
    let dir = resolve_data_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Update-check cache: ~/.skillsmp/update_cache.json
pub fn update_cache_path() -> Result<PathBuf> {
    Ok(resolve_data_dir()?.join(UPDATE_CACHE_FILE))
}

/// Development-only secret: ~/.skillsmp/api_key_real.txt
pub fn api_key_real_path() -> Result<PathBuf> {
    Ok(resolve_data_dir()?.join(API_KEY_REAL_FILE))
}

/// Template key file: ~/.skillsmp/api_key.txt
pub fn api_key_template_path() -> Result<PathBuf> {
    Ok(resolve_data_dir()?.join(API_KEY_TEMPLATE_FILE))
}

/// Log directory: ~/.skillsmp/logs/
pub fn logs_dir() -> Result<PathBuf> {
    let dir = resolve_data_dir()?.join(LOGS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Default skills registry used by the host agent: ~/.claude/skills/
pub fn default_skills_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|h| h.join(".claude").join("skills"))
        .ok_or_else(missing_home)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn missing_home_is_an_io_failure() {
        let err = missing_home();
        assert_eq!(err.category(), ErrorCategory::Io);
        assert!(err.to_string().contains("home directory"));
    }
}
