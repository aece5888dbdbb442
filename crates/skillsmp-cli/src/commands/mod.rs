pub mod diff;
pub mod info;
pub mod install;
pub mod search;
pub mod updates;
pub mod utils;

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::{Cli, Commands, SortOrder};
use crate::config::CliConfig;
use crate::output::OutputFormat;
use skillsmp_core::api::{DEFAULT_BASE_URL, SkillsmpClient};
use skillsmp_core::credentials::CredentialChain;
use skillsmp_core::registry::SkillRegistry;
use skillsmp_core::{SortBy, paths};

/// Settings shared by every command of one invocation.
pub struct CommandContext {
    pub format: OutputFormat,
    pub config: CliConfig,
    api_key: Option<String>,
    base_url: Option<String>,
    skills_dir: Option<PathBuf>,
}

impl CommandContext {
    pub fn new(cli: &Cli, config: CliConfig) -> Self {
        Self {
            format: cli.output_format(),
            config,
            api_key: cli.api_key.clone(),
            base_url: cli.base_url.clone(),
            skills_dir: cli.skills_dir.clone(),
        }
    }

    pub fn skills_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = self.skills_dir.clone().or_else(|| self.config.skills_dir.clone()) {
            return Ok(dir);
        }
        Ok(paths::default_skills_dir()?)
    }

    pub fn registry(&self) -> Result<SkillRegistry> {
        Ok(SkillRegistry::new(self.skills_dir()?))
    }

    /// Authenticated marketplace client.
    pub fn client(&self) -> skillsmp_core::Result<SkillsmpClient> {
        let credential =
            CredentialChain::standard(self.api_key.clone(), self.config.api_key.clone())?
                .resolve()?;

        let base_url = self
            .base_url
            .as_deref()
            .or(self.config.base_url.as_deref())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL);

        debug!(%base_url, "Using marketplace API");
        SkillsmpClient::with_config(credential, base_url, self.config.timeout())
    }
}

pub async fn run(cli: Cli, config: CliConfig) -> Result<()> {
    let ctx = CommandContext::new(&cli, config);

    match cli.command {
        Commands::Search(args) => search::search(&ctx, args).await,
        Commands::AiSearch { query } => search::ai_search(&ctx, &query).await,
        Commands::Info { skill_id } => info::run(&ctx, &skill_id).await,
        Commands::Install(args) => install::install(&ctx, args).await,
        Commands::List => install::list(&ctx),
        Commands::CheckUpdates { force, interactive } => {
            updates::check_updates(&ctx, force, interactive).await
        }
        Commands::Diff { name } => diff::run(&ctx, &name).await,
        Commands::Update(args) => updates::update(&ctx, args).await,
        Commands::Completions { shell } => {
            crate::completions::generate_completions(shell);
            Ok(())
        }
    }
}

impl From<SortOrder> for SortBy {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Stars => SortBy::Stars,
            SortOrder::Recent => SortBy::Recent,
        }
    }
}
