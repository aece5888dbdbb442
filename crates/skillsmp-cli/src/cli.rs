use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Ordering of keyword search results
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Stars,
    Recent,
}

#[derive(Parser)]
#[command(name = "skillsmp")]
#[command(
    version,
    about = "SkillsMP - search the skill marketplace and manage installed skills"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API key (overrides SKILLSMP_API_KEY, the config file and key files)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Installed skills directory (defaults to ~/.claude/skills)
    #[arg(long, global = true, env = "SKILLSMP_SKILLS_DIR")]
    pub skills_dir: Option<PathBuf>,

    /// Marketplace API base URL
    #[arg(long, global = true, env = "SKILLSMP_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search skills by keyword
    Search(SearchArgs),

    /// Search skills by meaning
    AiSearch {
        /// Natural language description of the skill you need
        query: String,
    },

    /// Show marketplace details of a skill
    Info {
        /// Marketplace skill ID
        skill_id: String,
    },

    /// Install a skill from a search query, URL or local package
    Install(InstallArgs),

    /// List installed skills
    #[command(visible_alias = "install-list")]
    List,

    /// Check installed skills for marketplace updates
    CheckUpdates {
        /// Ignore the one-hour result cache
        #[arg(long)]
        force: bool,

        /// Pick listed updates to inspect and apply after the summary
        #[arg(long, short = 'i')]
        interactive: bool,
    },

    /// Compare an installed skill with its marketplace record
    Diff {
        /// Installed skill name
        name: String,
    },

    /// Reinstall an installed skill from its latest package
    Update(UpdateArgs),

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search keyword
    pub query: String,

    /// Page number
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Results per page (max 100)
    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    /// Sort order
    #[arg(long = "sort-by", aliases = ["sortBy", "sort"], value_enum, default_value = "stars")]
    pub sort_by: SortOrder,
}

#[derive(Args)]
pub struct InstallArgs {
    /// Search query, archive URL, or path to a .skill / .zip / .tar.gz package
    pub source: String,

    /// Rank of the search result on the page to install (1-20)
    #[arg(long, default_value_t = 1)]
    pub index: usize,

    /// Search results page
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Sort order of the search
    #[arg(long = "sort-by", aliases = ["sortBy", "sort"], value_enum, default_value = "stars")]
    pub sort_by: SortOrder,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Installed skill name
    pub name: String,

    /// Direct package download URL
    #[arg(long, conflicts_with = "github_url")]
    pub download_url: Option<String>,

    /// GitHub repository URL to infer the release download from
    #[arg(long)]
    pub github_url: Option<String>,

    /// Show what would be installed without changing anything
    #[arg(long)]
    pub dry_run: bool,
}
