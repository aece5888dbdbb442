use colored::Colorize;
use serde_json::json;

use crate::output::OutputFormat;
use skillsmp_core::{ErrorCategory, SkillsmpError};

pub fn handle_error(err: anyhow::Error, format: OutputFormat) -> ! {
    let core_err = err.downcast_ref::<SkillsmpError>();

    if format.is_json() {
        let (category, code) = match core_err {
            Some(e) => (e.category().as_str(), e.code()),
            None => ("internal", "INTERNAL_ERROR".to_string()),
        };
        let body = json!({
            "success": false,
            "error": {
                "category": category,
                "code": code,
                "message": format!("{err:#}"),
            }
        });
        println!("{body:#}");
        std::process::exit(1);
    }

    eprintln!("{} {:#}", "Error:".red().bold(), err);

    match core_err.map(SkillsmpError::category) {
        Some(ErrorCategory::Credential) => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  Get an API key at https://skillsmp.com and set it with:");
            eprintln!("  {} export SKILLSMP_API_KEY=<key>", "$".dimmed());
        }
        Some(ErrorCategory::Transport) => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  Check your internet connection and try again.");
        }
        Some(ErrorCategory::NotFound) if err.to_string().contains("not found locally") => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  List installed skills with:");
            eprintln!("  {} skillsmp list", "$".dimmed());
        }
        _ => {}
    }

    std::process::exit(1);
}
