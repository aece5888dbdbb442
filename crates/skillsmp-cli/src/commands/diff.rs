use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use super::utils::{format_timestamp, or_dash};
use crate::output::json::print_json;
use skillsmp_core::diff::{SkillDiff, diff_installed};

pub async fn run(ctx: &CommandContext, name: &str) -> Result<()> {
    let registry = ctx.registry()?;
    let client = ctx.client()?;
    let diff = diff_installed(&client, &registry, name).await?;

    if ctx.format.is_json() {
        return print_json(&diff);
    }

    print_diff(&diff);
    Ok(())
}

pub fn print_diff(diff: &SkillDiff) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("{} - Version Comparison", diff.name.bold());
    println!("{rule}");

    println!("\nLocal Path:   {}", diff.path.display());
    println!("GitHub:       {}", or_dash(diff.github_url.as_deref()));
    println!("SkillsMP:     {}", or_dash(diff.skill_url.as_deref()));
    println!("Stars:        {}", diff.stars);
    println!("Last Updated: {}", format_timestamp(diff.updated_at));
    println!(
        "Version:      {} -> {} ({})",
        or_dash(diff.local_version.as_deref()),
        or_dash(diff.remote_version.as_deref()),
        diff.status.as_str()
    );

    if diff.has_changes() {
        println!("\nChanges Detected:\n");
        for change in &diff.changes {
            let suffix = if change.field == "description" { "..." } else { "" };
            println!("  {}:", capitalize(change.field));
            println!("    {} Local:  {}{suffix}", "-".red(), change.local);
            println!("    {} Remote: {}{suffix}", "+".green(), change.remote);
        }
    } else {
        println!("\nNo differences detected in frontmatter");
    }

    println!("\n{rule}");
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
