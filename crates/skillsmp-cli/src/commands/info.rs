use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use super::utils::{format_timestamp, or_dash};
use crate::output::json::print_envelope;
use skillsmp_core::RemoteSkill;
use skillsmp_core::api::SkillCatalog;

pub async fn run(ctx: &CommandContext, skill_id: &str) -> Result<()> {
    let client = ctx.client()?;
    let skill = client.skill_details(skill_id).await?;

    if ctx.format.is_json() {
        return print_envelope(&skill);
    }

    print_details(&skill);
    Ok(())
}

fn print_details(skill: &RemoteSkill) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("{}", skill.name.bold());
    println!("{rule}");

    println!("\nAuthor:   {}", or_dash(skill.author.as_deref()));
    println!("Stars:    {}", skill.stars);
    println!("Version:  {}", or_dash(skill.remote_version()));
    println!("Updated:  {}", format_timestamp(skill.updated_at));

    if let Some(description) = skill.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!("\nDescription:");
        println!("   {description}");
    }

    if !skill.tags.is_empty() {
        println!("\nTags: {}", skill.tags.join(", "));
    }

    if let Some(repository) = skill.repository() {
        println!("\nRepository: {repository}");
    }
    if let Some(url) = skill.skill_url.as_deref() {
        println!("SkillsMP:   {url}");
    }
    println!(
        "Install:    {} skillsmp install \"{}\"",
        "$".dimmed(),
        skill.name
    );

    if !skill.requirements.is_empty() {
        println!("\nRequirements:");
        for requirement in &skill.requirements {
            println!("   - {requirement}");
        }
    }

    if !skill.examples.is_empty() {
        println!("\nUsage Examples:");
        for (i, example) in skill.examples.iter().enumerate() {
            println!("   {}. {example}", i + 1);
        }
    }

    println!("\n{rule}\n");
}
