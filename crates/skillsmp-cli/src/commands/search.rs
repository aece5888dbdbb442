use anyhow::Result;
use colored::Colorize;

use super::CommandContext;
use super::utils::or_dash;
use crate::cli::SearchArgs;
use crate::output::json::print_envelope;
use crate::output::{DESCRIPTION_PREVIEW, truncate};
use skillsmp_core::api::SkillCatalog;
use skillsmp_core::{RemoteSkill, SearchQuery};

pub async fn search(ctx: &CommandContext, args: SearchArgs) -> Result<()> {
    let client = ctx.client()?;
    let query = SearchQuery::new(args.query)
        .page(args.page)
        .limit(args.limit)
        .sort_by(args.sort_by.into());

    let page = client.search(&query).await?;

    if ctx.format.is_json() {
        return print_envelope(&page);
    }

    println!("\n{}", "=== Search Results ===".bold());
    println!("Total: {} skills found\n", page.total);

    for (rank, skill) in page.skills.iter().enumerate() {
        print_skill(rank + 1, skill, None);
    }
    Ok(())
}

pub async fn ai_search(ctx: &CommandContext, query: &str) -> Result<()> {
    let client = ctx.client()?;
    let results = client.semantic_search(query).await?;

    if ctx.format.is_json() {
        return print_envelope(&results);
    }

    println!("\n{}\n", "=== AI Search Results ===".bold());
    if results.skills.is_empty() {
        println!("No skills found matching your query.");
        return Ok(());
    }

    for (rank, skill) in results.skills.iter().enumerate() {
        print_skill(rank + 1, skill, Some(skill.relevance_score.unwrap_or(0.0)));
    }
    Ok(())
}

fn print_skill(rank: usize, skill: &RemoteSkill, relevance: Option<f64>) {
    println!("{rank}. {}", skill.name.bold());

    let mut meta = format!(
        "   Author: {} | Stars: {}",
        or_dash(skill.author.as_deref()),
        skill.stars
    );
    if let Some(relevance) = relevance {
        meta.push_str(&format!(" | Relevance: {relevance:.2}"));
    }
    println!("{meta}");

    let description = skill
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("No description");
    println!("   Description: {}", truncate(description, DESCRIPTION_PREVIEW));
    println!();
}
