use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::io::{BufRead, Write};

use super::CommandContext;
use super::diff::print_diff;
use super::install::print_installed;
use super::utils::or_dash;
use crate::cli::UpdateArgs;
use crate::output::json::print_json;
use skillsmp_core::api::{LazyCatalog, SkillCatalog};
use skillsmp_core::diff::diff_installed;
use skillsmp_core::install::{InstalledSkill, SkillInstaller, UpdatePlan};
use skillsmp_core::paths;
use skillsmp_core::registry::SkillRegistry;
use skillsmp_core::updates::{CheckOptions, UpdateCache, UpdateChecker, UpdateReport};

#[derive(Serialize)]
struct CheckSummary<'a> {
    #[serde(flatten)]
    report: &'a UpdateReport,
    total_checked: usize,
    from_cache: usize,
}

pub async fn check_updates(ctx: &CommandContext, force: bool, interactive: bool) -> Result<()> {
    let registry = ctx.registry()?;
    // Credentials are only needed once a skill has to be looked up remotely.
    let catalog = LazyCatalog::new(|| ctx.client());
    let cache = UpdateCache::load(paths::update_cache_path()?);

    let options = CheckOptions {
        force,
        lookup_delay: ctx.config.check_delay(),
    };

    if !ctx.format.is_json() {
        eprintln!(
            "Checking installed skills in {} for updates...",
            registry.base_dir().display()
        );
    }

    let (report, cache) = UpdateChecker::new(&catalog, &registry, options)
        .run(cache)
        .await?;
    cache
        .persist()
        .with_context(|| format!("Failed to save update cache {}", cache.path().display()))?;

    if ctx.format.is_json() {
        return print_json(&CheckSummary {
            report: &report,
            total_checked: report.total_checked(),
            from_cache: report.from_cache_count(),
        });
    }

    print_report(&report);
    if interactive && !report.updates.is_empty() {
        review_updates(&catalog, &registry, &report, &mut std::io::stdin().lock()).await?;
    }
    Ok(())
}

/// A line typed at the interactive prompt.
#[derive(Debug, PartialEq, Eq)]
enum Selection {
    Quit,
    /// 0-based position in the listed updates.
    Pick(usize),
    Invalid,
}

fn parse_selection(input: &str, count: usize) -> Selection {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
        return Selection::Quit;
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Selection::Pick(n - 1),
        _ => Selection::Invalid,
    }
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn prompt(input: &mut impl BufRead, message: &str) -> Result<Option<String>> {
    print!("{message}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Let the user pick listed updates, show their differences and apply them.
async fn review_updates(
    catalog: &dyn SkillCatalog,
    registry: &SkillRegistry,
    report: &UpdateReport,
    input: &mut impl BufRead,
) -> Result<()> {
    let installer = SkillInstaller::new(catalog, registry);
    let count = report.updates.len();
    loop {
        let message = format!("\nSelect an update to inspect (1-{count}) or 'q' to quit: ");
        let Some(line) = prompt(input, &message)? else {
            println!();
            return Ok(());
        };
        let update = match parse_selection(&line, count) {
            Selection::Quit => return Ok(()),
            Selection::Invalid => {
                println!("Invalid selection: enter a number between 1 and {count}");
                continue;
            }
            Selection::Pick(i) => &report.updates[i],
        };

        match diff_installed(catalog, registry, &update.name).await {
            Ok(diff) => print_diff(&diff),
            Err(e) => {
                println!("{}", format!("Could not compare '{}': {e}", update.name).red());
                continue;
            }
        }

        let question = format!("Update '{}' now? [y/N]: ", update.name);
        if !prompt(input, &question)?.is_some_and(|answer| is_yes(&answer)) {
            continue;
        }
        match reinstall(&installer, &update.name).await {
            Ok(installed) => print_installed(&installed),
            Err(e) => println!("{}", format!("Failed to update '{}': {e}", update.name).red()),
        }
    }
}

async fn reinstall(installer: &SkillInstaller<'_>, name: &str) -> skillsmp_core::Result<InstalledSkill> {
    let plan = installer.plan_update(name, None, None).await?;
    installer.apply_update(&plan).await
}

fn print_report(report: &UpdateReport) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("{}", "UPDATE CHECK SUMMARY".bold());
    println!("{rule}");

    if report.updates.is_empty() {
        println!("\nNo updates found - all checked skills are up to date.\n");
    } else {
        println!(
            "\n{}\n",
            format!("{} skill(s) with updates available:", report.updates.len()).yellow()
        );
        for (i, update) in report.updates.iter().enumerate() {
            println!("{}. {}", i + 1, update.name.bold());
            println!(
                "   Local: {} | SkillsMP: {}",
                or_dash(update.local_version.as_deref()),
                or_dash(update.remote_version.as_deref())
            );
            println!("   Stars: {}", update.stars);
            println!("   GitHub: {}", or_dash(update.github_url.as_deref()));
            println!();
        }
    }

    if !report.unknown.is_empty() {
        println!("{} skill(s) could not be compared:", report.unknown.len());
        for check in &report.unknown {
            println!(
                "   - {} (local {}, remote {})",
                check.name,
                or_dash(check.local_version.as_deref()),
                or_dash(check.remote_version.as_deref())
            );
        }
        println!();
    }

    if !report.not_found.is_empty() {
        println!("{} skill(s) not found on SkillsMP:", report.not_found.len());
        for skill in &report.not_found {
            println!("   - {}", skill.name);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("{}", format!("{} skill(s) had errors:", report.errors.len()).red());
        for error in &report.errors {
            println!("   - {}: {}", error.name, error.error);
        }
        println!();
    }

    println!("Total checked: {}", report.total_checked());
    println!("Up to date: {}", report.up_to_date.len());
    println!("Updates available: {}", report.updates.len());
    println!("Unknown: {}", report.unknown.len());
    println!("Not found: {}", report.not_found.len());
    println!("Errors: {}", report.errors.len());
    println!("From cache: {}", report.from_cache_count());
}

pub async fn update(ctx: &CommandContext, args: UpdateArgs) -> Result<()> {
    let registry = ctx.registry()?;
    let client = ctx.client()?;
    let installer = SkillInstaller::new(&client, &registry);

    let plan = installer
        .plan_update(
            &args.name,
            args.download_url.as_deref(),
            args.github_url.as_deref(),
        )
        .await?;

    if args.dry_run {
        if ctx.format.is_json() {
            return print_json(&plan);
        }
        print_plan(&plan);
        return Ok(());
    }

    let installed = installer
        .apply_update(&plan)
        .await
        .with_context(|| format!("Failed to update '{}'", plan.name))?;

    if ctx.format.is_json() {
        return print_json(&installed);
    }
    print_installed(&installed);
    Ok(())
}

fn print_plan(plan: &UpdatePlan) {
    println!("{}", "Dry run - nothing was changed".yellow());
    println!("Skill:         {}", plan.name);
    println!("Directory:     {}", plan.path.display());
    println!("Local version: {}", or_dash(plan.local_version.as_deref()));
    if plan.remote_version.is_some() {
        println!("New version:   {}", or_dash(plan.remote_version.as_deref()));
    }
    println!("Download URL:  {}", plan.download_url);
}
