use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use super::CommandContext;
use super::utils::or_dash;
use crate::cli::InstallArgs;
use crate::output::json::print_json;
use crate::output::table::print_table;
use skillsmp_core::install::{
    ArchiveInstaller, InstallOptions, InstallSource, InstalledSkill, SkillInstaller,
};

pub async fn install(ctx: &CommandContext, args: InstallArgs) -> Result<()> {
    let registry = ctx.registry()?;
    let source = InstallSource::parse(&args.source);

    let installed = match &source {
        // Local packages need no marketplace access.
        InstallSource::Path(path) => ArchiveInstaller::new(&registry).install_file(path)?,
        _ => {
            let client = ctx.client()?;
            let options = InstallOptions {
                index: args.index,
                page: args.page,
                sort_by: args.sort_by.into(),
            };
            SkillInstaller::new(&client, &registry)
                .install(&source, &options)
                .await
                .with_context(|| format!("Failed to install '{}'", args.source))?
        }
    };

    if ctx.format.is_json() {
        return print_json(&installed);
    }
    print_installed(&installed);
    Ok(())
}

pub fn print_installed(installed: &InstalledSkill) {
    let verb = if installed.replaced { "Reinstalled" } else { "Installed" };
    println!(
        "{verb} {} {} to {}",
        installed.name,
        or_dash(installed.version.as_deref()),
        installed.path.display()
    );
    println!("Source: {}", installed.source);
}

pub fn list(ctx: &CommandContext) -> Result<()> {
    let registry = ctx.registry()?;
    let skills = registry.list_sorted()?;

    if ctx.format.is_json() {
        return print_json(&skills);
    }

    if skills.is_empty() {
        println!("No skills installed in {}", registry.base_dir().display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Version", "Author", "Path"]);
    for skill in &skills {
        table.add_row(vec![
            Cell::new(&skill.name),
            Cell::new(or_dash(skill.version.as_deref())),
            Cell::new(or_dash(skill.author.as_deref())),
            Cell::new(skill.path.display()),
        ]);
    }
    print_table(table)?;
    println!("{} skill(s) in {}", skills.len(), registry.base_dir().display());
    Ok(())
}
