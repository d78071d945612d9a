//! Store maintenance: listing, deleting and resetting.

use eyre::{Context, Result};
use henthub_store::browse::{install_link, partition_by_terminal, search};
use henthub_store::{PublishError, Publisher, SlimManifestEntry};

use crate::cli::TargetArgs;
use crate::commands::confirm;
use crate::config::Config;
use crate::target::Target;

pub async fn handle_list_command(
    query: Option<String>,
    json: bool,
    target_args: TargetArgs,
    config: &Config,
) -> Result<()> {
    let backend = Target::resolve(config, &target_args)?.open()?;
    let index = backend
        .load_index()
        .await
        .wrap_err_with(|| format!("Failed to load the store index from {}", backend.name()))?;

    let apps = search(&index, query.as_deref().unwrap_or(""));
    if json {
        println!("{}", serde_json::to_string_pretty(&apps)?);
        return Ok(());
    }

    if apps.is_empty() {
        println!("No packages found");
        return Ok(());
    }

    let (standard, terminal) = partition_by_terminal(apps);
    print_section("Packages", &standard);
    print_section("Terminal packages", &terminal);
    if !index.last_updated.is_empty() {
        println!("Last updated: {}", index.last_updated);
    }
    Ok(())
}

fn print_section(title: &str, apps: &[&SlimManifestEntry]) {
    if apps.is_empty() {
        return;
    }
    println!("{} ({}):", title, apps.len());
    for app in apps {
        println!(
            "  {:<16} v{:<10} {} by {} [{}]",
            app.app_id, app.version, app.name, app.author, app.extension_type
        );
        println!("  {:<16} {}", "", install_link(app));
    }
    println!();
}

pub async fn handle_delete_command(
    app_id: String,
    force: bool,
    target_args: TargetArgs,
    config: &Config,
) -> Result<()> {
    let backend = Target::resolve(config, &target_args)?.open()?;

    if !force && !confirm(&format!("Remove {} from {}?", app_id, backend.name()))? {
        println!("❌ Cancelled");
        return Ok(());
    }

    match Publisher::new(backend.as_ref()).delete(&app_id).await {
        Ok(()) => {
            println!("✅ Removed {} from the store listing", app_id);
            Ok(())
        }
        Err(e @ PublishError::NotFound(_)) => {
            println!("❌ {} is not listed in the store", app_id);
            Err(e.into())
        }
        Err(e) => Err(e).wrap_err_with(|| format!("Failed to delete {}", app_id)),
    }
}

pub async fn handle_reset_command(
    force: bool,
    target_args: TargetArgs,
    config: &Config,
) -> Result<()> {
    let backend = Target::resolve(config, &target_args)?.open()?;

    if !force
        && !confirm(&format!(
            "Delete every package, asset and manifest in {}?",
            backend.name()
        ))?
    {
        println!("❌ Cancelled");
        return Ok(());
    }

    backend.reset().await.wrap_err("Failed to reset the store")?;
    println!("✅ Store reset");
    Ok(())
}

