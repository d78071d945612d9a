//! Publish command handler and the form it is built from.

use std::path::Path;

use eyre::{Context, Result};
use henthub_store::{
    FormState, PublishError, PublishResult, Publisher, SelectedFile, StoreBackend,
    collect_source_tree, find_manifest,
};
use tracing::{info, warn};

use crate::cli::{FormArgs, TargetArgs};
use crate::config::Config;
use crate::target::Target;

pub async fn handle_publish_command(
    form_args: FormArgs,
    target_args: TargetArgs,
    json: bool,
    config: &Config,
) -> Result<()> {
    let target = Target::resolve(config, &target_args)?;
    let backend = target.open()?;

    let mut form = build_form(&form_args, Some(backend.as_ref())).await?;
    form.credential = target.credential.clone();

    let index = match backend.load_index().await {
        Ok(index) => index,
        Err(e) if e.is_not_found() => {
            info!("{} has no store index yet", backend.name());
            Default::default()
        }
        Err(e) => {
            warn!("Could not load the store index, duplicate check skipped: {}", e);
            Default::default()
        }
    };

    let mut publisher = Publisher::new(backend.as_ref());
    if let Some(path) = &config.publish.default_icon {
        let icon = tokio::fs::read(path)
            .await
            .wrap_err_with(|| format!("Failed to read default icon {}", path))?;
        publisher = publisher.with_default_icon(icon);
    }

    match publisher.publish(&form, &index).await {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result, backend.name());
            }
            Ok(())
        }
        Err(PublishError::ValidationFailed(issues)) => {
            println!("❌ Please fill in or fix:");
            for issue in &issues {
                println!("   - {}", issue);
            }
            Err(eyre::eyre!("{} validation issue(s)", issues.len()))
        }
        Err(e) => {
            if e.is_retryable() {
                println!("⚠️  The store may be partially updated; publishing again should succeed");
            } else if e.is_user_error() {
                println!("❌ {}", e);
            }
            Err(e).wrap_err("Publish failed")
        }
    }
}

fn print_summary(result: &PublishResult, backend_name: &str) {
    println!(
        "✅ Published {} v{} to {}",
        result.app_id, result.version, backend_name
    );
    println!(
        "   Package: {} ({:.2} KB)",
        result.download_url,
        result.package_size as f64 / 1024.0
    );
    println!("   Icon:    {}", result.icon_url);
    println!("   Files written: {}", result.written.len());
    for warning in &result.warnings {
        println!("⚠️  {}", warning);
    }
}

/// Fills a form from an edited package, the source folder, then explicit flags.
///
/// `--edit` needs `backend` to load the package being edited.
pub async fn build_form(
    args: &FormArgs,
    backend: Option<&dyn StoreBackend>,
) -> Result<FormState> {
    let mut form = match (&args.edit, backend) {
        (Some(app_id), Some(backend)) => {
            let session = Publisher::new(backend)
                .start_edit(app_id)
                .await
                .wrap_err_with(|| format!("Failed to load {} for editing", app_id))?;
            info!(
                "Editing {} v{} ({} screenshots)",
                session.app_id, session.initial_version, session.screenshot_count
            );
            match &session.record {
                Some(record) => info!(
                    "Previous package: {:.2} KB, published {}",
                    record.size as f64 / 1024.0,
                    record.published_date
                ),
                None => warn!("No full manifest stored for {}", session.app_id),
            }
            FormState::for_edit(session)?
        }
        (Some(_), None) => return Err(eyre::eyre!("--edit needs a store to load from")),
        (None, _) => FormState::new(),
    };

    if let Some(source) = &args.source {
        form.source_files = collect_source_tree(source)
            .await
            .wrap_err_with(|| format!("Failed to read source folder {}", source.display()))?;
        info!(
            "Collected {} files from {}",
            form.source_files.len(),
            source.display()
        );

        if args.manifest.is_none() {
            match find_manifest(&form.source_files).map(|m| m.bytes.clone()) {
                Some(bytes) => form.prefill_from_manifest(&bytes)?,
                None => warn!("No manifest.json found in {}", source.display()),
            }
        }
    }

    if let Some(path) = &args.manifest {
        let bytes = tokio::fs::read(path)
            .await
            .wrap_err_with(|| format!("Failed to read manifest {}", path.display()))?;
        form.prefill_from_manifest(&bytes)?;
    }

    if let Some(path) = &args.icon {
        form.icon = Some(read_selected(path).await?);
    }
    for path in &args.screenshots {
        form.screenshots.push(read_selected(path).await?);
    }

    apply_fields(&mut form, args)?;
    Ok(form)
}

async fn read_selected(path: &Path) -> Result<SelectedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile::new(name, bytes))
}

fn apply_fields(form: &mut FormState, args: &FormArgs) -> Result<()> {
    set(&mut form.app_id, &args.app_id);
    set(&mut form.name, &args.name);
    set(&mut form.version, &args.version);
    set(&mut form.author, &args.author);
    set(&mut form.description, &args.description);
    set(&mut form.min_os_version, &args.min_os_version);
    if let Some(kind) = &args.extension_type {
        form.extension_type = kind.parse()?;
    }
    if let Some(terminal_only) = args.terminal_only {
        form.terminal_only = terminal_only;
    }
    if let Some(single_instance) = args.single_instance {
        form.single_instance = single_instance;
    }
    if !args.permissions.is_empty() {
        form.permissions = args.permissions.clone();
    }
    for dependency in &args.dependencies {
        if !form.add_dependency(dependency) {
            warn!("Skipping dependency {}", dependency);
        }
    }

    set(&mut form.entry_point, &args.entry_point);
    set(&mut form.entry_class, &args.entry_class);
    set(&mut form.entry_method, &args.entry_method);

    set(&mut form.widget_class, &args.widget_class);
    if args.width.is_some() {
        form.width = args.width;
    }
    if args.height.is_some() {
        form.height = args.height;
    }
    if let Some(resizable) = args.resizable {
        form.is_resizable = resizable;
    }
    if let Some(policy) = &args.refresh_policy {
        form.refresh_policy = policy.parse()?;
    }
    if args.interval_ms.is_some() {
        form.interval_ms = args.interval_ms;
    }
    if !args.subscriptions.is_empty() {
        form.subscriptions = args.subscriptions.clone();
    }
    Ok(())
}

fn set(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}
