use eyre::Result;
use henthub_store::ValidationGate;

use crate::cli::{FormArgs, TargetArgs};
use crate::commands::publish::build_form;
use crate::config::Config;
use crate::target::Target;

/// Runs every validation rule and reports all issues at once.
///
/// A store is only contacted for `--edit`.
pub async fn handle_validate_command(
    form_args: FormArgs,
    target_args: TargetArgs,
    config: &Config,
) -> Result<()> {
    let target = Target::resolve(config, &target_args)?;

    let mut form = if form_args.edit.is_some() {
        let backend = target.open()?;
        build_form(&form_args, Some(backend.as_ref())).await?
    } else {
        build_form(&form_args, None).await?
    };
    form.credential = target.credential.clone();

    let gate = ValidationGate::default();
    let issues = gate.validate(&form, target.kind);
    if issues.is_empty() {
        let manifest = form.build_manifest();
        println!(
            "✅ {} v{} is ready to publish ({} backend, {} rules checked)",
            manifest.app_id,
            manifest.version,
            target.kind,
            gate.rule_names().len()
        );
        return Ok(());
    }

    println!("❌ Please fill in or fix:");
    for issue in &issues {
        println!("   - {}", issue);
    }
    Err(eyre::eyre!("{} validation issue(s)", issues.len()))
}
