//! `henthub config`: view and change the settings file.

use std::path::Path;

use eyre::{Context, Result};

use crate::cli::ConfigCommands;
use crate::commands::confirm;
use crate::config::Config;

pub async fn handle_config_command(cmd: ConfigCommands) -> Result<()> {
    if let ConfigCommands::Reset { force: false } = cmd
        && !confirm("Reset every henthub setting to its default?")?
    {
        println!("❌ Cancelled");
        return Ok(());
    }

    let report = apply(cmd, &Config::get_config_path()).await?;
    println!("{}", report);
    Ok(())
}

/// Runs `cmd` against the config file at `path` and returns what to print.
async fn apply(cmd: ConfigCommands, path: &Path) -> Result<String> {
    match cmd {
        ConfigCommands::Show { section } => {
            let config = Config::load_from(path).await?;
            Ok(format!(
                "{}\n\nConfig file: {}",
                config.show(section.as_deref())?,
                path.display()
            ))
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_from(path).await?;
            Ok(format!("{}: {}", key, config.get_value(&key)?))
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_from(path).await?;
            config
                .set_value(&key, &value)
                .wrap_err("Failed to set configuration")?;
            config.save_to(path).await?;

            let mut report = format!("✅ {} = {}", key, config.get_value(&key)?);
            let missing = config.missing_github_settings();
            if config.backend.mode == "github" && !missing.is_empty() {
                report.push_str(&format!(
                    "\n⚠️  Publishing to GitHub still needs {} (the token may come from HENTHUB_GITHUB_TOKEN instead)",
                    missing.join(", ")
                ));
            }
            Ok(report)
        }
        ConfigCommands::Reset { .. } => {
            Config::default().save_to(path).await?;
            Ok(format!("✅ Configuration reset to defaults in {}", path.display()))
        }
    }
}
