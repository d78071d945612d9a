use std::path::PathBuf;

use eyre::{Context, Result};
use henthub_emulator::EmulatorConfig;

use crate::config::Config;

pub async fn handle_serve_command(
    port: Option<u16>,
    root: Option<PathBuf>,
    web_root: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let settings = &config.emulator;
    let mut emulator = EmulatorConfig::default()
        .with_port(port.unwrap_or(settings.port))
        .with_root(root.unwrap_or_else(|| PathBuf::from(&settings.root)));

    if let Some(web_root) = web_root.or_else(|| settings.web_root.as_ref().map(PathBuf::from)) {
        emulator = emulator.with_web_root(web_root);
    }

    henthub_emulator::serve(emulator)
        .await
        .wrap_err("Store emulator stopped with an error")
}
