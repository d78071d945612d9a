pub mod config;
pub mod publish;
pub mod serve;
pub mod store;
pub mod validate;

use std::io::{self, Write};

pub use config::handle_config_command;
pub use publish::handle_publish_command;
pub use serve::handle_serve_command;
pub use store::{handle_delete_command, handle_list_command, handle_reset_command};
pub use validate::handle_validate_command;

/// Asks a y/N question on the terminal.
pub(crate) fn confirm(question: &str) -> eyre::Result<bool> {
    print!("{} (y/N): ", question);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_lowercase().starts_with('y'))
}
