//! Configuration inspection commands.

use clap::{Args, Subcommand};

use docvault_core::config::AppConfig;
use docvault_core::result::AppResult;
use docvault_database::connection::redact_url;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    match &args.command {
        ConfigCommand::Show => output::print_item(&redacted(config), format),
    }
    Ok(())
}

/// Copy of `config` that is safe to print.
fn redacted(config: &AppConfig) -> AppConfig {
    let mut shown = config.clone();
    shown.database.url = redact_url(&shown.database.url);
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_database_password() {
        let mut config = AppConfig::default();
        config.database.url = "postgres://docvault:hunter2@db/docvault".to_string();

        let shown = redacted(&config);
        assert!(!shown.database.url.contains("hunter2"));
        assert_eq!(shown.storage.key_prefix, config.storage.key_prefix);
    }
}
