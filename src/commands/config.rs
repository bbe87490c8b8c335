use clap::{Args, Subcommand};

use crate::config;

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand, Clone)]
enum ConfigSubcommand {
    /// Parse the config file and validate its profiles.
    Check {
        #[arg(long)]
        profile: Option<String>,
    },
    /// Report where the API key would be read from, without printing it.
    Credentials,
}

pub fn run(args: ConfigArgs) -> Result<(), String> {
    match args.command {
        ConfigSubcommand::Check { profile } => {
            let path = config::validate_config(profile.as_deref())?;
            println!("config OK: {}", path.display());
            Ok(())
        }
        ConfigSubcommand::Credentials => {
            config::require_api_key()?;
            println!("{}: configured", config::API_KEY_ENV);
            Ok(())
        }
    }
}
