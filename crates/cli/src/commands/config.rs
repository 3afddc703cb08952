//! Config command - inspect the effective configuration.

use clap::{Args, Subcommand};
use std::process::ExitCode;

use crate::settings::{default_config_path, Settings};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print the default configuration file location
    Path,
}

pub fn run(args: ConfigArgs, settings: &Settings) -> anyhow::Result<ExitCode> {
    match args.command {
        ConfigCommand::Show => {
            match &settings.source {
                Some(path) => println!("# loaded from {}", path.display()),
                None => println!("# built-in defaults"),
            }
            print!("{}", settings.config.to_toml_string()?);
        }
        ConfigCommand::Path => match default_config_path() {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("no configuration directory available on this platform"),
        },
    }
    Ok(ExitCode::SUCCESS)
}
