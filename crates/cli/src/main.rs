//! Command-line front end for the statement parser.

mod commands;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use commands::{config, detect, parse};
use settings::Settings;

/// Turn OCR'd statements into structured transactions
#[derive(Parser)]
#[command(name = "tallyscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a statement file into transactions
    Parse(parse::ParseArgs),

    /// Show where the transaction table was found
    Detect(detect::DetectArgs),

    /// Inspect configuration
    Config(config::ConfigArgs),
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse(args) => parse::run(args, &settings).await,
        Commands::Detect(args) => detect::run(args, &settings).await,
        Commands::Config(args) => config::run(args, &settings),
    }
}
