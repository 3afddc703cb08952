//! Parse command - turn one statement file into transactions.

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use tallyscan_core::DocumentType;
use tallyscan_ocr::{StatementIntake, StatementParser};
use tracing::{info, warn};

use crate::output::{render, OutputFormat};
use crate::settings::Settings;

#[derive(Args)]
pub struct ParseArgs {
    /// Statement file (txt, csv, png, jpg, tiff, bmp, webp, pdf)
    input: PathBuf,

    /// Document type: bank, creditcard or ledger
    #[arg(short = 't', long = "type")]
    document_type: DocumentType,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Anchor for year-less and two-digit-year dates (YYYY-MM-DD)
    #[arg(long)]
    reference_date: Option<NaiveDate>,

    /// Skip the result cache
    #[arg(long)]
    no_cache: bool,
}

pub async fn run(args: ParseArgs, settings: &Settings) -> anyhow::Result<ExitCode> {
    let mut parser_config = settings.config.parser.clone();
    if args.reference_date.is_some() {
        parser_config.reference_date = args.reference_date;
    }
    let parser = StatementParser::new(parser_config).context("compiling parser rules")?;
    let mut intake = StatementIntake::new(super::engine(&settings.config.ocr), parser, settings.config.ocr.clone());

    if settings.config.cache.enabled && !args.no_cache {
        match settings.result_cache() {
            Ok(cache) => {
                if let Err(error) = cache.cleanup() {
                    warn!(%error, "cache cleanup failed");
                }
                intake = intake.with_cache(cache);
            }
            Err(error) => warn!(error = %format!("{error:#}"), "result cache disabled"),
        }
    }

    let result = intake
        .process_file(&args.input, args.document_type)
        .await
        .with_context(|| format!("processing {}", args.input.display()))?;
    let outcome = result.outcome;
    info!(
        file = %args.input.display(),
        cached = result.from_cache,
        transactions = outcome.transactions.len(),
        "parsed"
    );

    let rendered = render(&outcome, args.format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Output written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    if let Some(notice) = outcome.notice {
        eprintln!("{notice}");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
