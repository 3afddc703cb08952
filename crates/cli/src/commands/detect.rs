//! Detect command - show the table layout without parsing rows.

use anyhow::Context;
use clap::Args;
use std::fmt::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tallyscan_ocr::{Detection, StatementIntake, StatementParser};

use crate::settings::Settings;

#[derive(Args)]
pub struct DetectArgs {
    /// Statement file
    input: PathBuf,
}

pub async fn run(args: DetectArgs, settings: &Settings) -> anyhow::Result<ExitCode> {
    let parser = StatementParser::new(settings.config.parser.clone()).context("compiling parser rules")?;
    let intake = StatementIntake::new(super::engine(&settings.config.ocr), parser, settings.config.ocr.clone());
    let text = intake
        .text_of_file(&args.input)
        .await
        .with_context(|| format!("reading {}", args.input.display()))?;

    print!("{}", describe(&intake.parser().detect(&text)));
    Ok(ExitCode::SUCCESS)
}

fn describe(detection: &Detection) -> String {
    let (Some(region), Some(header)) = (&detection.region, detection.header()) else {
        return "no table detected\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(out, "header  line {}: {}", header.index + 1, header.collapsed());
    let _ = writeln!(
        out,
        "body    {} line(s), ended by {}",
        region.body_len(),
        region.end_reason
    );
    let _ = writeln!(out, "columns");
    for column in 0..region.column_count() {
        let (start, _) = region.column_span(column);
        let label = region.column_labels.get(column).map(String::as_str).unwrap_or("");
        let _ = writeln!(out, "  {column:>2}  @{start:<4} {:<12} {label}", region.role(column).to_string());
    }
    out
}
