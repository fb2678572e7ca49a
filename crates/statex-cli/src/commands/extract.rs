//! Extract command - records from a single statement.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use statex_core::StatementEngine;

use super::{ExtractionOverrides, extract_file, load_config};
use crate::output::{OutputFormat, format_report};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    overrides: ExtractionOverrides,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.overrides.apply(&mut config);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let engine = StatementEngine::new(&config)?;
    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Extracting records...");

    let input = args.input.clone();
    let report = tokio::task::spawn_blocking(move || extract_file(&engine, &config, &input)).await?;
    pb.finish_and_clear();

    if let Some(reason) = &report.diagnostics.unreadable {
        anyhow::bail!("Could not read {}: {}", args.input.display(), reason);
    }

    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} {} record(s) written to {}",
            style("✓").green(),
            report.record_count(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if report.diagnostics.needs_ocr {
        eprintln!(
            "{} Very little text found; the document may be a scan.",
            style("⚠").yellow()
        );
    }
    if report.diagnostics.table_source_missing {
        eprintln!("{} Table rows were not available for this format.", style("⚠").yellow());
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}
