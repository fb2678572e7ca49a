//! Batch command - extract many statements into per-kind CSV files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, warn};

use statex_core::StatementEngine;
use statex_core::models::StatexConfig;
use statex_core::statement::DocumentReport;

use super::{ExtractionOverrides, extract_file, load_config};
use crate::output::{group_by_kind, sort_records, write_csv};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers (default: config, 0 = all cores)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    overrides: ExtractionOverrides,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.overrides.apply(&mut config);
    if let Some(jobs) = args.jobs {
        config.batch.jobs = jobs;
    }
    if args.continue_on_error {
        config.batch.continue_on_error = true;
    }

    let files = discover(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let engine = Arc::new(StatementEngine::new(&config)?);
    let config = Arc::new(config);
    let reports = extract_all(engine, Arc::clone(&config), &files).await?;

    let unreadable: Vec<_> = reports.iter().filter(|r| r.is_unreadable()).collect();
    let mut records = Vec::new();
    for report in &reports {
        records.extend(report.outcome.records().iter().cloned());
    }
    sort_records(&mut records);

    let record_total = records.len();
    for (kind, group) in group_by_kind(records) {
        let output_path = args.output_dir.join(format!("{}.csv", kind.as_str()));
        write_csv(fs::File::create(&output_path)?, kind, &group)?;
        println!(
            "{} {} {} record(s) written to {}",
            style("✓").green(),
            group.len(),
            kind.as_str(),
            output_path.display()
        );
    }

    if args.summary {
        let summary_path = args.output_dir.join("summary.csv");
        write_summary(&summary_path, &reports)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        reports.len(),
        start.elapsed()
    );
    println!(
        "   {} records, {} unreadable",
        style(record_total).green(),
        style(unreadable.len()).red()
    );

    if !unreadable.is_empty() {
        println!();
        println!("{}", style("Unreadable files:").red());
        for report in &unreadable {
            println!(
                "  - {}: {}",
                report.source,
                report.diagnostics.unreadable.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if unreadable.len() == reports.len() {
        anyhow::bail!("None of the {} files could be read", reports.len());
    }

    Ok(())
}

/// Expand the glob, keeping files a text source exists for.
fn discover(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt" | "text")
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Run the engine over every file with at most `effective_jobs` in flight.
/// Reports come back in input order.
async fn extract_all(
    engine: Arc<StatementEngine>,
    config: Arc<StatexConfig>,
    files: &[PathBuf],
) -> anyhow::Result<Vec<DocumentReport>> {
    let jobs = config.batch.effective_jobs();
    debug!("Running with {} workers", jobs);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(jobs));
    let (tx, mut rx) = mpsc::channel::<(usize, DocumentReport)>(jobs * 2);

    for (idx, path) in files.iter().cloned().enumerate() {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let engine = Arc::clone(&engine);
        let config = Arc::clone(&config);
        let tx = tx.clone();

        tokio::spawn(async move {
            let task_path = path.clone();
            let report = tokio::task::spawn_blocking(move || extract_file(&engine, &config, &task_path))
                .await
                .unwrap_or_else(|e| DocumentReport::unreadable(file_label(&path), e.to_string()));
            drop(permit);
            if tx.send((idx, report)).await.is_err() {
                debug!("Result sink closed before {}", path.display());
            }
        });
    }
    drop(tx);

    let mut slots: Vec<Option<DocumentReport>> = vec![None; files.len()];
    while let Some((idx, report)) = rx.recv().await {
        if let Some(reason) = &report.diagnostics.unreadable {
            if config.batch.continue_on_error {
                warn!("Failed to read {}: {}", files[idx].display(), reason);
            } else {
                error!("Failed to read {}: {}", files[idx].display(), reason);
                pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", files[idx].display(), reason);
            }
        }
        slots[idx] = Some(report);
        pb.inc(1);
    }
    pb.finish_with_message("Complete");

    Ok(slots.into_iter().flatten().collect())
}

fn file_label(path: &Path) -> String {
    statex_core::pdf::source_name(path)
}

fn write_summary(path: &Path, reports: &[DocumentReport]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "source",
        "format",
        "outcome",
        "records",
        "dropped",
        "strategy",
        "table_source_missing",
        "needs_ocr",
        "error",
    ])?;

    for report in reports {
        let diagnostics = &report.diagnostics;
        wtr.write_record([
            report.source.clone(),
            report.format.clone().unwrap_or_default(),
            report.outcome.label().to_string(),
            report.record_count().to_string(),
            diagnostics.dropped_records.to_string(),
            diagnostics.strategy.map(|s| s.as_str().to_string()).unwrap_or_default(),
            diagnostics.table_source_missing.to_string(),
            diagnostics.needs_ocr.to_string(),
            diagnostics.unreadable.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
