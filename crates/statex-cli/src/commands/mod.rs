//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod extract;
pub mod formats;

use std::path::{Path, PathBuf};

use tracing::debug;

use statex_core::StatementEngine;
use statex_core::models::StatexConfig;
use statex_core::pdf::{self, source_name};
use statex_core::statement::DocumentReport;
use statex_core::table::{GapTableSource, TableSource};

/// `<config dir>/statex/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("statex")
        .join("config.json")
}

/// The file `config` subcommands read and write.
pub fn config_file(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load `--config`, else the default file when present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<StatexConfig> {
    if let Some(path) = config_path {
        return Ok(StatexConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config {}", default_path.display());
        return Ok(StatexConfig::from_file(&default_path)?);
    }
    Ok(StatexConfig::default())
}

/// Flags shared by `extract` and `batch` that override the config file.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ExtractionOverrides {
    /// Statement format id, skipping detection (see `statex formats`)
    #[arg(long)]
    statement: Option<String>,

    /// Password for encrypted documents
    #[arg(long)]
    password: Option<String>,

    /// Ignore table rows and match text only
    #[arg(long)]
    no_tables: bool,
}

impl ExtractionOverrides {
    pub fn apply(&self, config: &mut StatexConfig) {
        if let Some(id) = &self.statement {
            config.extraction.format = Some(id.clone());
        }
        if let Some(password) = &self.password {
            config.source.password = Some(password.clone());
        }
        if self.no_tables {
            config.extraction.use_tables = false;
        }
    }
}

/// Read and extract one file. Problems opening it end up in the report.
pub fn extract_file(engine: &StatementEngine, config: &StatexConfig, path: &Path) -> DocumentReport {
    let source = match pdf::source_for(path, &config.source) {
        Ok(source) => source,
        Err(e) => return DocumentReport::unreadable(source_name(path), e.to_string()),
    };
    let tables = GapTableSource::new(config.extraction.min_table_cells);
    engine.extract_path(path, source.as_ref(), Some(&tables as &dyn TableSource))
}
