//! Document-level entry point: detection, header, strategy chain, report.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::assemble::DocumentContext;
use super::formats::{self, FormatSpec};
use super::header::DocumentHeader;
use super::orchestrator::{FallbackOrchestrator, Strategy};
use crate::error::{ExtractionError, Result};
use crate::models::{ParseOutcome, RawDocument, StatexConfig, TableBlock};
use crate::pdf::{TextSource, source_name};
use crate::table::TableSource;
use crate::text::{NormalizedText, TextNormalizer};

/// Per-document observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub record_count: usize,
    /// Strategy whose records were accepted.
    pub strategy: Option<Strategy>,
    /// Candidates dropped for missing mandatory fields.
    pub dropped_records: usize,
    /// The format reads tables but no table rows were found.
    pub table_source_missing: bool,
    /// Too little text to work with; the document is probably scanned.
    pub needs_ocr: bool,
    /// Why the document could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unreadable: Option<String>,
}

/// Everything extracted from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub source: String,
    /// Id of the format that was applied.
    pub format: Option<String>,
    pub header: DocumentHeader,
    pub outcome: ParseOutcome,
    pub diagnostics: Diagnostics,
}

impl DocumentReport {
    fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            format: None,
            header: DocumentHeader::new(),
            outcome: ParseOutcome::Empty,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Report for a document whose text could not be obtained.
    pub fn unreadable(source: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut report = Self::empty(source);
        report.diagnostics.unreadable = Some(reason.into());
        report
    }

    pub fn record_count(&self) -> usize {
        self.outcome.record_count()
    }

    pub fn is_unreadable(&self) -> bool {
        self.diagnostics.unreadable.is_some()
    }
}

/// Extracts records from documents.
///
/// Holds only immutable configuration, so one engine can serve many
/// documents from many threads.
#[derive(Debug, Clone)]
pub struct StatementEngine {
    formats: Vec<FormatSpec>,
    forced: Option<usize>,
    normalizer: TextNormalizer,
    use_tables: bool,
    min_text_length: usize,
    password: Option<String>,
}

impl StatementEngine {
    /// Build an engine from configuration.
    ///
    /// Fails on an invalid extra normalizer pattern or an unknown forced
    /// format id.
    pub fn new(config: &StatexConfig) -> Result<Self> {
        let mut formats = formats::registry();
        for format in &mut formats {
            let window = config.extraction.backtrack_window_for(format.id);
            format.set_backtrack_window(window);
        }

        let forced = match &config.extraction.format {
            Some(id) => Some(
                formats
                    .iter()
                    .position(|f| f.id == id.as_str())
                    .ok_or_else(|| ExtractionError::UnknownFormat(id.clone()))?,
            ),
            None => None,
        };

        let normalizer = TextNormalizer::from_config(&config.normalization)?;

        Ok(Self {
            formats,
            forced,
            normalizer,
            use_tables: config.extraction.use_tables,
            min_text_length: config.source.min_text_length,
            password: config.source.password.clone(),
        })
    }

    /// Known formats in detection order.
    pub fn formats(&self) -> &[FormatSpec] {
        &self.formats
    }

    /// The forced format, or the first whose markers match.
    pub fn detect(&self, text: &NormalizedText) -> Option<&FormatSpec> {
        match self.forced {
            Some(idx) => self.formats.get(idx),
            None => formats::detect(&self.formats, text),
        }
    }

    /// Extract records from page text. Never fails: problems end up in the
    /// report.
    pub fn extract(&self, doc: &RawDocument, tables: Option<&[TableBlock]>) -> DocumentReport {
        info!("Extracting {} ({} page(s))", doc.source, doc.page_count());

        let mut report = DocumentReport::empty(&doc.source);
        report.diagnostics.needs_ocr = doc.text_len() < self.min_text_length;

        let text = self.normalizer.normalize(doc);
        let Some(format) = self.detect(&text) else {
            debug!("No format matched {}", doc.source);
            info!("{}: no known statement format", doc.source);
            return report;
        };
        debug!("{}: detected format {}", doc.source, format.id);

        let header = format.header.extract(&text);
        let lookup = format.lookup.map(|build| build(&text)).unwrap_or_default();
        let ctx = DocumentContext::new(&doc.source, &header, &lookup);

        let tables = if self.use_tables { tables } else { None };
        let run = FallbackOrchestrator::new(format).run(&text, &ctx, tables);

        report.diagnostics.strategy = run.strategy;
        report.diagnostics.dropped_records = run.dropped;
        report.diagnostics.table_source_missing = run.table_source_missing && self.use_tables;
        report.diagnostics.record_count = run.records.len();
        report.outcome = ParseOutcome::from_records(run.records, run.dropped);
        report.format = Some(format.id.to_string());
        report.header = header;

        info!(
            "{}: {} record(s) as {} ({})",
            report.source,
            report.diagnostics.record_count,
            format.id,
            report.outcome.label()
        );
        report
    }

    /// Load a document through a text source and extract it.
    ///
    /// An unreadable document yields an empty report flagged `unreadable`.
    pub fn extract_path(
        &self,
        path: &Path,
        source: &dyn TextSource,
        tables: Option<&dyn TableSource>,
    ) -> DocumentReport {
        let doc = match source.load(path, self.password.as_deref()) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Skipping unreadable document {}: {}", path.display(), e);
                return DocumentReport::unreadable(source_name(path), e.to_string());
            }
        };

        let blocks = tables.map(|t| t.tables(&doc));
        self.extract(&doc, blocks.as_deref())
    }
}
