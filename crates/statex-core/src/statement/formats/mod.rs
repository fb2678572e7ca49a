//! Statement formats.
//!
//! A format is data: detection markers, header rules, the recognizers each
//! strategy step may use, summary rules and an assembler. Vendors differ only
//! in these values; the strategy chain and assembly flow are shared.

mod epf;
mod geojit;
mod icici;
mod icici_dividend;
mod iifl;
mod lic;

use std::collections::BTreeMap;

use regex::Regex;

use super::anchor::{AnchorScan, TableStrategy};
use super::assemble::Assembler;
use super::direct::DirectRowParser;
use super::header::HeaderExtractor;
use super::orchestrator::{Strategy, SummaryRule};
use super::window::WindowedReconstructor;
use crate::text::NormalizedText;

/// Builds a document-wide lookup table from the text.
pub type LookupBuilder = fn(&NormalizedText) -> BTreeMap<String, String>;

/// One statement layout.
#[derive(Debug, Clone)]
pub struct FormatSpec {
    /// Stable identifier used in config and output.
    pub id: &'static str,
    pub name: &'static str,
    /// The format applies when any marker matches the text.
    pub markers: Vec<Regex>,
    pub header: HeaderExtractor,
    pub table: Option<TableStrategy>,
    pub direct: Option<DirectRowParser>,
    pub windowed: Option<WindowedReconstructor>,
    pub anchor: Option<AnchorScan>,
    /// Build one record from the header alone when nothing else matched.
    pub header_record: bool,
    pub summaries: Vec<SummaryRule>,
    pub lookup: Option<LookupBuilder>,
    pub assemble: Assembler,
}

impl FormatSpec {
    pub fn new(id: &'static str, name: &'static str, assemble: Assembler) -> Self {
        Self {
            id,
            name,
            markers: Vec::new(),
            header: HeaderExtractor::default(),
            table: None,
            direct: None,
            windowed: None,
            anchor: None,
            header_record: false,
            summaries: Vec::new(),
            lookup: None,
            assemble,
        }
    }

    pub fn with_marker(mut self, marker: &Regex) -> Self {
        self.markers.push(marker.clone());
        self
    }

    pub fn with_header(mut self, header: HeaderExtractor) -> Self {
        self.header = header;
        self
    }

    pub fn with_table(mut self, table: TableStrategy) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_direct(mut self, direct: DirectRowParser) -> Self {
        self.direct = Some(direct);
        self
    }

    pub fn with_windowed(mut self, windowed: WindowedReconstructor) -> Self {
        self.windowed = Some(windowed);
        self
    }

    pub fn with_anchor(mut self, anchor: AnchorScan) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_header_record(mut self) -> Self {
        self.header_record = true;
        self
    }

    pub fn with_summary(mut self, summary: SummaryRule) -> Self {
        self.summaries.push(summary);
        self
    }

    pub fn with_lookup(mut self, lookup: LookupBuilder) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Set the look-back size of the anchor scan's backtracker, if any.
    pub fn set_backtrack_window(&mut self, window: usize) {
        if let Some(anchor) = &mut self.anchor {
            anchor.set_window(window);
        }
    }

    pub fn matches(&self, text: &NormalizedText) -> bool {
        self.markers.iter().any(|m| m.is_match(text.text()))
    }

    /// Strategy steps this format can run, in chain order.
    pub fn strategies(&self) -> Vec<Strategy> {
        Strategy::ORDER
            .into_iter()
            .filter(|s| match s {
                Strategy::Table => self.table.is_some(),
                Strategy::DirectLine => self.direct.is_some(),
                Strategy::Windowed => self.windowed.is_some(),
                Strategy::AnchorScan => self.anchor.is_some(),
                Strategy::HeaderRecord => self.header_record,
            })
            .collect()
    }
}

/// Every known format in detection order.
///
/// The dividend report comes before the transaction statement of the same
/// broker because both carry the broker's markers.
pub fn registry() -> Vec<FormatSpec> {
    vec![
        icici_dividend::format(),
        icici::format(),
        iifl::format(),
        geojit::format(),
        epf::format(),
        lic::format(),
    ]
}

/// First format in `formats` whose markers match.
pub fn detect<'f>(formats: &'f [FormatSpec], text: &NormalizedText) -> Option<&'f FormatSpec> {
    formats.iter().find(|f| f.matches(text))
}

/// Normalize pages and run a format end to end.
#[cfg(test)]
pub(crate) fn run_pages(
    format: &FormatSpec,
    source: &str,
    pages: &[&str],
) -> (super::header::DocumentHeader, super::orchestrator::StrategyRun) {
    use super::assemble::DocumentContext;
    use super::orchestrator::FallbackOrchestrator;
    use crate::models::RawDocument;
    use crate::text::TextNormalizer;

    let text = TextNormalizer::new().normalize(&RawDocument::from_pages(source, pages.iter().copied()));
    let header = format.header.extract(&text);
    let lookup = format.lookup.map(|build| build(&text)).unwrap_or_default();
    let ctx = DocumentContext::new(source, &header, &lookup);
    let run = FallbackOrchestrator::new(format).run(&text, &ctx, None);
    (header, run)
}
