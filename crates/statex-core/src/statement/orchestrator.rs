//! Strategy selection for one document.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::assemble::{Assembler, DocumentContext};
use super::formats::FormatSpec;
use super::rules::{Candidate, FieldSet, PatternSet, RecordRecognizer};
use crate::models::{Provenance, TableBlock, TransactionRecord};
use crate::text::{NormalizedText, View};

/// One step of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Rows from a table source.
    Table,
    /// One record per normalized line.
    DirectLine,
    /// Records spread over a fixed run of lines.
    Windowed,
    /// Records located by anchor tokens in flowing text.
    AnchorScan,
    /// A single record built from header fields.
    HeaderRecord,
}

impl Strategy {
    /// Chain order.
    pub const ORDER: [Strategy; 5] = [
        Strategy::Table,
        Strategy::DirectLine,
        Strategy::Windowed,
        Strategy::AnchorScan,
        Strategy::HeaderRecord,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::DirectLine => "direct_line",
            Self::Windowed => "windowed",
            Self::AnchorScan => "anchor_scan",
            Self::HeaderRecord => "header_record",
        }
    }
}

/// A document-level record matched independently of the strategy chain.
#[derive(Debug, Clone)]
pub struct SummaryRule {
    pub name: &'static str,
    pub patterns: PatternSet,
    /// Keep every match of the winning variant rather than only the first.
    pub all: bool,
    pub view: View,
    pub assemble: Assembler,
}

impl SummaryRule {
    pub fn new(name: &'static str, patterns: PatternSet, assemble: Assembler) -> Self {
        Self {
            name,
            patterns,
            all: false,
            view: View::Flat,
            assemble,
        }
    }

    pub fn all_matches(mut self) -> Self {
        self.all = true;
        self
    }

    pub fn with_view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    pub fn candidates(&self, text: &NormalizedText) -> Vec<Candidate> {
        let haystack = text.view(self.view);
        let hits = if self.all {
            self.patterns.all_captures(haystack)
        } else {
            self.patterns
                .first_captures_at(haystack)
                .map(|(start, _, fields)| vec![(start, fields)])
                .unwrap_or_default()
        };

        hits.into_iter()
            .map(|(start, fields)| Candidate::new(fields, text.page_at(self.view, start)))
            .collect()
    }
}

/// Result of running the chain on one document.
#[derive(Debug, Clone, Default)]
pub struct StrategyRun {
    /// The step whose records were accepted.
    pub strategy: Option<Strategy>,
    pub records: Vec<TransactionRecord>,
    /// Candidates lacking mandatory fields: those of the accepted step, or of
    /// every step tried when none was accepted, plus summaries.
    pub dropped: usize,
    /// The format reads tables but the table step yielded no candidates,
    /// either because no table source was supplied or because it found none.
    pub table_source_missing: bool,
}

/// Runs a format's strategies in fixed priority order.
pub struct FallbackOrchestrator<'f> {
    format: &'f FormatSpec,
}

impl<'f> FallbackOrchestrator<'f> {
    pub fn new(format: &'f FormatSpec) -> Self {
        Self { format }
    }

    /// Accept the first step that assembles at least one record, then append
    /// summary records.
    pub fn run(
        &self,
        text: &NormalizedText,
        ctx: &DocumentContext<'_>,
        tables: Option<&[TableBlock]>,
    ) -> StrategyRun {
        let mut run = StrategyRun::default();
        let mut rejected = 0;

        for strategy in Strategy::ORDER {
            let candidates = match strategy {
                Strategy::Table => match &self.format.table {
                    Some(rule) => {
                        let candidates = tables.map(|tables| rule.scan(tables)).unwrap_or_default();
                        run.table_source_missing = candidates.is_empty();
                        candidates
                    }
                    None => continue,
                },
                Strategy::DirectLine => match &self.format.direct {
                    Some(direct) => direct.recognize(text),
                    None => continue,
                },
                Strategy::Windowed => match &self.format.windowed {
                    Some(windowed) => windowed.recognize(text),
                    None => continue,
                },
                Strategy::AnchorScan => match &self.format.anchor {
                    Some(anchor) => anchor.recognize(text),
                    None => continue,
                },
                Strategy::HeaderRecord if self.format.header_record => {
                    vec![Candidate::new(FieldSet::new(), 1)]
                }
                Strategy::HeaderRecord => continue,
            };

            if candidates.is_empty() {
                debug!("{}: no candidates via {}", self.format.id, strategy.as_str());
                continue;
            }

            let (records, dropped) = self.assemble(candidates, self.format.assemble, ctx);
            if records.is_empty() {
                debug!(
                    "{}: {} candidate(s) via {} lacked mandatory fields",
                    self.format.id,
                    dropped,
                    strategy.as_str()
                );
                rejected += dropped;
                continue;
            }

            debug!(
                "{}: accepted {} record(s) via {}",
                self.format.id,
                records.len(),
                strategy.as_str()
            );
            run.strategy = Some(strategy);
            run.records = records;
            run.dropped = dropped;
            break;
        }
        if run.strategy.is_none() {
            run.dropped = rejected;
        }

        for summary in &self.format.summaries {
            let candidates = summary.candidates(text);
            trace!("{}: summary {} matched {} time(s)", self.format.id, summary.name, candidates.len());
            let (records, dropped) = self.assemble(candidates, summary.assemble, ctx);
            run.records.extend(records);
            run.dropped += dropped;
        }

        run
    }

    fn assemble(
        &self,
        candidates: Vec<Candidate>,
        assemble: Assembler,
        ctx: &DocumentContext<'_>,
    ) -> (Vec<TransactionRecord>, usize) {
        let mut records = Vec::with_capacity(candidates.len());
        let mut dropped = 0;

        for candidate in candidates {
            let body = assemble(&candidate.fields, ctx);
            match body.check_mandatory() {
                Ok(()) => records.push(TransactionRecord {
                    provenance: Provenance::new(ctx.source, candidate.page),
                    format: self.format.id.to_string(),
                    body,
                }),
                Err(e) => {
                    debug!("Dropped candidate on page {}: {}", candidate.page, e);
                    dropped += 1;
                }
            }
        }

        (records, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use regex::Regex;

    use crate::models::{RecordBody, Side, TradeRecord};
    use crate::statement::anchor::{AnchorScan, ChunkGrammar, ChunkSpan, TableStrategy};
    use crate::statement::direct::DirectRowParser;
    use crate::statement::header::DocumentHeader;
    use crate::statement::rules::patterns::{ISIN, ISIN_CELL};
    use crate::text::Line;

    fn trade(fields: &FieldSet, _ctx: &DocumentContext<'_>) -> RecordBody {
        RecordBody::Trade(TradeRecord {
            security: fields.text("security"),
            isin: fields.text("isin"),
            side: fields.get("side").and_then(Side::from_token),
            quantity: fields.quantity("quantity"),
            ..Default::default()
        })
    }

    fn side_after_isin(chunk: &str) -> Option<FieldSet> {
        let mut words = chunk.split_whitespace();
        let mut fields = FieldSet::new();
        fields.insert("isin", words.next()?);
        fields.insert("side", words.next()?);
        fields.insert("quantity", words.next()?);
        Some(fields)
    }

    fn format() -> FormatSpec {
        let row = Regex::new(r"^(?P<security>[A-Z ]+?) (?P<side>B|S|X) (?P<quantity>\d+)$").unwrap();
        FormatSpec::new("test", "Test", trade)
            .with_table(TableStrategy::new(&ISIN_CELL, "isin", ChunkGrammar::Parser(side_after_isin)))
            .with_direct(DirectRowParser::new(PatternSet::new().variant("row", &row)))
            .with_anchor(AnchorScan::new(&ISIN, ChunkSpan::FollowingAnchor, ChunkGrammar::Parser(side_after_isin)))
    }

    fn text_of(lines: &[&str]) -> NormalizedText {
        NormalizedText::from_lines(
            "a.pdf",
            lines
                .iter()
                .map(|t| Line { text: t.to_string(), page: 1 })
                .collect(),
        )
    }

    fn run(format: &FormatSpec, text: &NormalizedText, tables: Option<&[TableBlock]>) -> StrategyRun {
        let header = DocumentHeader::new();
        let lookup = BTreeMap::new();
        let ctx = DocumentContext::new("a.pdf", &header, &lookup);
        FallbackOrchestrator::new(format).run(text, &ctx, tables)
    }

    #[test]
    fn test_table_result_suppresses_later_steps() {
        let format = format();
        let text = text_of(&["ITC B 10", "INFY S 5", "WIPRO B 1"]);
        let tables = vec![TableBlock::new(2).with_row(["INE002A01018", "B", "7"])];

        let result = run(&format, &text, Some(tables.as_slice()));
        assert_eq!(result.strategy, Some(Strategy::Table));
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].provenance.page, 2);
        assert!(!result.table_source_missing);
    }

    #[test]
    fn test_missing_table_source_falls_through() {
        let format = format();
        let text = text_of(&["ITC B 10", "INFY S 5"]);

        let result = run(&format, &text, None);
        assert_eq!(result.strategy, Some(Strategy::DirectLine));
        assert_eq!(result.records.len(), 2);
        assert!(result.table_source_missing);
    }

    #[test]
    fn test_anchor_scan_when_lines_do_not_match() {
        let format = format();
        let text = text_of(&["Holding INE002A01018 B", "7 and INE009A01021 S 3"]);

        let result = run(&format, &text, Some(&[][..]));
        assert_eq!(result.strategy, Some(Strategy::AnchorScan));
        assert_eq!(result.records.len(), 2);
        assert!(result.table_source_missing);
    }

    #[test]
    fn test_header_only_table_counts_as_missing() {
        let format = format();
        let text = text_of(&["ITC B 10"]);
        let tables = vec![TableBlock::new(1).with_row(["ISIN", "Side", "Qty"])];

        let result = run(&format, &text, Some(tables.as_slice()));
        assert_eq!(result.strategy, Some(Strategy::DirectLine));
        assert!(result.table_source_missing);
    }

    #[test]
    fn test_drops_reported_when_no_step_wins() {
        let format = format();
        let text = text_of(&["ITC X 10", "INFY X 5"]);

        let result = run(&format, &text, None);
        assert_eq!(result.strategy, None);
        assert!(result.records.is_empty());
        assert_eq!(result.dropped, 2);
    }

    #[test]
    fn test_dropped_records_counted() {
        let format = format();
        let text = text_of(&["ITC B 10", "INFY X 5"]);

        let result = run(&format, &text, None);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.dropped, 1);
    }

    #[test]
    fn test_nothing_found() {
        let format = format();
        let result = run(&format, &text_of(&["nothing here"]), None);
        assert_eq!(result.strategy, None);
        assert!(result.records.is_empty());
        assert_eq!(result.dropped, 0);
    }
}
