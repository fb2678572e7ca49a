//! Global anchor scanning and table rows.
//!
//! When a layout has no reliable line structure, records are located by a
//! uniquely shaped token (an instrument identifier). The text around each
//! occurrence is sliced into a chunk and parsed on its own; context printed
//! ahead of the record can be recovered with a [`ContextBacktracker`].

use regex::Regex;
use tracing::{debug, trace};

use super::backtrack::ContextBacktracker;
use super::classify::LineClassifier;
use super::rules::{Candidate, FieldSet, PatternSet, RecordRecognizer};
use crate::models::TableBlock;
use crate::text::{NormalizedText, View};

/// How a chunk is cut around an anchor occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSpan {
    /// From the anchor start to the next anchor start.
    FollowingAnchor,
    /// From the previous anchor end to this anchor end.
    PrecedingAnchor,
}

/// Parses one chunk into fields.
#[derive(Debug, Clone)]
pub enum ChunkGrammar {
    /// First matching variant; the record starts where the match starts.
    Patterns(PatternSet),
    /// Custom parser for chunks that need positional splitting.
    Parser(fn(&str) -> Option<FieldSet>),
}

impl ChunkGrammar {
    /// Fields and the byte offset in `chunk` where the record starts.
    pub fn parse(&self, chunk: &str) -> Option<(usize, FieldSet)> {
        match self {
            Self::Patterns(patterns) => patterns
                .first_captures_at(chunk)
                .map(|(start, _, fields)| (start, fields)),
            Self::Parser(parse) => parse(chunk).map(|fields| (0, fields)),
        }
    }
}

/// A bound field must contain a classification keyword.
#[derive(Debug, Clone)]
struct KeywordFilter {
    field: &'static str,
    keywords: Regex,
}

impl KeywordFilter {
    fn keeps(&self, fields: &FieldSet) -> bool {
        fields
            .get(self.field)
            .is_some_and(|value| self.keywords.is_match(value))
    }
}

/// Anchor-driven recognition over flowing text.
#[derive(Debug, Clone)]
pub struct AnchorScan {
    classifier: LineClassifier,
    span: ChunkSpan,
    grammar: ChunkGrammar,
    anchor_field: Option<&'static str>,
    filter: Option<KeywordFilter>,
    backtracker: Option<ContextBacktracker>,
    view: View,
}

impl AnchorScan {
    pub fn new(anchor: &Regex, span: ChunkSpan, grammar: ChunkGrammar) -> Self {
        Self {
            classifier: LineClassifier::new(anchor),
            span,
            grammar,
            anchor_field: None,
            filter: None,
            backtracker: None,
            view: View::Flat,
        }
    }

    /// Bind the anchor token itself to `field` unless the grammar already did.
    pub fn with_anchor_field(mut self, field: &'static str) -> Self {
        self.anchor_field = Some(field);
        self
    }

    /// Discard chunks whose `field` has no match for `keywords`.
    pub fn with_keywords(mut self, field: &'static str, keywords: &Regex) -> Self {
        self.filter = Some(KeywordFilter {
            field,
            keywords: keywords.clone(),
        });
        self
    }

    pub fn with_backtracker(mut self, backtracker: ContextBacktracker) -> Self {
        self.backtracker = Some(backtracker);
        self
    }

    pub fn with_view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    pub fn backtracker(&self) -> Option<&ContextBacktracker> {
        self.backtracker.as_ref()
    }

    /// Replace the look-back size of the attached backtracker.
    pub fn set_window(&mut self, window: usize) {
        if let Some(backtracker) = self.backtracker.take() {
            self.backtracker = Some(backtracker.with_window(window));
        }
    }

    /// Byte ranges of every chunk in `text`, with the anchor span of each.
    pub fn chunks(&self, text: &str) -> Vec<((usize, usize), (usize, usize))> {
        let anchors = self.classifier.anchor_spans(text);
        anchors
            .iter()
            .enumerate()
            .map(|(i, &(start, end))| {
                let range = match self.span {
                    ChunkSpan::FollowingAnchor => {
                        let next = anchors.get(i + 1).map(|a| a.0).unwrap_or(text.len());
                        (start, next)
                    }
                    ChunkSpan::PrecedingAnchor => {
                        let prev = if i == 0 { 0 } else { anchors[i - 1].1 };
                        (prev, end)
                    }
                };
                (range, (start, end))
            })
            .collect()
    }
}

impl RecordRecognizer for AnchorScan {
    fn recognize(&self, text: &NormalizedText) -> Vec<Candidate> {
        let view = text.view(self.view);
        let mut found = Vec::new();

        for ((chunk_start, chunk_end), (anchor_start, anchor_end)) in self.chunks(view) {
            let chunk = &view[chunk_start..chunk_end];
            let Some((offset, mut fields)) = self.grammar.parse(chunk) else {
                trace!("Chunk at {} did not parse", anchor_start);
                continue;
            };

            if let Some(filter) = &self.filter {
                if !filter.keeps(&fields) {
                    debug!("Chunk at {} lacks a {} keyword, discarded", anchor_start, filter.field);
                    continue;
                }
            }

            if let Some(field) = self.anchor_field {
                if !fields.contains(field) {
                    fields.insert(field, &view[anchor_start..anchor_end]);
                }
            }

            if let Some(backtracker) = &self.backtracker {
                let context = backtracker.resolve(view, chunk_start + offset);
                fields.merge_missing(&context);
            }

            found.push(Candidate::new(fields, text.page_at(self.view, anchor_start)));
        }

        found
    }
}

/// Recognition over table rows supplied by a table source.
#[derive(Debug, Clone)]
pub struct TableStrategy {
    anchor: Regex,
    reject: Option<Regex>,
    grammar: ChunkGrammar,
    anchor_field: &'static str,
}

impl TableStrategy {
    /// `anchor` must match a whole cell; the anchor cell and every cell after
    /// it are joined and parsed by `grammar`.
    pub fn new(anchor: &Regex, anchor_field: &'static str, grammar: ChunkGrammar) -> Self {
        Self {
            anchor: anchor.clone(),
            reject: None,
            grammar,
            anchor_field,
        }
    }

    /// Rows whose joined text matches `reject` are column headers.
    pub fn with_reject(mut self, reject: &Regex) -> Self {
        self.reject = Some(reject.clone());
        self
    }

    pub fn scan(&self, tables: &[TableBlock]) -> Vec<Candidate> {
        let mut found = Vec::new();

        for block in tables {
            for row in &block.rows {
                let cells: Vec<String> = row
                    .iter()
                    .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
                    .filter(|c| !c.is_empty())
                    .collect();
                if cells.is_empty() {
                    continue;
                }

                let joined = cells.join(" ");
                if self.reject.as_ref().is_some_and(|r| r.is_match(&joined)) {
                    trace!("Rejected table header row: {}", joined);
                    continue;
                }

                let Some(idx) = cells.iter().position(|c| self.anchor.is_match(c)) else {
                    continue;
                };

                let chunk = cells[idx..].join(" ");
                if let Some((_, mut fields)) = self.grammar.parse(&chunk) {
                    if !fields.contains(self.anchor_field) {
                        fields.insert(self.anchor_field, &cells[idx]);
                    }
                    found.push(Candidate::new(fields, block.page));
                }
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::backtrack::ContextField;
    use crate::statement::rules::patterns::{ISIN, ISIN_CELL};
    use crate::text::Line;

    fn flat(source: &str, lines: &[(&str, u32)]) -> NormalizedText {
        NormalizedText::from_lines(
            source,
            lines
                .iter()
                .map(|(t, p)| Line { text: t.to_string(), page: *p })
                .collect(),
        )
    }

    fn nature_after_isin(chunk: &str) -> Option<FieldSet> {
        let words: Vec<&str> = chunk.split_whitespace().skip(1).collect();
        let mut fields = FieldSet::new();
        fields.insert("nature", words.first()?);
        fields.insert("amount", words.last()?);
        Some(fields)
    }

    #[test]
    fn test_global_scan_filters_by_keyword() {
        let keywords = Regex::new(r"(?i)dividend|bonus").unwrap();
        let scan = AnchorScan::new(&ISIN, ChunkSpan::FollowingAnchor, ChunkGrammar::Parser(nature_after_isin))
            .with_anchor_field("isin")
            .with_keywords("nature", &keywords);

        let text = flat(
            "div.pdf",
            &[
                ("INE040A01034 Dividend 100", 1),
                ("INE002A01018 Bonus 0", 1),
                ("INE009A01021 Holding 5", 2),
                ("INE062A01020 Dividend 240", 2),
            ],
        );

        assert_eq!(scan.chunks(text.flat()).len(), 4);

        let found = scan.recognize(&text);
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].fields.get("isin"), Some("INE040A01034"));
        assert_eq!(found[2].fields.get("isin"), Some("INE062A01020"));
        assert_eq!(found[2].fields.get("amount"), Some("240"));
        assert_eq!(found[2].page, 2);
    }

    #[test]
    fn test_preceding_chunks_with_backtracker() {
        let tail = Regex::new(r"(?P<security>[A-Z][A-Z ]*?) (?P<side>B|S) (?P<quantity>\d+) (?P<isin>IN[A-Z0-9]{9}\d)$").unwrap();
        let contract = Regex::new(r"ISEC/\S+").unwrap();
        let scan = AnchorScan::new(
            &ISIN,
            ChunkSpan::PrecedingAnchor,
            ChunkGrammar::Patterns(PatternSet::new().variant("tail", &tail)),
        )
        .with_backtracker(ContextBacktracker::new(vec![ContextField::new(
            "contract_no",
            PatternSet::new().variant("isec", &contract),
        )]));

        let text = flat(
            "eq.pdf",
            &[
                ("ISEC/1 09:15 RELIANCE B 10 INE002A01018", 1),
                ("ISEC/2 10:00 INFY S 5 INE009A01021", 1),
            ],
        );
        let found = scan.recognize(&text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].fields.get("security"), Some("RELIANCE"));
        assert_eq!(found[0].fields.get("contract_no"), Some("ISEC/1"));
        assert_eq!(found[1].fields.get("security"), Some("INFY"));
        assert_eq!(found[1].fields.get("contract_no"), Some("ISEC/2"));
    }

    #[test]
    fn test_table_rows() {
        let reject = Regex::new(r"Scrip Name|ISIN.*Record Date").unwrap();
        let strategy = TableStrategy::new(&ISIN_CELL, "isin", ChunkGrammar::Parser(nature_after_isin))
            .with_reject(&reject);

        let tables = vec![
            TableBlock::new(3)
                .with_row(["ISIN", "Scrip Name", "Record Date"])
                .with_row(["1", "INE040A01034", "Dividend", " 100 "])
                .with_row(["no anchor here"]),
        ];

        let found = strategy.scan(&tables);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].page, 3);
        assert_eq!(found[0].fields.get("isin"), Some("INE040A01034"));
        assert_eq!(found[0].fields.get("amount"), Some("100"));
    }
}
