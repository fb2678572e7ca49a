//! Single-line record patterns.

use regex::Regex;
use tracing::trace;

use super::rules::{Candidate, FieldSet, PatternSet, RecordRecognizer};
use crate::text::{Line, NormalizedText};

/// Line range a parser is restricted to.
#[derive(Debug, Clone)]
pub struct Section {
    /// First line of the section (exclusive).
    pub start: Regex,
    /// Any of these ends the section (exclusive).
    pub end: Regex,
}

impl Section {
    pub fn new(start: &Regex, end: &Regex) -> Self {
        Self {
            start: start.clone(),
            end: end.clone(),
        }
    }

    /// Lines between the markers, or every line when the start is missing.
    pub fn slice<'a>(&self, lines: &'a [Line]) -> &'a [Line] {
        let Some(start) = lines.iter().position(|l| self.start.is_match(&l.text)) else {
            return lines;
        };
        let body = &lines[start + 1..];
        let end = body
            .iter()
            .position(|l| self.end.is_match(&l.text))
            .unwrap_or(body.len());
        &body[..end]
    }
}

/// Matches one record per normalized line.
#[derive(Debug, Clone)]
pub struct DirectRowParser {
    patterns: PatternSet,
    reject: Option<Regex>,
    section: Option<Section>,
}

impl DirectRowParser {
    pub fn new(patterns: PatternSet) -> Self {
        Self {
            patterns,
            reject: None,
            section: None,
        }
    }

    /// Lines matching `reject` (column headers, labels) are never records.
    pub fn with_reject(mut self, reject: &Regex) -> Self {
        self.reject = Some(reject.clone());
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.section = Some(section);
        self
    }

    /// Parse one line with the first pattern that matches it in full.
    pub fn parse_line(&self, line: &str) -> Option<FieldSet> {
        if self.reject.as_ref().is_some_and(|r| r.is_match(line)) {
            trace!("Rejected header line: {}", line);
            return None;
        }
        self.patterns.first_captures(line)
    }
}

impl RecordRecognizer for DirectRowParser {
    fn recognize(&self, text: &NormalizedText) -> Vec<Candidate> {
        let lines = match &self.section {
            Some(section) => section.slice(text.lines()),
            None => text.lines(),
        };

        lines
            .iter()
            .filter_map(|line| {
                self.parse_line(&line.text)
                    .map(|fields| Candidate::new(fields, line.page))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> DirectRowParser {
        let strict = Regex::new(r"^(?P<security>[A-Z ]+?) (?P<side>B|S) (?P<quantity>\d+) (?P<rate>\d+\.\d{2}) (?P<total>\d+\.\d{2})$").unwrap();
        let relaxed = Regex::new(r"^(?P<security>[A-Z ]+?) (?P<side>B|S) (?P<quantity>\d+) (?P<rate>\d+\.\d{2})").unwrap();
        let reject = Regex::new(r"(?i)Gross Rate|Net Total").unwrap();
        DirectRowParser::new(
            PatternSet::new()
                .variant("strict", &strict)
                .variant("relaxed", &relaxed),
        )
        .with_reject(&reject)
    }

    fn text_of(lines: &[&str]) -> NormalizedText {
        NormalizedText::from_lines(
            "a.pdf",
            lines
                .iter()
                .enumerate()
                .map(|(i, l)| Line { text: l.to_string(), page: i as u32 / 2 + 1 })
                .collect(),
        )
    }

    #[test]
    fn test_strict_before_relaxed() {
        let fields = parser().parse_line("TATA STEEL B 5 100.00 500.00").unwrap();
        assert_eq!(fields.variant(), Some("strict"));
        assert_eq!(fields.get("total"), Some("500.00"));

        let fields = parser().parse_line("TATA STEEL B 5 100.00").unwrap();
        assert_eq!(fields.variant(), Some("relaxed"));
        assert_eq!(fields.get("total"), None);
    }

    #[test]
    fn test_header_lines_rejected() {
        assert!(parser().parse_line("SECURITY B 1 00.00 Gross Rate").is_none());
    }

    #[test]
    fn test_recognize_with_pages() {
        let text = text_of(&["HEADER", "ITC B 1 400.00 400.00", "noise", "INFY S 2 1500.00 3000.00"]);
        let found = parser().recognize(&text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].page, 1);
        assert_eq!(found[1].page, 2);
    }

    #[test]
    fn test_section_bounds() {
        let start = Regex::new(r"^Scrip Summary").unwrap();
        let end = Regex::new(r"^Statement Of Securities").unwrap();
        let parser = parser().with_section(Section::new(&start, &end));

        let text = text_of(&[
            "ITC B 1 400.00 400.00",
            "Scrip Summary",
            "INFY S 2 1500.00 3000.00",
            "Statement Of Securities",
            "WIPRO B 3 400.00 1200.00",
        ]);
        let found = parser.recognize(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fields.get("security"), Some("INFY"));
    }
}
