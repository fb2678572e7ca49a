//! Text normalization: whitespace canonicalization and artifact repair.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use super::{Line, NormalizedText};
use crate::error::ExtractionError;
use crate::models::config::NormalizationConfig;
use crate::models::document::RawDocument;

/// Built-in repairs as (pattern, replacement) pairs, applied in order.
const REPAIRS: &[(&str, &str)] = &[
    // Line breaks
    (r"\r\n?|\x0c", "\n"),
    // Non-standard spaces
    (r"[\t\x0b\x{00a0}\x{2000}-\x{200a}\x{202f}\x{205f}\x{3000}]", " "),
    (r"[\x{200b}\x{00ad}\x{feff}\x{fffd}]", ""),
    // UTF-8 read as Latin-1
    (r"â€™|â€˜", "'"),
    (r"â€œ|â€\x{9d}", "\""),
    (r"â€“|â€”", "-"),
    (r"â‚¹", "₹"),
    (r"Â ", " "),
    // Legacy-font labels on provident fund passbooks
    (r"lnL; vkbZMh@uke \|", ""),
    (r"tUe frfFk \|", ""),
    // Glued tokens
    (r"(\d)(ISIN\b)", "$1 $2"),
    (r"(\d{4})(IN[A-Z0-9]{9}\d\b)", "$1 $2"),
    (r"\b(\d{2}[-/.]\d{2}[-/.]\d{4})([A-Za-z])", "$1 $2"),
    (r"\b(\d{2}-[A-Za-z]{3}-\d{4})([A-Za-z])", "$1 $2"),
];

lazy_static! {
    static ref BUILTIN: Vec<Replacement> = REPAIRS
        .iter()
        .map(|(pattern, replacement)| Replacement {
            name: (*pattern).to_string(),
            pattern: Regex::new(pattern).unwrap(),
            replacement: (*replacement).to_string(),
        })
        .collect();
}

/// One text repair.
#[derive(Debug, Clone)]
pub struct Replacement {
    name: String,
    pattern: Regex,
    replacement: String,
}

impl Replacement {
    /// Compile a repair; invalid patterns are reported, not ignored.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, ExtractionError> {
        let regex = Regex::new(pattern).map_err(|e| ExtractionError::InvalidPattern {
            name: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            name: pattern.to_string(),
            pattern: regex,
            replacement: replacement.to_string(),
        })
    }

    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }
}

/// Turns raw page text into [`NormalizedText`].
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    extra: Vec<Replacement>,
}

impl TextNormalizer {
    /// Create a normalizer with the built-in repair table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add repairs applied after the built-in table.
    pub fn with_replacements(mut self, extra: Vec<Replacement>) -> Self {
        self.extra.extend(extra);
        self
    }

    /// Create a normalizer with the configured extra repairs.
    pub fn from_config(config: &NormalizationConfig) -> Result<Self, ExtractionError> {
        let extra = config
            .replacements
            .iter()
            .map(|r| Replacement::new(&r.pattern, &r.replacement))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new().with_replacements(extra))
    }

    /// Apply the repair table to a block of text.
    pub fn repair(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in BUILTIN.iter().chain(self.extra.iter()) {
            if rule.pattern.is_match(&out) {
                trace!("Applying repair {}", rule.name);
                out = rule.apply(&out);
            }
        }
        out
    }

    /// Normalize every page of a document.
    ///
    /// Horizontal whitespace collapses to one space, lines are trimmed and
    /// blank lines disappear. Never fails: unusable input yields no lines.
    pub fn normalize(&self, doc: &RawDocument) -> NormalizedText {
        let mut lines = Vec::new();

        for page in &doc.pages {
            let repaired = self.repair(&page.text);
            for raw in repaired.split('\n') {
                let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                if !text.is_empty() {
                    lines.push(Line {
                        text,
                        page: page.number,
                    });
                }
            }
        }

        NormalizedText::from_lines(doc.source.clone(), lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines_of(text: &NormalizedText) -> Vec<&str> {
        text.lines().iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_whitespace_collapse() {
        let doc = RawDocument::from_pages("a.pdf", ["  A\u{00a0}\u{00a0}B\t C \r\n\n\n\nD  "]);
        let text = TextNormalizer::new().normalize(&doc);
        assert_eq!(lines_of(&text), vec!["A B C", "D"]);
    }

    #[test]
    fn test_glued_date_repair() {
        let doc = RawDocument::from_pages("a.pdf", ["Trade Date 01-04-2022Settlement No 2022066"]);
        let text = TextNormalizer::new().normalize(&doc);
        assert_eq!(text.text(), "Trade Date 01-04-2022 Settlement No 2022066");
    }

    #[test]
    fn test_glued_isin_repair() {
        let doc = RawDocument::from_pages("a.pdf", ["Aug 12, 2025ISIN INE040A01034", "Sep 01, 2025INE002A01018"]);
        let text = TextNormalizer::new().normalize(&doc);
        assert_eq!(
            lines_of(&text),
            vec!["Aug 12, 2025 ISIN INE040A01034", "Sep 01, 2025 INE002A01018"]
        );
    }

    #[test]
    fn test_passbook_artifacts_removed() {
        let doc = RawDocument::from_pages(
            "a.pdf",
            ["Establishment ID/Name lnL; vkbZMh@uke | MHBAN0012345000 / ACME LTD"],
        );
        let text = TextNormalizer::new().normalize(&doc);
        assert_eq!(text.text(), "Establishment ID/Name MHBAN0012345000 / ACME LTD");
    }

    #[test]
    fn test_pages_tracked() {
        let doc = RawDocument::from_pages("a.pdf", ["one\n\ntwo", "", "three"]);
        let text = TextNormalizer::new().normalize(&doc);
        let pages: Vec<u32> = text.lines().iter().map(|l| l.page).collect();
        assert_eq!(pages, vec![1, 1, 3]);
    }

    #[test]
    fn test_extra_replacements() {
        let extra = vec![Replacement::new(r"Cont\.For", "Cont. For").unwrap()];
        let normalizer = TextNormalizer::new().with_replacements(extra);
        let doc = RawDocument::from_pages("a.pdf", ["Cont.For Due-Month 042020"]);
        assert_eq!(normalizer.normalize(&doc).text(), "Cont. For Due-Month 042020");
    }

    #[test]
    fn test_invalid_replacement_rejected() {
        assert!(Replacement::new("(unclosed", "").is_err());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let normalizer = TextNormalizer::new();
        let doc = RawDocument::from_pages("a.pdf", ["x  01-04-2022Total\u{00a0}10", "2025INE040A01034"]);
        let once = normalizer.normalize(&doc);
        let again = normalizer.normalize(&RawDocument::from_pages("a.pdf", [once.text().to_string()]));
        assert_eq!(once.text(), again.text());
    }

    #[test]
    fn test_empty_document() {
        let text = TextNormalizer::new().normalize(&RawDocument::new("a.pdf"));
        assert!(text.is_empty());
        assert_eq!(text.flat(), "");
    }
}
