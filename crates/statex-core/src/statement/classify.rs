//! Anchor detection over lines and flowing text.

use regex::Regex;

/// Finds the lines or tokens that mark where a record starts.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    anchor: Regex,
    skip: Option<Regex>,
}

impl LineClassifier {
    pub fn new(anchor: &Regex) -> Self {
        Self {
            anchor: anchor.clone(),
            skip: None,
        }
    }

    /// Lines matching `skip` (totals, page footers) are never anchors.
    pub fn with_skip(mut self, skip: &Regex) -> Self {
        self.skip = Some(skip.clone());
        self
    }

    pub fn is_skipped(&self, line: &str) -> bool {
        self.skip.as_ref().is_some_and(|s| s.is_match(line))
    }

    /// Whether a whole line is a record-start anchor.
    pub fn is_anchor(&self, line: &str) -> bool {
        !self.is_skipped(line) && self.anchor.is_match(line)
    }

    /// Byte spans of every anchor token in flowing text.
    pub fn anchor_spans(&self, text: &str) -> Vec<(usize, usize)> {
        self.anchor
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}
