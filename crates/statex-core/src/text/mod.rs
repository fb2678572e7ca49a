//! Normalized document text with a page index.

mod normalize;

pub use normalize::{Replacement, TextNormalizer};

/// A non-empty normalized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    /// Page the line came from.
    pub page: u32,
}

/// Which rendering of the document a pattern runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Lines joined with `\n`.
    #[default]
    Lines,
    /// Lines joined with a single space.
    Flat,
}

/// Whitespace-canonical document text.
///
/// Both renderings are built from the same line list, so a byte offset in
/// either can be mapped back to the line and page it falls on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    source: String,
    lines: Vec<Line>,
    text: String,
    flat: String,
    text_starts: Vec<usize>,
    flat_starts: Vec<usize>,
}

impl NormalizedText {
    /// Build both renderings from normalized lines.
    pub fn from_lines(source: impl Into<String>, lines: Vec<Line>) -> Self {
        let mut text = String::new();
        let mut flat = String::new();
        let mut text_starts = Vec::with_capacity(lines.len());
        let mut flat_starts = Vec::with_capacity(lines.len());

        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 {
                text.push('\n');
                flat.push(' ');
            }
            text_starts.push(text.len());
            flat_starts.push(flat.len());
            text.push_str(&line.text);
            flat.push_str(&line.text);
        }

        Self {
            source: source.into(),
            lines,
            text,
            flat,
            text_starts,
            flat_starts,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Lines joined with `\n`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lines joined with single spaces.
    pub fn flat(&self) -> &str {
        &self.flat
    }

    pub fn view(&self, view: View) -> &str {
        match view {
            View::Lines => &self.text,
            View::Flat => &self.flat,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the line containing `offset` in the given view.
    pub fn line_at(&self, view: View, offset: usize) -> usize {
        let starts = match view {
            View::Lines => &self.text_starts,
            View::Flat => &self.flat_starts,
        };
        starts.partition_point(|&s| s <= offset).saturating_sub(1)
    }

    /// Page of the line at `index`; 1 when out of range.
    pub fn page_of_line(&self, index: usize) -> u32 {
        self.lines.get(index).map(|l| l.page).unwrap_or(1)
    }

    /// Page containing `offset` in the given view.
    pub fn page_at(&self, view: View, offset: usize) -> u32 {
        self.page_of_line(self.line_at(view, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NormalizedText {
        NormalizedText::from_lines(
            "a.pdf",
            vec![
                Line { text: "alpha".to_string(), page: 1 },
                Line { text: "beta".to_string(), page: 1 },
                Line { text: "gamma".to_string(), page: 2 },
            ],
        )
    }

    #[test]
    fn test_views() {
        let text = sample();
        assert_eq!(text.text(), "alpha\nbeta\ngamma");
        assert_eq!(text.flat(), "alpha beta gamma");
    }

    #[test]
    fn test_page_index() {
        let text = sample();
        let gamma = text.flat().find("gamma").unwrap();
        assert_eq!(text.page_at(View::Flat, gamma), 2);
        assert_eq!(text.page_at(View::Lines, 0), 1);
        assert_eq!(text.line_at(View::Lines, 7), 1);
        assert_eq!(text.page_of_line(10), 1);
    }
}
