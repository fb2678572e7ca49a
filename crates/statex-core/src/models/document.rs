//! Source documents as delivered by text and table sources.

use serde::{Deserialize, Serialize};

/// Text of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text, line breaks preserved.
    pub text: String,
}

/// Ordered page text for one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    /// Source identifier, usually the file name.
    pub source: String,
    /// Pages in document order.
    pub pages: Vec<Page>,
}

impl RawDocument {
    /// Create a document without pages.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            pages: Vec::new(),
        }
    }

    /// Build a document from page texts numbered from 1.
    pub fn from_pages<I, S>(source: impl Into<String>, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(idx, text)| Page {
                number: idx as u32 + 1,
                text: text.into(),
            })
            .collect();

        Self {
            source: source.into(),
            pages,
        }
    }

    /// Append a page.
    pub fn with_page(mut self, number: u32, text: impl Into<String>) -> Self {
        self.pages.push(Page {
            number,
            text: text.into(),
        });
        self
    }

    /// Number of non-whitespace characters across all pages.
    pub fn text_len(&self) -> usize {
        self.pages
            .iter()
            .map(|p| p.text.chars().filter(|c| !c.is_whitespace()).count())
            .sum()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// A table found on a page: rows of cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    /// Page the table was found on.
    pub page: u32,
    /// Rows in reading order.
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    pub fn new(page: u32) -> Self {
        Self {
            page,
            rows: Vec::new(),
        }
    }

    /// Append a row of cells.
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
