//! Plain UTF-8 text documents, one page per form feed.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::{Result, TextSource, source_name};
use crate::error::DocumentError;
use crate::models::RawDocument;

const PAGE_BREAK: char = '\x0c';

/// Reads `.txt` exports of statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl PlainTextSource {
    pub fn new() -> Self {
        Self
    }

    /// Split text into pages on form feeds.
    pub fn parse(&self, source: &str, text: &str) -> Result<RawDocument> {
        let doc = RawDocument::from_pages(source, text.split(PAGE_BREAK));
        if doc.pages.iter().all(|p| p.text.trim().is_empty()) {
            return Err(DocumentError::NoPages);
        }
        debug!("Read {} page(s) from {}", doc.page_count(), source);
        Ok(doc)
    }
}

impl TextSource for PlainTextSource {
    fn load(&self, path: &Path, _password: Option<&str>) -> Result<RawDocument> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| DocumentError::TextExtraction(format!("not UTF-8: {}", e)))?;
        self.parse(&source_name(path), &text)
    }
}
