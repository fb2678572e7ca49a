//! PDF page text extraction using lopdf and pdf-extract.

use std::fs;
use std::path::Path;

use lopdf::Document;
use tracing::{debug, trace, warn};

use super::{Result, TextSource, source_name};
use crate::error::DocumentError;
use crate::models::RawDocument;

const PAGE_BREAK: char = '\x0c';

/// PDF text source.
///
/// Text is taken page by page through lopdf. When lopdf yields nothing
/// usable (some font encodings), pdf-extract reads the whole document.
#[derive(Debug, Clone)]
pub struct PdfTextSource {
    try_empty_password: bool,
}

/// An opened, decrypted PDF.
struct OpenedPdf {
    doc: Document,
    /// Bytes pdf-extract can read; the decrypted copy for encrypted input.
    data: Vec<u8>,
}

impl PdfTextSource {
    pub fn new() -> Self {
        Self {
            try_empty_password: true,
        }
    }

    /// Retry encrypted documents with the empty password.
    pub fn with_empty_password(mut self, enabled: bool) -> Self {
        self.try_empty_password = enabled;
        self
    }

    /// Extract page text from PDF bytes.
    pub fn load_mem(&self, source: &str, data: &[u8], password: Option<&str>) -> Result<RawDocument> {
        let pdf = self.open(data, password)?;

        let pages = pdf.doc.get_pages();
        if pages.is_empty() {
            return Err(DocumentError::NoPages);
        }
        debug!("Loaded {} with {} page(s)", source, pages.len());

        let mut doc = RawDocument::new(source);
        for &number in pages.keys() {
            let text = match Self::page_text(&pdf.doc, number) {
                Ok(text) => text,
                Err(e) => {
                    trace!("No text on page {} of {}: {}", number, source, e);
                    String::new()
                }
            };
            doc = doc.with_page(number, text);
        }

        if doc.text_len() == 0 {
            debug!("lopdf found no text in {}, trying pdf-extract", source);
            match pdf_extract::extract_text_from_mem(&pdf.data) {
                Ok(text) => return Ok(RawDocument::from_pages(source, text.split(PAGE_BREAK))),
                Err(e) => warn!("pdf-extract failed on {}: {}", source, e),
            }
        }

        Ok(doc)
    }

    /// Text of one page (1-indexed).
    fn page_text(doc: &Document, page: u32) -> Result<String> {
        if !doc.get_pages().contains_key(&page) {
            return Err(DocumentError::InvalidPage(page));
        }
        doc.extract_text(&[page])
            .map_err(|e| DocumentError::TextExtraction(e.to_string()))
    }

    fn open(&self, data: &[u8], password: Option<&str>) -> Result<OpenedPdf> {
        let mut doc = Document::load_mem(data).map_err(|e| DocumentError::Parse(e.to_string()))?;

        if !doc.is_encrypted() {
            return Ok(OpenedPdf {
                doc,
                data: data.to_vec(),
            });
        }

        let mut candidates: Vec<&str> = password.into_iter().collect();
        if self.try_empty_password {
            candidates.push("");
        }

        let opened = candidates.into_iter().any(|candidate| doc.decrypt(candidate).is_ok());
        if !opened {
            return Err(DocumentError::Encrypted);
        }
        debug!("Decrypted PDF");

        // pdf-extract needs the decrypted bytes
        let mut decrypted = Vec::new();
        doc.save_to(&mut decrypted)
            .map_err(|e| DocumentError::Parse(format!("failed to save decrypted PDF: {}", e)))?;

        Ok(OpenedPdf {
            doc,
            data: decrypted,
        })
    }
}

impl Default for PdfTextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for PdfTextSource {
    fn load(&self, path: &Path, password: Option<&str>) -> Result<RawDocument> {
        let data = fs::read(path)?;
        self.load_mem(&source_name(path), &data, password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_parse_error() {
        let err = PdfTextSource::new().load_mem("a.pdf", b"not a pdf", None);
        assert!(matches!(err, Err(DocumentError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PdfTextSource::new().load(Path::new("/no/such/statement.pdf"), None);
        assert!(matches!(err, Err(DocumentError::Io(_))));
    }
}
