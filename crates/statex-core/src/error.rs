//! Error types for the statex-core library.

use thiserror::Error;

/// Main error type for the statex library.
#[derive(Error, Debug)]
pub enum StatexError {
    /// Source document could not be read.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Record extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning a source file into page text.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from the document.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The document is encrypted and no supplied password opened it.
    #[error("document is encrypted")]
    Encrypted,

    /// The document is empty or has no pages.
    #[error("document has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// No text source handles this kind of file.
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),

    /// I/O error while reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to record extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A field required to identify the record is missing.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },

    /// No strategy produced a record.
    #[error("no records found")]
    NoRecords,

    /// The statement format is not known.
    #[error("unknown statement format: {0}")]
    UnknownFormat(String),

    /// A user supplied pattern failed to compile.
    #[error("invalid pattern {name}: {reason}")]
    InvalidPattern { name: String, reason: String },
}

/// Result type for the statex library.
pub type Result<T> = std::result::Result<T, StatexError>;
