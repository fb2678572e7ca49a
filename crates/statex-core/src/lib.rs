//! Core library for extracting transactions from financial statements.
//!
//! This crate provides:
//! - Text sources for PDF and plain-text statements
//! - Text normalization with a data-driven repair table
//! - Record recognition strategies (table rows, single lines, line windows,
//!   anchor scans, header-only records) run as an ordered fallback chain
//! - Vendor statement formats for contract notes, dividend advices,
//!   provident-fund passbooks and premium receipts

pub mod error;
pub mod models;
pub mod pdf;
pub mod statement;
pub mod table;
pub mod text;

pub use error::{DocumentError, ExtractionError, Result, StatexError};
pub use models::{
    ParseOutcome, Provenance, RawDocument, RecordBody, RecordKind, StatexConfig, TableBlock,
    TransactionRecord,
};
pub use pdf::{PdfTextSource, PlainTextSource, TextSource};
pub use statement::{Diagnostics, DocumentReport, StatementEngine};
pub use table::{GapTableSource, TableSource};
pub use text::{NormalizedText, TextNormalizer};
