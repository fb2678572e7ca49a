//! Statement record extraction.
//!
//! A document goes through format detection, header extraction and a fixed
//! fallback chain of recognition strategies. Each vendor layout is a
//! [`FormatSpec`] value; the machinery here is shared.

pub mod anchor;
pub mod assemble;
pub mod backtrack;
pub mod classify;
pub mod direct;
pub mod engine;
pub mod formats;
pub mod header;
pub mod orchestrator;
pub mod rules;
pub mod window;

pub use anchor::{AnchorScan, ChunkGrammar, ChunkSpan, TableStrategy};
pub use assemble::{
    Assembler, DocumentContext, parse_amount, parse_date, parse_quantity, parse_signed_amount,
    parse_time,
};
pub use backtrack::{ContextBacktracker, ContextField, Pick};
pub use classify::LineClassifier;
pub use direct::{DirectRowParser, Section};
pub use engine::{Diagnostics, DocumentReport, StatementEngine};
pub use formats::FormatSpec;
pub use header::{DocumentHeader, HeaderExtractor, HeaderField, HeaderRule};
pub use orchestrator::{FallbackOrchestrator, Strategy, StrategyRun, SummaryRule};
pub use rules::{Candidate, FieldSet, PatternSet, PatternVariant, RecordRecognizer};
pub use window::{FieldGate, WindowBinding, WindowLayout, WindowedReconstructor};

use crate::error::ExtractionError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;
