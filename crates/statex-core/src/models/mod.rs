//! Data models for documents, records and configuration.

pub mod config;
pub mod document;
pub mod record;

pub use config::StatexConfig;
pub use document::{Page, RawDocument, TableBlock};
pub use record::{
    BenefitRecord, ParseOutcome, PassbookEntry, PassbookRecord, PremiumRecord, Provenance,
    RecordBody, RecordKind, SettlementRecord, Side, TradeRecord, TransactionRecord,
};
