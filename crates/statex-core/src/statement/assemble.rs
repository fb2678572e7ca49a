//! Record assembly and value coercion.
//!
//! Recognized fields are raw strings. Assembly merges them with the document
//! header and lookups, coercing numbers, dates and times. A value that does not
//! parse is left absent; nothing is guessed.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use super::header::DocumentHeader;
use super::rules::FieldSet;
use crate::models::RecordBody;

lazy_static! {
    static ref PLAIN_AMOUNT: Regex = Regex::new(r"^[+-]?\d+(?:\.\d+)?$").unwrap();

    // 1,234,567.89
    static ref WESTERN_AMOUNT: Regex = Regex::new(r"^[+-]?\d{1,3}(?:,\d{3})+(?:\.\d+)?$").unwrap();

    // 12,34,567.89
    static ref INDIAN_AMOUNT: Regex = Regex::new(r"^[+-]?\d{1,2}(?:,\d{2})*,\d{3}(?:\.\d+)?$").unwrap();
}

/// Date shapes accepted on statements, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d/%b/%Y",
    "%d %b %Y",
    "%d-%B-%Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%Y-%m-%d",
    "%Y%m%d",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// Parse an amount, stripping thousands separators.
///
/// Separators must sit in western (`1,234,567`) or Indian (`12,34,567`)
/// positions; anything else, such as `12,34`, is not an amount.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let s = s
        .strip_prefix("Rs.")
        .or_else(|| s.strip_prefix('₹'))
        .unwrap_or(s)
        .trim();

    if !(PLAIN_AMOUNT.is_match(s) || WESTERN_AMOUNT.is_match(s) || INDIAN_AMOUNT.is_match(s)) {
        return None;
    }
    Decimal::from_str(&s.replace(',', "")).ok()
}

/// Parse an amount and apply a debit/credit marker.
///
/// `Dr` makes the amount negative, `Cr` positive; without a marker the
/// printed sign is kept.
pub fn parse_signed_amount(amount: &str, marker: Option<&str>) -> Option<Decimal> {
    let value = parse_amount(amount)?;
    let marker = marker.map(|m| m.trim().to_ascii_lowercase());
    Some(match marker.as_deref() {
        Some("dr") => -value.abs(),
        Some("cr") => value.abs(),
        _ => value,
    })
}

/// Parse a date in one of the recognized shapes.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

/// Quantities may carry separators but never a sign.
pub fn parse_quantity(s: &str) -> Option<Decimal> {
    parse_amount(s).filter(|q| !q.is_sign_negative())
}

/// First `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Collapse whitespace runs into single spaces.
pub fn squash(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl FieldSet {
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    pub fn amount(&self, name: &str) -> Option<Decimal> {
        self.get(name).and_then(parse_amount)
    }

    pub fn quantity(&self, name: &str) -> Option<Decimal> {
        self.get(name).and_then(parse_quantity)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(parse_date)
    }

    pub fn time(&self, name: &str) -> Option<NaiveTime> {
        self.get(name).and_then(parse_time)
    }
}

/// Document-level inputs shared by every record of a document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    pub source: &'a str,
    pub header: &'a DocumentHeader,
    /// Format-specific lookup table (e.g. security name to ISIN).
    pub lookup: &'a BTreeMap<String, String>,
}

impl<'a> DocumentContext<'a> {
    pub fn new(
        source: &'a str,
        header: &'a DocumentHeader,
        lookup: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            source,
            header,
            lookup,
        }
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.header.get(name).map(str::to_string)
    }

    pub fn amount(&self, name: &str) -> Option<Decimal> {
        self.header.get(name).and_then(parse_amount)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.header.get(name).and_then(parse_date)
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        self.lookup.get(key.trim()).cloned()
    }
}

/// Builds a record body from recognized fields and document context.
pub type Assembler = fn(&FieldSet, &DocumentContext<'_>) -> RecordBody;
