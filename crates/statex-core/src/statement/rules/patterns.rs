//! Common regex patterns for statement extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Unsigned decimal without separators.
pub const NUM: &str = r"\d+(?:\.\d+)?";

/// Possibly signed amount with thousands separators.
pub const MONEY: &str = r"-?[0-9,]+(?:\.[0-9]+)?";

/// Indian instrument identifier.
pub const ISIN_SHAPE: &str = r"IN[A-Z0-9]{9}\d";

lazy_static! {
    // Instrument identifiers
    pub static ref ISIN: Regex = Regex::new(&format!(r"\b{}\b", ISIN_SHAPE)).unwrap();

    pub static ref ISIN_CELL: Regex = Regex::new(&format!(r"^{}$", ISIN_SHAPE)).unwrap();

    // Dates
    pub static ref DATE_DMY_DASH: Regex = Regex::new(r"\b\d{2}-\d{2}-\d{4}\b").unwrap();

    pub static ref DATE_DMY_DOT: Regex = Regex::new(r"\b\d{2}\.\d{2}\.\d{4}\b").unwrap();

    pub static ref DATE_DMY_MON: Regex = Regex::new(r"\b\d{2}-[A-Za-z]{3}-\d{4}\b").unwrap();

    // Times
    pub static ref TIME_HMS: Regex = Regex::new(r"\b\d{2}:\d{2}:\d{2}\b").unwrap();

    pub static ref TIME_TOKEN: Regex = Regex::new(r"\b\d{2}:\d{2}(?::\d{2})?\b").unwrap();

    // Whole-line shapes
    pub static ref LINE_TIME: Regex = Regex::new(r"^\d{2}:\d{2}:\d{2}$").unwrap();

    pub static ref LINE_INT: Regex = Regex::new(r"^\d+$").unwrap();

    pub static ref LINE_MONEY: Regex = Regex::new(&format!(r"^{}$", MONEY)).unwrap();

    pub static ref LINE_SIDE: Regex = Regex::new(r"(?i)^(?:buy|sell)$").unwrap();

    // Cleanup
    pub static ref LEADING_NON_LETTERS: Regex = Regex::new(r"^[^A-Za-z]+").unwrap();

    pub static ref RUPEE_NOTE: Regex = Regex::new(r"\(Rs\.\s*[^)]*\)").unwrap();

    pub static ref PIPES: Regex = Regex::new(r"\s*\|\s*").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isin_shape() {
        assert!(ISIN.is_match("xx INE040A01034 yy"));
        assert!(ISIN_CELL.is_match("INE002A01018"));
        assert!(!ISIN_CELL.is_match("INE002A0101"));
        assert!(!ISIN_CELL.is_match("US0378331005"));
    }

    #[test]
    fn test_time_token_spans_seconds() {
        let tokens: Vec<&str> = TIME_TOKEN
            .find_iter("10:15:22 then 11:05")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(tokens, vec!["10:15:22", "11:05"]);
    }

    #[test]
    fn test_line_shapes() {
        assert!(LINE_MONEY.is_match("-1,234.50"));
        assert!(LINE_SIDE.is_match("Buy"));
        assert!(LINE_SIDE.is_match("SELL"));
        assert!(!LINE_SIDE.is_match("Buyback"));
    }
}
