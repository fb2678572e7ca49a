//! ICICI corporate benefit (dividend) advice.
//!
//! Each row reads `ISIN scrip nature record-date units ratio payment-date
//! amount`. Rows come from table cells when a table source is available and
//! from ISIN-delimited chunks of the flat text otherwise.
//!
//! The nature is split off the scrip name by the longest keyword that ends
//! it, not the longest tail containing a keyword, so some rows split
//! differently than in earlier exports of the same advice.

use lazy_static::lazy_static;
use regex::Regex;

use super::FormatSpec;
use crate::models::{BenefitRecord, RecordBody};
use crate::statement::anchor::{AnchorScan, ChunkGrammar, ChunkSpan, TableStrategy};
use crate::statement::assemble::{DocumentContext, squash};
use crate::statement::rules::FieldSet;
use crate::statement::rules::patterns::{DATE_DMY_MON, ISIN, ISIN_CELL, RUPEE_NOTE};

/// Benefit natures, in matching priority.
const NATURE_KEYWORDS: &[&str] = &[
    "Bonus",
    "Interim Dividend",
    "Final Dividend",
    "Yearly Dividend",
    "Dividend",
    "Split",
    "Rights",
    "Merger",
    "Demerger",
    "Redemption",
    "Interest",
    "Warrant",
    "Buyback",
    "Consolidation",
    "Spin-off",
    "Preference Dividend",
];

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"Corporate Benefits").unwrap();

    static ref NATURE: Regex = Regex::new(&format!(
        "(?i){}",
        NATURE_KEYWORDS
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|")
    )).unwrap();

    static ref HEADER_ROW: Regex = Regex::new(r"Scrip Name|ISIN.*Record Date|Record Date.*ISIN").unwrap();

    static ref LEADING_NUMBER: Regex = Regex::new(r"^\d+(?:\.\d+)?").unwrap();

    static ref TRAILING_NUMBER: Regex = Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*$").unwrap();

    static ref SLASH_DASH: Regex = Regex::new(r"/-\s*").unwrap();
}

pub fn format() -> FormatSpec {
    FormatSpec::new("icici-dividend", "ICICI corporate benefits", assemble)
        .with_marker(&MARKER)
        .with_table(
            TableStrategy::new(&ISIN_CELL, "isin", ChunkGrammar::Parser(parse_benefit))
                .with_reject(&HEADER_ROW),
        )
        .with_anchor(
            AnchorScan::new(&ISIN, ChunkSpan::FollowingAnchor, ChunkGrammar::Parser(parse_benefit))
                .with_anchor_field("isin")
                .with_keywords("nature", &NATURE),
        )
}

/// Parse a chunk that starts with the ISIN (or directly with the scrip).
fn parse_benefit(chunk: &str) -> Option<FieldSet> {
    let cleaned = SLASH_DASH.replace_all(&RUPEE_NOTE.replace_all(chunk, ""), " ").into_owned();
    let cleaned = squash(&cleaned);

    let mut fields = FieldSet::new();
    let rest = match cleaned.split_once(' ') {
        Some((first, rest)) if ISIN_CELL.is_match(first) => {
            fields.insert("isin", first);
            rest
        }
        _ => cleaned.as_str(),
    };

    let record_date = DATE_DMY_MON.find(rest)?;
    let (security, nature) = split_security_and_nature(&rest[..record_date.start()]);
    fields.insert("security", &security);
    fields.insert("nature", &nature);
    fields.insert("record_date", record_date.as_str());

    let after_record = rest[record_date.end()..].trim();
    let after_units = match LEADING_NUMBER.find(after_record) {
        Some(units) => {
            fields.insert("units", units.as_str());
            after_record[units.end()..].trim()
        }
        None => after_record,
    };

    match DATE_DMY_MON.find(after_units) {
        Some(payment) => {
            fields.insert("ratio", &after_units[..payment.start()]);
            fields.insert("payment_date", payment.as_str());
            let after_payment = &after_units[payment.end()..];
            if let Some(caps) = TRAILING_NUMBER.captures(after_payment) {
                fields.insert("amount", &caps[1]);
            }
        }
        None => fields.insert("ratio", after_units),
    }

    Some(fields)
}

/// Split the text before the record date into scrip name and nature.
///
/// The longest keyword the text ends with wins. Otherwise the shortest tail
/// of one to three words containing a keyword is the nature, and failing
/// that the last two words.
fn split_security_and_nature(before: &str) -> (String, String) {
    let words: Vec<&str> = before.split_whitespace().collect();
    let split = |n: usize| {
        let at = words.len() - n;
        (words[..at].join(" "), words[at..].join(" "))
    };

    let mut by_length: Vec<&str> = NATURE_KEYWORDS.to_vec();
    by_length.sort_by_key(|k| std::cmp::Reverse(k.len()));
    for keyword in by_length {
        let n = keyword.split_whitespace().count();
        if words.len() >= n && words[words.len() - n..].join(" ").eq_ignore_ascii_case(keyword) {
            return split(n);
        }
    }

    for keyword in NATURE_KEYWORDS {
        let keyword = keyword.to_lowercase();
        for n in 1..=words.len().min(3) {
            if words[words.len() - n..].join(" ").to_lowercase().contains(&keyword) {
                return split(n);
            }
        }
    }

    split(words.len().min(2))
}

fn assemble(fields: &FieldSet, _ctx: &DocumentContext<'_>) -> RecordBody {
    RecordBody::Benefit(BenefitRecord {
        isin: fields.text("isin"),
        security: fields
            .get("security")
            .map(|s| s.trim_matches(|c: char| c == ' ' || c == '-' || c == '/').to_string())
            .filter(|s| !s.is_empty()),
        nature: fields.text("nature"),
        record_date: fields.date("record_date"),
        units: fields.quantity("units"),
        ratio: fields.text("ratio"),
        payment_date: fields.date("payment_date"),
        amount: fields.amount("amount"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableBlock;
    use crate::statement::formats::run_pages;
    use crate::statement::orchestrator::Strategy;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_benefit_chunk() {
        let fields =
            parse_benefit("INE040A01034 HDFC BANK LTD Final Dividend 16-May-2025 100 1100% 20-Jun-2025 2,200.00").unwrap();
        assert_eq!(fields.get("isin"), Some("INE040A01034"));
        assert_eq!(fields.get("security"), Some("HDFC BANK LTD"));
        assert_eq!(fields.get("nature"), Some("Final Dividend"));
        assert_eq!(fields.get("record_date"), Some("16-May-2025"));
        assert_eq!(fields.get("units"), Some("100"));
        assert_eq!(fields.get("ratio"), Some("1100%"));
        assert_eq!(fields.get("payment_date"), Some("20-Jun-2025"));
        assert_eq!(fields.get("amount"), Some("2,200.00"));
    }

    #[test]
    fn test_rupee_notes_removed() {
        let fields = parse_benefit("INE002A01018 RELIANCE (Rs. 10) Interim Dividend 01-Aug-2025 10 Rs. 5/- 20-Aug-2025 50").unwrap();
        assert_eq!(fields.get("security"), Some("RELIANCE"));
        assert_eq!(fields.get("nature"), Some("Interim Dividend"));
        assert_eq!(fields.get("ratio"), Some("Rs. 5"));
        assert_eq!(fields.get("amount"), Some("50"));
    }

    #[test]
    fn test_chunk_without_record_date() {
        assert!(parse_benefit("INE009A01021 INFOSYS LTD 10 1500.00").is_none());
    }

    #[test]
    fn test_nature_split() {
        assert_eq!(
            split_security_and_nature("TATA STEEL Preference Dividend"),
            ("TATA STEEL".to_string(), "Preference Dividend".to_string())
        );
        assert_eq!(
            split_security_and_nature("ITC LTD Dividend Payout"),
            ("ITC LTD".to_string(), "Dividend Payout".to_string())
        );
        assert_eq!(
            split_security_and_nature("SOME CO Odd Event"),
            ("SOME CO".to_string(), "Odd Event".to_string())
        );
        assert_eq!(split_security_and_nature("Bonus"), (String::new(), "Bonus".to_string()));
    }

    #[test]
    fn test_table_rows_skip_headers() {
        let format = format();
        let tables = vec![
            TableBlock::new(1)
                .with_row(["ISIN", "Scrip Name", "Nature", "Record Date", "Units"])
                .with_row(["INE040A01034", "HDFC BANK LTD", "Final Dividend", "16-May-2025", "100", "1100%", "20-Jun-2025", "2200.00"]),
        ];
        let found = format.table.as_ref().unwrap().scan(&tables);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fields.get("isin"), Some("INE040A01034"));
        assert_eq!(found[0].fields.get("amount"), Some("2200.00"));
    }

    #[test]
    fn test_anchor_scan_fallback() {
        let page = "Corporate Benefits
INE040A01034 HDFC BANK LTD Final Dividend 16-May-2025 100 1100% 20-Jun-2025 2200.00
INE062A01020 STATE BANK OF INDIA Holding Statement 16-May-2025 10 0 20-Jun-2025 0
INE002A01018 RELIANCE INDUSTRIES Bonus 28-Oct-2024 10 1:1 29-Oct-2024 0";
        let (_, run) = run_pages(&format(), "div.pdf", &[page]);
        assert_eq!(run.strategy, Some(Strategy::AnchorScan));
        assert!(run.table_source_missing);
        assert_eq!(run.records.len(), 2);

        let RecordBody::Benefit(first) = &run.records[0].body else {
            panic!("expected a benefit");
        };
        assert_eq!(first.record_date, NaiveDate::from_ymd_opt(2025, 5, 16));
        assert_eq!(first.amount, Some(dec("2200.00")));

        let RecordBody::Benefit(bonus) = &run.records[1].body else {
            panic!("expected a benefit");
        };
        assert_eq!(bonus.nature.as_deref(), Some("Bonus"));
        assert_eq!(bonus.ratio.as_deref(), Some("1:1"));
    }
}
