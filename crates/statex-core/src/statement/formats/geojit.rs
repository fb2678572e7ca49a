//! Geojit equity contract notes.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use super::FormatSpec;
use crate::models::{RecordBody, Side, TradeRecord};
use crate::statement::assemble::DocumentContext;
use crate::statement::direct::{DirectRowParser, Section};
use crate::statement::header::{HeaderExtractor, HeaderField, HeaderRule};
use crate::statement::rules::patterns::{ISIN, NUM};
use crate::statement::rules::{FieldSet, PatternSet};
use crate::text::NormalizedText;

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"(?i)geojit|Scrip-Summary").unwrap();

    static ref CONTRACT_NO: Regex = Regex::new(r"(?i)CONTRACT\s+NOTE\s+NO\s*[:\-]?\s*([0-9]+)\b").unwrap();

    static ref TRADE_DATE: Regex = Regex::new(
        r"(?i)TRADE\s+DATE\s*[:\-]?\s*([0-9]{2}\.[0-9]{2}\.[0-9]{4}|[0-9]{2}-[A-Za-z]{3}-[0-9]{4})"
    ).unwrap();

    static ref EXCHANGE_LABELLED: Regex = Regex::new(
        r"(?i)Name +Of +Exchange *& *Segment *[:\-]? *(?P<exchange>[A-Za-z]+) +(?P<segment>[A-Za-z]+)"
    ).unwrap();

    static ref EXCHANGE_ANY: Regex = Regex::new(r"(?i)\b(?P<exchange>NSE|BSE) +(?P<segment>EQ|FO|CDS|CASH)\b").unwrap();

    static ref STTL_LABEL: Regex = Regex::new(r"(?i)STTLNO.*STTLDATE").unwrap();

    static ref STTL_NO_FIRST: Regex = Regex::new(
        r"\b(?P<settlement_no>[0-9]{6,})\b.*?\b(?P<settlement_date>[0-9]{2}\.[0-9]{2}\.[0-9]{4})\b"
    ).unwrap();

    static ref STTL_DATE_FIRST: Regex = Regex::new(
        r"\b(?P<settlement_date>[0-9]{2}\.[0-9]{2}\.[0-9]{4})\b.*?\b(?P<settlement_no>[0-9]{6,})\b"
    ).unwrap();

    static ref STT: Regex = Regex::new(&format!(r"(?i)Securities\s+Transaction\s+Tax\s+({})", NUM)).unwrap();

    static ref STT_ROUNDED: Regex = Regex::new(&format!(r"(?is)Total\s*\(Rounded.*?\)\s*({})", NUM)).unwrap();

    static ref EXCHANGE_CHARGES: Regex = Regex::new(&format!(r"(?i)Exchange\s+Transactn\s+Charges\s+({})", NUM)).unwrap();

    static ref TURNOVER_FEES: Regex = Regex::new(&format!(r"(?i)SEBI\s+Turnover\s+Fees\s+({})", NUM)).unwrap();

    static ref CESS: Regex = Regex::new(&format!(r"(?i)Additional\s+Cess\s+({})", NUM)).unwrap();

    static ref STAMP_DUTY: Regex = Regex::new(&format!(r"(?i)Stamp\s+Duty\s+({})", NUM)).unwrap();

    static ref NET_AMOUNT: Regex = Regex::new(&format!(r"(?is)Net\s+Amount.*?\b({})\b", NUM)).unwrap();

    // Scrip summary rows
    static ref SECTION_START: Regex = Regex::new(r"Scrip-Summary|Scrip Summary").unwrap();

    static ref SECTION_END: Regex = Regex::new(r"Statement Of Securities|Daily Margin Statement").unwrap();

    static ref ROW_HEADER: Regex = Regex::new(
        r"(?i)Security\s+Description|Gross Rate|Gross Total|Brokerage|Net Rate|Net Total"
    ).unwrap();

    static ref ROW_STRICT: Regex = Regex::new(&format!(
        r"^{}(?P<net_rate>{n}) (?P<net_amount>-?{n})$",
        ROW_HEAD.as_str(),
        n = NUM
    )).unwrap();

    static ref ROW_INLINE_ISIN: Regex = Regex::new(&format!(
        r"^{}(?P<net_rate>{n}) (?P<isin>IN[A-Z0-9]{{9}}\d)$",
        ROW_HEAD.as_str(),
        n = NUM
    )).unwrap();

    static ref ROW_RELAXED: Regex = Regex::new(&format!(
        r"^{}(?P<net_rate>{n})",
        ROW_HEAD.as_str(),
        n = NUM
    )).unwrap();

    // Security, side, quantity and the four leading amounts shared by every row shape.
    static ref ROW_HEAD: Regex = Regex::new(&format!(
        r"(?P<security>[A-Z0-9 .,&\-]+) (?P<side>B|S) (?P<quantity>\d+) (?P<gross_rate>{n}) (?P<gross_total>{n}) (?P<brokerage_per_unit>{n}) (?P<total_brokerage>{n}) ",
        n = NUM
    )).unwrap();

    // ISIN lookup
    static ref NAME_DASH_ISIN: Regex = Regex::new(r"^(?P<name>[A-Z0-9 .,&\-]+?)\s*-\s*(?P<isin>IN[A-Z0-9]{9}\d)\b").unwrap();

    static ref NAME_LINE: Regex = Regex::new(r"^[A-Z0-9 .,&\-]{3,}$").unwrap();
}

/// Charges summed into `other_charges_total`.
const OTHER_CHARGES: &[&str] = &["exchange_charges", "turnover_fees", "cess", "stamp_duty"];

pub fn format() -> FormatSpec {
    FormatSpec::new("geojit", "Geojit contract note", assemble)
        .with_marker(&MARKER)
        .with_header(header())
        .with_direct(
            DirectRowParser::new(
                PatternSet::new()
                    .variant("strict", &ROW_STRICT)
                    .variant("inline_isin", &ROW_INLINE_ISIN)
                    .variant("relaxed", &ROW_RELAXED),
            )
            .with_reject(&ROW_HEADER)
            .with_section(Section::new(&SECTION_START, &SECTION_END)),
        )
        .with_lookup(isin_lookup)
}

fn header() -> HeaderExtractor {
    let settlement = |name| {
        HeaderField::new(
            name,
            vec![
                HeaderRule::following("below_label", &STTL_LABEL, 4, &STTL_NO_FIRST),
                HeaderRule::following("below_label_swapped", &STTL_LABEL, 4, &STTL_DATE_FIRST),
                HeaderRule::pattern("anywhere", &STTL_NO_FIRST),
                HeaderRule::pattern("anywhere_swapped", &STTL_DATE_FIRST),
            ],
        )
    };

    HeaderExtractor::new(vec![
        HeaderField::new("contract_no", vec![HeaderRule::pattern("labelled", &CONTRACT_NO)]),
        HeaderField::new("trade_date", vec![HeaderRule::pattern("labelled", &TRADE_DATE)]),
        HeaderField::new(
            "exchange",
            vec![
                HeaderRule::pattern("labelled", &EXCHANGE_LABELLED),
                HeaderRule::pattern("any", &EXCHANGE_ANY),
            ],
        ),
        HeaderField::new(
            "segment",
            vec![
                HeaderRule::pattern("labelled", &EXCHANGE_LABELLED),
                HeaderRule::pattern("any", &EXCHANGE_ANY),
            ],
        ),
        settlement("settlement_no"),
        settlement("settlement_date"),
        HeaderField::new(
            "stt",
            vec![
                HeaderRule::pattern("labelled", &STT),
                HeaderRule::pattern("rounded_total", &STT_ROUNDED),
            ],
        ),
        HeaderField::new("exchange_charges", vec![HeaderRule::pattern("labelled", &EXCHANGE_CHARGES)]),
        HeaderField::new("turnover_fees", vec![HeaderRule::pattern("labelled", &TURNOVER_FEES)]),
        HeaderField::new("cess", vec![HeaderRule::pattern("labelled", &CESS)]),
        HeaderField::new("stamp_duty", vec![HeaderRule::pattern("labelled", &STAMP_DUTY)]),
        HeaderField::new("net_amount_payable", vec![HeaderRule::pattern("labelled", &NET_AMOUNT)]),
    ])
}

/// Security name to ISIN, from `NAME - ISIN` lines or a name line followed
/// by a line carrying the ISIN.
fn isin_lookup(text: &NormalizedText) -> BTreeMap<String, String> {
    let lines = text.lines();
    let mut map = BTreeMap::new();

    for (idx, line) in lines.iter().enumerate() {
        if let Some(caps) = NAME_DASH_ISIN.captures(&line.text) {
            map.insert(caps["name"].trim().to_string(), caps["isin"].to_string());
            continue;
        }
        if NAME_LINE.is_match(&line.text) {
            if let Some(isin) = lines.get(idx + 1).and_then(|next| ISIN.find(&next.text)) {
                map.insert(line.text.trim().to_string(), isin.as_str().to_string());
            }
        }
    }

    map
}

fn assemble(fields: &FieldSet, ctx: &DocumentContext<'_>) -> RecordBody {
    let security = fields.text("security");
    let isin = fields
        .text("isin")
        .or_else(|| security.as_deref().and_then(|s| ctx.lookup(s)));

    let charges: BTreeMap<String, Decimal> = ["stt", "exchange_charges", "turnover_fees", "cess", "stamp_duty"]
        .iter()
        .filter_map(|name| ctx.amount(name).map(|v| (name.to_string(), v)))
        .collect();
    let other_charges_total = OTHER_CHARGES
        .iter()
        .map(|name| charges.get(*name).copied().unwrap_or_default())
        .sum::<Decimal>();

    let net_amount = fields.amount("net_amount");
    let net_payable = net_amount
        .or_else(|| ctx.amount("net_amount_payable"))
        .map(|v| v.abs());

    RecordBody::Trade(TradeRecord {
        contract_no: ctx.text("contract_no"),
        trade_date: ctx.date("trade_date"),
        settlement_no: ctx.text("settlement_no"),
        settlement_date: ctx.date("settlement_date"),
        exchange: ctx.text("exchange").map(|s| s.to_uppercase()),
        segment: ctx.text("segment").map(|s| s.to_uppercase()),
        security,
        isin,
        side: fields.get("side").and_then(Side::from_token),
        quantity: fields.quantity("quantity"),
        gross_rate: fields.amount("gross_rate"),
        gross_total: fields.amount("gross_total"),
        brokerage_per_unit: fields.amount("brokerage_per_unit"),
        total_brokerage: fields.amount("total_brokerage"),
        net_rate: fields.amount("net_rate"),
        net_amount,
        charges,
        other_charges_total: Some(other_charges_total),
        net_payable,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::formats::run_pages;
    use crate::statement::orchestrator::Strategy;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const NOTE: &str = "GEOJIT FINANCIAL SERVICES LTD
CONTRACT NOTE NO : 4175211
TRADE DATE : 07.07.2020
Name Of Exchange & Segment : nse eq
EXCHANGE SEGMENT STTLNO STTLDATE UCCODE
NSE EQ 2020127 08.07.2020 -
Scrip-Summary
Security Description B/S Qty Gross Rate Gross Total Brokerage Net Rate Net Total
HDFC BANK LIMITED B 10 1000.00 10000.00 1.00 10.00 1001.00 -10010.00
INFOSYS LIMITED S 5 700.50 3502.50 0.70 3.50 699.80
Statement Of Securities
HDFC BANK LIMITED - INE040A01034
INFOSYS LIMITED
INE009A01021
Securities Transaction Tax 13.00
Exchange Transactn Charges 0.45
SEBI Turnover Fees 0.01
Stamp Duty 1.50
Net Amount Payable 6521.00";

    #[test]
    fn test_inline_isin_row() {
        let format = format();
        let parser = format.direct.as_ref().unwrap();
        let fields = parser
            .parse_line("RELIANCE IND B 10 2500.00 25000.00 5.00 50.00 2495.00 INE040A01034")
            .unwrap();
        assert_eq!(fields.variant(), Some("inline_isin"));
        assert_eq!(fields.get("security"), Some("RELIANCE IND"));
        assert_eq!(fields.get("gross_rate"), Some("2500.00"));
        assert_eq!(fields.get("isin"), Some("INE040A01034"));
    }

    #[test]
    fn test_column_header_rejected() {
        let format = format();
        let parser = format.direct.as_ref().unwrap();
        assert!(parser.parse_line("Security Description B 1 1 1 1 1 1 1").is_none());
    }

    #[test]
    fn test_contract_note() {
        let (header, run) = run_pages(&format(), "note.pdf", &[NOTE]);
        assert_eq!(header.get("settlement_no"), Some("2020127"));
        assert_eq!(run.strategy, Some(Strategy::DirectLine));
        assert_eq!(run.records.len(), 2);

        let RecordBody::Trade(buy) = &run.records[0].body else {
            panic!("expected a trade");
        };
        assert_eq!(buy.contract_no.as_deref(), Some("4175211"));
        assert_eq!(buy.trade_date, NaiveDate::from_ymd_opt(2020, 7, 7));
        assert_eq!(buy.settlement_date, NaiveDate::from_ymd_opt(2020, 7, 8));
        assert_eq!(buy.exchange.as_deref(), Some("NSE"));
        assert_eq!(buy.segment.as_deref(), Some("EQ"));
        assert_eq!(buy.isin.as_deref(), Some("INE040A01034"));
        assert_eq!(buy.side, Some(Side::Buy));
        assert_eq!(buy.net_amount, Some(dec("-10010.00")));
        assert_eq!(buy.net_payable, Some(dec("10010.00")));
        assert_eq!(buy.charges.get("stt"), Some(&dec("13.00")));
        assert_eq!(buy.other_charges_total, Some(dec("1.96")));

        let RecordBody::Trade(sell) = &run.records[1].body else {
            panic!("expected a trade");
        };
        assert_eq!(sell.isin.as_deref(), Some("INE009A01021"));
        assert_eq!(sell.net_amount, None);
        assert_eq!(sell.net_payable, Some(dec("6521.00")));
    }
}
