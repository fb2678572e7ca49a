//! Cross-module behaviour of the recognition strategies and the engine.

use std::collections::BTreeMap;
use std::str::FromStr;

use pretty_assertions::assert_eq;
use regex::Regex;
use rust_decimal::Decimal;

use statex_core::models::{
    ParseOutcome, RawDocument, RecordBody, Side, StatexConfig, TableBlock, TradeRecord,
};
use statex_core::statement::{
    AnchorScan, ChunkGrammar, ChunkSpan, ContextBacktracker, ContextField, DirectRowParser,
    DocumentContext, DocumentHeader, FallbackOrchestrator, FieldSet, FormatSpec, PatternSet,
    RecordRecognizer, StatementEngine, Strategy, parse_amount,
};
use statex_core::text::TextNormalizer;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn engine() -> StatementEngine {
    StatementEngine::new(&StatexConfig::default()).unwrap()
}

fn trades(records: &[statex_core::TransactionRecord]) -> Vec<&TradeRecord> {
    records
        .iter()
        .filter_map(|r| match &r.body {
            RecordBody::Trade(t) => Some(t),
            _ => None,
        })
        .collect()
}

fn assemble_trade(fields: &FieldSet, _ctx: &DocumentContext<'_>) -> RecordBody {
    RecordBody::Trade(TradeRecord {
        security: fields.text("security"),
        isin: fields.text("isin"),
        side: fields.get("side").and_then(Side::from_token),
        quantity: fields.quantity("quantity"),
        gross_rate: fields.amount("gross_rate"),
        gross_total: fields.amount("gross_total"),
        brokerage_per_unit: fields.amount("brokerage_per_unit"),
        total_brokerage: fields.amount("total_brokerage"),
        net_rate: fields.amount("net_rate"),
        ..Default::default()
    })
}

#[test]
fn single_line_trade_row() {
    let row = Regex::new(
        r"^(?P<security>[A-Z][A-Z ]*?) (?P<side>B|S) (?P<quantity>\d+) (?P<gross_rate>[\d,]+\.\d{2}) (?P<gross_total>[\d,]+\.\d{2}) (?P<brokerage_per_unit>[\d,]+\.\d{2}) (?P<total_brokerage>[\d,]+\.\d{2}) (?P<net_rate>[\d,]+\.\d{2}) (?P<isin>IN[A-Z0-9]{9}\d)$",
    )
    .unwrap();
    let format = FormatSpec::new("rows", "Rows", assemble_trade)
        .with_direct(DirectRowParser::new(PatternSet::new().variant("row", &row)));

    let doc = RawDocument::from_pages(
        "a.pdf",
        ["RELIANCE IND B 10 2500.00 25000.00 5.00 50.00 2495.00 INE040A01034"],
    );
    let text = TextNormalizer::new().normalize(&doc);
    let header = DocumentHeader::new();
    let lookup = BTreeMap::new();
    let ctx = DocumentContext::new("a.pdf", &header, &lookup);

    let run = FallbackOrchestrator::new(&format).run(&text, &ctx, None);
    assert_eq!(run.strategy, Some(Strategy::DirectLine));

    let trades = trades(&run.records);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].side, Some(Side::Buy));
    assert_eq!(trades[0].quantity, Some(dec("10")));
    assert_eq!(trades[0].gross_rate, Some(dec("2500.00")));
    assert_eq!(trades[0].isin.as_deref(), Some("INE040A01034"));
    assert_eq!(trades[0].security.as_deref(), Some("RELIANCE IND"));
}

const WINDOW: &str = "1100000012345678
09:15:01
12345678
09:15:02
RELIANCE INDUSTRIES
Buy 10 2500.00 0.10 2500.10 25001.00";

#[test]
fn six_line_window_is_one_record() {
    let doc = RawDocument::from_pages("iifl.pdf", [format!("IIFL Securities\n{}", WINDOW)]);
    let report = engine().extract(&doc, None);

    assert_eq!(report.diagnostics.strategy, Some(Strategy::Windowed));
    assert_eq!(report.record_count(), 1);
}

#[test]
fn broken_window_resumes_on_next_line() {
    let broken = WINDOW.replace("09:15:02", "9.15");
    let second = WINDOW.replace("1100000012345678", "1100000087654321");
    let doc = RawDocument::from_pages("iifl.pdf", [format!("IIFL\n{}\n{}", broken, second)]);
    let report = engine().extract(&doc, None);

    let trades = trades(report.outcome.records());
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].order_no.as_deref(), Some("1100000087654321"));
}

#[test]
fn windowed_fields_are_all_or_nothing() {
    let broken = WINDOW.replacen("\n12345678\n", "\n1234\n", 1);
    let doc = RawDocument::from_pages("iifl.pdf", [format!("IIFL\n{}\n{}", WINDOW, broken)]);
    let report = engine().extract(&doc, None);

    for trade in trades(report.outcome.records()) {
        assert!(trade.order_no.is_some());
        assert!(trade.order_time.is_some());
        assert!(trade.trade_no.is_some());
        assert!(trade.trade_time.is_some());
        assert!(trade.security.is_some());
        assert!(trade.side.is_some());
        assert!(trade.quantity.is_some());
        assert!(trade.net_amount.is_some());
    }
    assert_eq!(report.record_count(), 1);
}

fn whole_chunk(chunk: &str) -> Option<FieldSet> {
    let mut fields = FieldSet::new();
    fields.insert("chunk", chunk);
    Some(fields)
}

const BENEFITS: &str = "Corporate Benefits
INE040A01034 HDFC BANK LTD Final Dividend 16-May-2025 100 1100% 20-Jun-2025 2200.00
INE062A01020 STATE BANK OF INDIA Holding Statement 16-May-2025 10 0 20-Jun-2025 0
INE002A01018 RELIANCE INDUSTRIES Bonus 28-Oct-2024 10 1:1 29-Oct-2024 0
INE009A01021 INFOSYS LTD Interim Dividend 30-May-2025 5 420% 30-Jun-2025 105.00";

#[test]
fn anchor_scan_discards_unclassified_chunks() {
    let isin = Regex::new(r"\bIN[A-Z0-9]{9}\d\b").unwrap();
    let text = TextNormalizer::new().normalize(&RawDocument::from_pages("div.pdf", [BENEFITS]));

    let all = AnchorScan::new(&isin, ChunkSpan::FollowingAnchor, ChunkGrammar::Parser(whole_chunk));
    assert_eq!(all.recognize(&text).len(), 4);

    let report = engine().extract(&RawDocument::from_pages("div.pdf", [BENEFITS]), None);
    assert_eq!(report.diagnostics.strategy, Some(Strategy::AnchorScan));
    assert_eq!(report.record_count(), 3);
    assert!(report.diagnostics.table_source_missing);
}

#[test]
fn table_rows_win_over_text() {
    let tables = vec![TableBlock::new(1).with_row([
        "INE040A01034",
        "HDFC BANK LTD",
        "Final Dividend",
        "16-May-2025",
        "100",
        "1100%",
        "20-Jun-2025",
        "2200.00",
    ])];
    let doc = RawDocument::from_pages("div.pdf", [BENEFITS]);
    let report = engine().extract(&doc, Some(tables.as_slice()));

    assert_eq!(report.diagnostics.strategy, Some(Strategy::Table));
    assert_eq!(report.record_count(), 1);
    assert!(!report.diagnostics.table_source_missing);
}

#[test]
fn empty_table_result_falls_through() {
    let doc = RawDocument::from_pages("div.pdf", [BENEFITS]);
    let report = engine().extract(&doc, Some(&[][..]));

    assert_eq!(report.diagnostics.strategy, Some(Strategy::AnchorScan));
    assert!(report.diagnostics.table_source_missing);
}

#[test]
fn candidates_missing_mandatory_fields_are_counted() {
    let page = "Premium Receipt
Date (Time) : 12/06/2017 (10:22:33)
Total Amt (Rs) 100.00";
    let report = engine().extract(&RawDocument::from_pages("receipt.pdf", [page]), None);

    assert_eq!(report.format.as_deref(), Some("lic"));
    assert_eq!(report.outcome, ParseOutcome::Empty);
    assert_eq!(report.diagnostics.strategy, None);
    assert_eq!(report.diagnostics.dropped_records, 1);
}

#[test]
fn backtracker_prefers_closest_match() {
    let contract = Regex::new(r"ISEC/\S+").unwrap();
    let backtracker = ContextBacktracker::new(vec![ContextField::new(
        "contract_no",
        PatternSet::new().variant("isec", &contract),
    )]);

    let text = "ISEC/2022/001 something ISEC/2022/002 RELIANCE B 10";
    let anchor = text.find("RELIANCE").unwrap();
    let fields = backtracker.resolve(text, anchor);
    assert_eq!(fields.get("contract_no"), Some("ISEC/2022/002"));
}

#[test]
fn amount_shapes() {
    assert_eq!(parse_amount("1,234.50"), Some(dec("1234.50")));
    assert_eq!(parse_amount("-500"), Some(dec("-500")));
    assert_eq!(parse_amount("12,34"), None);
}

#[test]
fn extraction_is_deterministic() {
    let pages = [BENEFITS.to_string(), format!("IIFL\n{}", WINDOW)];
    let doc = RawDocument::from_pages("mixed.pdf", pages);

    let first = serde_json::to_string(&engine().extract(&doc, None)).unwrap();
    let second = serde_json::to_string(&engine().extract(&doc, None)).unwrap();
    assert_eq!(first, second);
}
