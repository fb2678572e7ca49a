//! ICICI Securities equity transaction statements.
//!
//! Grid columns wrap freely in the extracted text, so trades are found by
//! the tail that ends in the ISIN. Contract, order and trade identifiers are
//! printed ahead of the tail and are recovered by looking back from it.

use lazy_static::lazy_static;
use regex::Regex;

use super::FormatSpec;
use crate::models::{RecordBody, SettlementRecord, Side, TradeRecord};
use crate::statement::anchor::{AnchorScan, ChunkGrammar, ChunkSpan};
use crate::statement::assemble::{DocumentContext, squash, truncate_chars};
use crate::statement::backtrack::{ContextBacktracker, ContextField, Pick};
use crate::statement::header::{HeaderExtractor, HeaderField, HeaderRule};
use crate::statement::orchestrator::SummaryRule;
use crate::statement::rules::patterns::{DATE_DMY_DASH, ISIN, LEADING_NON_LETTERS, TIME_HMS, TIME_TOKEN};
use crate::statement::rules::{FieldSet, PatternSet};

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"Equity Transaction Statement").unwrap();

    // Header
    static ref CLIENT: Regex = Regex::new(r"(?s)To,\s*(.+?)\s+UNIQUE CLIENT CODE").unwrap();

    static ref PAN: Regex = Regex::new(r"PAN\s*:\s*([A-Z0-9]{10})").unwrap();

    static ref PERIOD: Regex = Regex::new(
        r"Equity Transaction Statement from (?P<period_from>\d{2}-[A-Za-z]{3}-\d{4}) to (?P<period_to>\d{2}-[A-Za-z]{3}-\d{4})"
    ).unwrap();

    // Trade tail; the security must start with a letter so that it never
    // swallows the times printed before it.
    static ref TRADE_TAIL: Regex = Regex::new(
        r"(?P<security>[A-Z&(][A-Z0-9.&() \-]*?) (?P<side>B|S) (?P<quantity>\d+) (?P<total>\d+\.\d+) (?P<brokerage>\d+\.\d+) (?P<net>\d+\.\d+) (?P<gst>\d+\.\d+) (?P<price>\d+\.\d+) (?P<isin>IN[A-Z0-9]{9}\d)$"
    ).unwrap();

    // Context before the tail
    static ref CONTRACT_REF: Regex = Regex::new(r"ISEC/\S+").unwrap();

    static ref EXCHANGE_CONTRACT: Regex = Regex::new(r"NSE\s*(\d{8,20})").unwrap();

    static ref TRADE_NO: Regex = Regex::new(r"\b\d{7,10}\b").unwrap();

    // Settlement footer
    static ref SETTLEMENT_STRICT: Regex = Regex::new(
        r"(?P<settlement_date>\d{2}-\d{2}-\d{4})\s+ISEC/\S+\s+(?P<settlement_no>\d+)\s+(?P<contract_date>\d{2}-\d{2}-\d{4})\s+(?P<stt>[0-9]+\.?[0-9]*)\s+(?P<transaction_charges>[0-9]+\.?[0-9]*)\s+(?P<stamp_duty>[0-9]+\.?[0-9]*)\s+Net amount payable by Client Rs\.\s+(?P<net_payable>[0-9]+\.?[0-9]*)"
    ).unwrap();

    static ref SETTLEMENT_RELAXED: Regex = Regex::new(
        r"(?i)(?P<settlement_date>\d{2}-\d{2}-\d{4}).*?ISEC/\S+.*?(?P<settlement_no>\d{6,}).*?(?P<contract_date>\d{2}-\d{2}-\d{4}).*?(?P<stt>[0-9]+\.?[0-9]*).*?(?P<transaction_charges>[0-9]+\.?[0-9]*).*?(?P<stamp_duty>[0-9]+\.?[0-9]*).*?Net amount payable by Client Rs\.?\s*(?P<net_payable>[0-9]+\.?[0-9]*)"
    ).unwrap();
}

pub fn format() -> FormatSpec {
    FormatSpec::new("icici", "ICICI Securities equity transaction statement", assemble_trade)
        .with_marker(&MARKER)
        .with_header(HeaderExtractor::new(vec![
            HeaderField::new("client", vec![HeaderRule::pattern("to_block", &CLIENT)]),
            HeaderField::new("pan", vec![HeaderRule::pattern("labelled", &PAN)]),
            HeaderField::new("period_from", vec![HeaderRule::pattern("period", &PERIOD)]),
            HeaderField::new("period_to", vec![HeaderRule::pattern("period", &PERIOD)]),
        ]))
        .with_anchor(
            AnchorScan::new(
                &ISIN,
                ChunkSpan::PrecedingAnchor,
                ChunkGrammar::Patterns(PatternSet::new().variant("isin_tail", &TRADE_TAIL)),
            )
            .with_backtracker(backtracker()),
        )
        .with_summary(
            SummaryRule::new(
                "settlement",
                PatternSet::new()
                    .variant("settlement_strict", &SETTLEMENT_STRICT)
                    .variant("settlement_relaxed", &SETTLEMENT_RELAXED),
                assemble_settlement,
            )
            .all_matches(),
        )
}

fn is_short_time(value: &str) -> bool {
    value.len() == 5
}

fn backtracker() -> ContextBacktracker {
    let dates = PatternSet::new().variant("dmy", &DATE_DMY_DASH);
    ContextBacktracker::new(vec![
        ContextField::new("contract_no", PatternSet::new().variant("isec", &CONTRACT_REF)),
        ContextField::new(
            "exchange_contract_no",
            PatternSet::new().variant("nse", &EXCHANGE_CONTRACT),
        ),
        ContextField::new("settlement_date", dates.clone()),
        ContextField::new("trade_date", dates.clone()).pick(Pick::NthFromLast(2)),
        ContextField::new("order_date", dates).pick(Pick::NthFromLast(3)),
        ContextField::new("order_time", PatternSet::new().variant("hms", &TIME_HMS)),
        ContextField::new("trade_time", PatternSet::new().variant("hm", &TIME_TOKEN)).accept(is_short_time),
        ContextField::new("trade_no", PatternSet::new().variant("digits", &TRADE_NO))
            .between(Some("order_time"), Some("trade_date")),
    ])
}

fn assemble_trade(fields: &FieldSet, _ctx: &DocumentContext<'_>) -> RecordBody {
    let security = fields
        .get("security")
        .map(|s| squash(&LEADING_NON_LETTERS.replace(s, "")))
        .filter(|s| !s.is_empty());
    let exchange_contract_no = fields.get("exchange_contract_no").map(|s| truncate_chars(s, 16));

    let mut trade = TradeRecord {
        contract_no: fields.text("contract_no"),
        exchange: exchange_contract_no.as_ref().map(|_| "NSE".to_string()),
        exchange_contract_no,
        trade_date: fields.date("trade_date"),
        settlement_date: fields.date("settlement_date"),
        security,
        isin: fields.text("isin"),
        side: fields.get("side").and_then(Side::from_token),
        quantity: fields.quantity("quantity"),
        gross_rate: fields.amount("price"),
        gross_total: fields.amount("total"),
        total_brokerage: fields.amount("brokerage"),
        net_amount: fields.amount("net"),
        order_date: fields.date("order_date"),
        order_time: fields.time("order_time"),
        trade_no: fields.text("trade_no"),
        trade_time: fields.time("trade_time"),
        ..Default::default()
    };

    if let Some(gst) = fields.amount("gst") {
        trade.charges.insert("gst".to_string(), gst);
        trade.other_charges_total = Some(gst);
    }

    RecordBody::Trade(trade)
}

fn assemble_settlement(fields: &FieldSet, _ctx: &DocumentContext<'_>) -> RecordBody {
    RecordBody::Settlement(SettlementRecord {
        settlement_no: fields.text("settlement_no"),
        settlement_date: fields.date("settlement_date"),
        contract_date: fields.date("contract_date"),
        stt: fields.amount("stt"),
        transaction_charges: fields.amount("transaction_charges"),
        stamp_duty: fields.amount("stamp_duty"),
        net_payable: fields.amount("net_payable"),
    })
}
