//! IIFL contract notes.
//!
//! Current notes print one trade per line with order and trade ids. Older
//! notes print every column on its own line, and long security names wrap
//! onto a second line.

use lazy_static::lazy_static;
use regex::Regex;

use super::FormatSpec;
use crate::models::{RecordBody, Side, TradeRecord};
use crate::statement::assemble::{DocumentContext, parse_signed_amount};
use crate::statement::direct::DirectRowParser;
use crate::statement::header::{HeaderExtractor, HeaderField, HeaderRule};
use crate::statement::rules::patterns::{LINE_INT, LINE_MONEY, LINE_SIDE, LINE_TIME, MONEY, NUM};
use crate::statement::rules::{FieldSet, PatternSet};
use crate::statement::window::{FieldGate, WindowLayout, WindowedReconstructor};

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"(?i)\bIIFL\b|India Infoline").unwrap();

    static ref TRADE_DATE: Regex = Regex::new(
        r"(?i)Trade\s*Date\s*:?\s*(\d{2}/\d{2}/\d{4}|\d{2}-[A-Za-z]{3}-\d{4}|\d{8})"
    ).unwrap();

    static ref ROW_TAIL: String = format!(
        r"(?P<security>[A-Z0-9.&_-]+) (?P<exchange>NSE|BSE) ?[- ] ?(?P<side>BUY|SELL) (?P<quantity>\d+) (?P<gross_rate>{n}) (?P<brokerage_per_unit>{n}) (?P<net_rate>{n}) (?P<net_amount>{m})(?: (?P<dr_cr>Dr|Cr))?$",
        n = NUM,
        m = MONEY
    );

    static ref ROW_WITH_IDS: Regex = Regex::new(&format!(
        r"(?i)^(?P<order_no>\d{{12,20}}) (?P<order_time>\d{{2}}:\d{{2}}:\d{{2}}) (?P<trade_no>\d{{6,12}}) (?P<trade_time>\d{{2}}:\d{{2}}:\d{{2}}) {}",
        *ROW_TAIL
    )).unwrap();

    static ref ROW_WITHOUT_IDS: Regex = Regex::new(&format!(r"(?i)^{}", *ROW_TAIL)).unwrap();

    // Multi-line layout
    static ref ORDER_NO: Regex = Regex::new(r"^\d{16}$").unwrap();

    static ref TRADE_NO: Regex = Regex::new(r"^\d{8}$").unwrap();

    static ref ANY_LINE: Regex = Regex::new(r"^.+$").unwrap();

    static ref JOINED_TAIL: Regex = Regex::new(&format!(
        r"(?i)^(?P<side>Buy|Sell) (?P<quantity>\d+) (?P<gross_rate>{m}) (?P<brokerage_per_unit>{m}) (?P<net_rate>{m}) (?P<net_amount>{m})$",
        m = MONEY
    )).unwrap();

    static ref NOT_A_RECORD: Regex = Regex::new(r"^(?:Total ::|Total \(Before Levies\)|Page No)").unwrap();
}

pub fn format() -> FormatSpec {
    FormatSpec::new("iifl", "IIFL contract note", assemble)
        .with_marker(&MARKER)
        .with_header(HeaderExtractor::new(vec![HeaderField::new(
            "trade_date",
            vec![HeaderRule::pattern("labelled", &TRADE_DATE)],
        )]))
        .with_direct(DirectRowParser::new(
            PatternSet::new()
                .variant("with_ids", &ROW_WITH_IDS)
                .variant("without_ids", &ROW_WITHOUT_IDS),
        ))
        .with_windowed(windowed())
}

fn windowed() -> WindowedReconstructor {
    let head = || {
        vec![
            FieldGate::new("order_time", &LINE_TIME),
            FieldGate::new("trade_no", &TRADE_NO),
            FieldGate::new("trade_time", &LINE_TIME),
            FieldGate::new("security", &ANY_LINE).flex(),
        ]
    };

    let mut split_tail = head();
    split_tail.extend([
        FieldGate::new("side", &LINE_SIDE),
        FieldGate::new("quantity", &LINE_INT),
        FieldGate::new("gross_rate", &LINE_MONEY),
        FieldGate::new("brokerage_per_unit", &LINE_MONEY),
        FieldGate::new("net_rate", &LINE_MONEY),
        FieldGate::new("net_amount", &LINE_MONEY),
    ]);

    let mut joined_tail = head();
    joined_tail.push(FieldGate::new("tail", &JOINED_TAIL));

    WindowedReconstructor::new(
        FieldGate::new("order_no", &ORDER_NO),
        vec![
            WindowLayout::new("split_tail", split_tail),
            WindowLayout::new("joined_tail", joined_tail),
        ],
    )
    .with_skip(&NOT_A_RECORD)
}

fn assemble(fields: &FieldSet, ctx: &DocumentContext<'_>) -> RecordBody {
    let exchange = fields
        .get("exchange")
        .map(str::to_uppercase)
        .unwrap_or_else(|| "NSE".to_string());

    RecordBody::Trade(TradeRecord {
        trade_date: ctx.date("trade_date"),
        exchange: Some(exchange),
        segment: Some("CASH".to_string()),
        security: fields.text("security"),
        side: fields.get("side").and_then(Side::from_token),
        quantity: fields.quantity("quantity"),
        gross_rate: fields.amount("gross_rate"),
        brokerage_per_unit: fields.amount("brokerage_per_unit"),
        net_rate: fields.amount("net_rate"),
        net_amount: fields
            .get("net_amount")
            .and_then(|v| parse_signed_amount(v, fields.get("dr_cr"))),
        order_no: fields.text("order_no"),
        order_time: fields.time("order_time"),
        trade_no: fields.text("trade_no"),
        trade_time: fields.time("trade_time"),
        ..Default::default()
    })
}
