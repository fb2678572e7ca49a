//! Record and report rendering.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use statex_core::models::{RecordBody, RecordKind, TradeRecord, TransactionRecord};
use statex_core::statement::DocumentReport;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON report
    Json,
    /// CSV, one table per record kind
    Csv,
    /// Plain text summary
    Text,
}

/// Itemized trade charges, in column order.
const CHARGES: &[&str] = &["stt", "exchange_charges", "turnover_fees", "cess", "stamp_duty", "gst"];

const TRADE_COLUMNS: &[&str] = &[
    "source",
    "page",
    "format",
    "contract_no",
    "exchange_contract_no",
    "trade_date",
    "settlement_no",
    "settlement_date",
    "exchange",
    "segment",
    "security",
    "isin",
    "side",
    "quantity",
    "gross_rate",
    "gross_total",
    "brokerage_per_unit",
    "total_brokerage",
    "net_rate",
    "net_amount",
    "stt",
    "exchange_charges",
    "turnover_fees",
    "cess",
    "stamp_duty",
    "gst",
    "other_charges_total",
    "net_payable",
    "order_no",
    "order_date",
    "order_time",
    "trade_no",
    "trade_time",
];

const SETTLEMENT_COLUMNS: &[&str] = &[
    "source",
    "page",
    "format",
    "settlement_no",
    "settlement_date",
    "contract_date",
    "stt",
    "transaction_charges",
    "stamp_duty",
    "net_payable",
];

const BENEFIT_COLUMNS: &[&str] = &[
    "source",
    "page",
    "format",
    "isin",
    "security",
    "nature",
    "record_date",
    "units",
    "ratio",
    "payment_date",
    "amount",
];

const PASSBOOK_COLUMNS: &[&str] = &[
    "establishment_id",
    "establishment_name",
    "member_id",
    "member_name",
    "date_of_birth",
    "uan",
    "year",
    "transaction_type",
    "wage_month",
    "date",
    "type",
    "particulars",
    "wages",
    "contribution",
    "employee_share",
    "employer_share",
    "pension_share",
    "source",
    "page",
];

const PREMIUM_COLUMNS: &[&str] = &[
    "source",
    "page",
    "policy_no",
    "holder",
    "transaction_no",
    "receipt_no",
    "paid_on",
    "paid_at",
    "collecting_branch",
    "servicing_branch",
    "installment_premium",
    "mode",
    "sum_assured",
    "total_premium",
    "late_fee",
    "cd_charges",
    "gst",
    "cgst",
    "sgst",
    "total_amount",
    "next_due",
    "registration_no",
    "revival",
    "year",
    "month",
];

/// CSV header for a record kind.
pub fn columns(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::Trade => TRADE_COLUMNS,
        RecordKind::Settlement => SETTLEMENT_COLUMNS,
        RecordKind::Benefit => BENEFIT_COLUMNS,
        RecordKind::Passbook => PASSBOOK_COLUMNS,
        RecordKind::Premium => PREMIUM_COLUMNS,
    }
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

fn charge(trade: &TradeRecord, name: &str) -> String {
    trade.charges.get(name).map(Decimal::to_string).unwrap_or_default()
}

/// CSV cells of a record, matching [`columns`] for its kind.
pub fn row(record: &TransactionRecord) -> Vec<String> {
    let source = record.provenance.source.clone();
    let page = record.provenance.page.to_string();
    let format = record.format.clone();

    match &record.body {
        RecordBody::Trade(t) => {
            let mut cells = vec![
                source,
                page,
                format,
                opt(&t.contract_no),
                opt(&t.exchange_contract_no),
                opt(&t.trade_date),
                opt(&t.settlement_no),
                opt(&t.settlement_date),
                opt(&t.exchange),
                opt(&t.segment),
                opt(&t.security),
                opt(&t.isin),
                t.side.map(|s| s.as_str().to_string()).unwrap_or_default(),
                opt(&t.quantity),
                opt(&t.gross_rate),
                opt(&t.gross_total),
                opt(&t.brokerage_per_unit),
                opt(&t.total_brokerage),
                opt(&t.net_rate),
                opt(&t.net_amount),
            ];
            cells.extend(CHARGES.iter().map(|name| charge(t, name)));
            cells.extend([
                opt(&t.other_charges_total),
                opt(&t.net_payable),
                opt(&t.order_no),
                opt(&t.order_date),
                opt(&t.order_time),
                opt(&t.trade_no),
                opt(&t.trade_time),
            ]);
            cells
        }
        RecordBody::Settlement(s) => vec![
            source,
            page,
            format,
            opt(&s.settlement_no),
            opt(&s.settlement_date),
            opt(&s.contract_date),
            opt(&s.stt),
            opt(&s.transaction_charges),
            opt(&s.stamp_duty),
            opt(&s.net_payable),
        ],
        RecordBody::Benefit(b) => vec![
            source,
            page,
            format,
            opt(&b.isin),
            opt(&b.security),
            opt(&b.nature),
            opt(&b.record_date),
            opt(&b.units),
            opt(&b.ratio),
            opt(&b.payment_date),
            opt(&b.amount),
        ],
        RecordBody::Passbook(p) => vec![
            opt(&p.establishment_id),
            opt(&p.establishment_name),
            opt(&p.member_id),
            opt(&p.member_name),
            opt(&p.date_of_birth),
            opt(&p.uan),
            opt(&p.year),
            p.entry.as_str().to_string(),
            opt(&p.wage_month),
            opt(&p.date),
            opt(&p.type_code),
            opt(&p.particulars),
            opt(&p.wages),
            opt(&p.contribution),
            opt(&p.employee_share),
            opt(&p.employer_share),
            opt(&p.pension_share),
            source,
            page,
        ],
        RecordBody::Premium(p) => vec![
            source,
            page,
            opt(&p.policy_no),
            opt(&p.holder),
            opt(&p.transaction_no),
            opt(&p.receipt_no),
            opt(&p.paid_on),
            opt(&p.paid_at),
            opt(&p.collecting_branch),
            opt(&p.servicing_branch),
            opt(&p.installment_premium),
            opt(&p.mode),
            opt(&p.sum_assured),
            opt(&p.total_premium),
            opt(&p.late_fee),
            opt(&p.cd_charges),
            opt(&p.gst),
            opt(&p.cgst),
            opt(&p.sgst),
            opt(&p.total_amount),
            opt(&p.next_due),
            opt(&p.registration_no),
            opt(&p.revival),
            opt(&p.period_year),
            opt(&p.period_month),
        ],
    }
}

/// Order by date (undated last), then source, then page.
pub fn sort_records(records: &mut [TransactionRecord]) {
    fn date_key(date: Option<NaiveDate>) -> (bool, Option<NaiveDate>) {
        (date.is_none(), date)
    }

    records.sort_by(|a, b| {
        date_key(a.primary_date())
            .cmp(&date_key(b.primary_date()))
            .then_with(|| a.provenance.source.cmp(&b.provenance.source))
            .then_with(|| a.provenance.page.cmp(&b.provenance.page))
    });
}

/// Records grouped by kind.
pub fn group_by_kind(records: Vec<TransactionRecord>) -> BTreeMap<RecordKind, Vec<TransactionRecord>> {
    let mut groups: BTreeMap<RecordKind, Vec<TransactionRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.kind()).or_default().push(record);
    }
    groups
}

/// Write one kind's records as CSV with its fixed header.
pub fn write_csv<W: Write>(writer: W, kind: RecordKind, records: &[TransactionRecord]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(columns(kind))?;
    for record in records.iter().filter(|r| r.kind() == kind) {
        wtr.write_record(row(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// CSV for a mixed record set: one table per kind, separated by a blank line.
pub fn records_csv(records: &[TransactionRecord]) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    for (idx, (kind, group)) in group_by_kind(records.to_vec()).into_iter().enumerate() {
        if idx > 0 {
            buf.push(b'\n');
        }
        write_csv(&mut buf, kind, &group)?;
    }
    Ok(String::from_utf8(buf)?)
}

pub fn format_report(report: &DocumentReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => records_csv(report.outcome.records()),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_text(report: &DocumentReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document: {}\n", report.source));
    output.push_str(&format!(
        "Format: {}\n",
        report.format.as_deref().unwrap_or("unknown")
    ));
    output.push_str(&format!("Outcome: {}\n", report.outcome.label()));
    if let Some(strategy) = report.diagnostics.strategy {
        output.push_str(&format!("Strategy: {}\n", strategy.as_str()));
    }
    if let Some(reason) = &report.diagnostics.unreadable {
        output.push_str(&format!("Unreadable: {}\n", reason));
    }
    if report.diagnostics.needs_ocr {
        output.push_str("Needs OCR: yes\n");
    }
    if report.diagnostics.table_source_missing {
        output.push_str("Table source missing: yes\n");
    }

    if !report.header.is_empty() {
        output.push('\n');
        output.push_str("Header:\n");
        for (name, value) in report.header.iter() {
            output.push_str(&format!("  {}: {}\n", name, value));
        }
    }

    output.push('\n');
    output.push_str(&format!("Records: {}\n", report.record_count()));
    for record in report.outcome.records() {
        output.push_str(&format!("  {}\n", describe(record)));
    }
    if report.diagnostics.dropped_records > 0 {
        output.push_str(&format!("Dropped: {}\n", report.diagnostics.dropped_records));
    }

    output
}

/// One-line description of a record.
fn describe(record: &TransactionRecord) -> String {
    let date = record.primary_date().map(|d| d.to_string()).unwrap_or_default();
    match &record.body {
        RecordBody::Trade(t) => format!(
            "{} trade {} {} x {} = {}",
            date,
            t.side.map(|s| s.as_str()).unwrap_or("?"),
            t.security.as_deref().or(t.isin.as_deref()).unwrap_or("?"),
            opt(&t.quantity),
            opt(&t.net_amount),
        ),
        RecordBody::Settlement(s) => format!(
            "{} settlement {} payable {}",
            date,
            opt(&s.settlement_no),
            opt(&s.net_payable)
        ),
        RecordBody::Benefit(b) => format!(
            "{} {} {} amount {}",
            date,
            opt(&b.nature),
            b.security.as_deref().or(b.isin.as_deref()).unwrap_or("?"),
            opt(&b.amount)
        ),
        RecordBody::Passbook(p) => format!(
            "{} {} employee {} employer {} pension {}",
            date,
            p.entry.as_str(),
            opt(&p.employee_share),
            opt(&p.employer_share),
            opt(&p.pension_share)
        ),
        RecordBody::Premium(p) => format!(
            "{} premium policy {} total {}",
            date,
            opt(&p.policy_no),
            opt(&p.total_amount)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statex_core::models::{Provenance, Side};
    use std::str::FromStr;

    fn trade(source: &str, day: Option<u32>) -> TransactionRecord {
        let mut charges = BTreeMap::new();
        charges.insert("stt".to_string(), Decimal::from_str("13.00").unwrap());
        TransactionRecord {
            provenance: Provenance::new(source, 1),
            format: "geojit".to_string(),
            body: RecordBody::Trade(TradeRecord {
                security: Some("HDFC BANK, LTD".to_string()),
                side: Some(Side::Buy),
                trade_date: day.and_then(|d| NaiveDate::from_ymd_opt(2020, 7, d)),
                charges,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_rows_match_columns() {
        let record = trade("a.pdf", Some(7));
        assert_eq!(row(&record).len(), columns(RecordKind::Trade).len());
        assert_eq!(row(&record)[20], "13.00");
    }

    #[test]
    fn test_sort_by_date_then_source() {
        let mut records = vec![
            trade("b.pdf", Some(8)),
            trade("c.pdf", None),
            trade("a.pdf", Some(8)),
            trade("d.pdf", Some(1)),
        ];
        sort_records(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.provenance.source.as_str()).collect();
        assert_eq!(order, vec!["d.pdf", "a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = records_csv(&[trade("a.pdf", Some(7))]).unwrap();
        assert!(csv.starts_with("source,page,format,contract_no"));
        assert!(csv.contains("\"HDFC BANK, LTD\""));
    }
}
