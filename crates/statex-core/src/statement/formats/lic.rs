//! LIC premium receipts.
//!
//! A receipt is one record built from labelled header values. Receipt files
//! are usually named after the period they pay (`2017 June receipt.pdf`), so
//! the year and month come from the source name.

use lazy_static::lazy_static;
use regex::Regex;

use super::FormatSpec;
use crate::models::{PremiumRecord, RecordBody};
use crate::statement::assemble::{DocumentContext, parse_date, parse_time};
use crate::statement::header::{HeaderExtractor, HeaderField, HeaderRule};
use crate::statement::rules::FieldSet;

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"(?i)Life Insurance Corporation|Premium Receipt|Policy\s*No").unwrap();

    // Labels of the neighbouring column that leak into a value.
    static ref TRAILING_LABELS: Regex = Regex::new(r"\s+(?:Servicing|Branch|Plan|Term|Next|Due|Reg|No)\b.*$").unwrap();

    static ref TRANSACTION_NO: Regex = Regex::new(r"(?i)Transaction\s*No\.?\s*:?\s*([A-Z0-9]+)").unwrap();
    static ref PR_NUMBER: Regex = Regex::new(r"(?i)\bPR\d{10,}\b").unwrap();

    static ref RECEIPT_NO: Regex = Regex::new(r"(?i)Receipt\s*No\s*:\s*([A-Z0-9]+)").unwrap();
    static ref RECEIPT_PR: Regex = Regex::new(r"(?i)Receipt\s*No\s*:?\s*(PR\d+)").unwrap();

    static ref DATE_TIME_BRACKETED: Regex = Regex::new(
        r"(?i)Date\s*\(\s*Time\s*\)\s*:\s*([0-9/\-]{8,}\s*\(\s*[0-9:]{5,}\s*\))"
    ).unwrap();
    static ref DATE_TIME_PLAIN: Regex = Regex::new(r"(?i)Date\s*\(\s*Time\s*\)\s*:\s*([0-9/\-]{8,}[ 0-9:]*)").unwrap();
    static ref DATE_ONLY: Regex = Regex::new(r"(?i)Date\s*:\s*([0-9]{1,2}[/\-][0-9]{1,2}[/\-][0-9]{2,4}.*)").unwrap();

    static ref COLLECTING_CODE: Regex = Regex::new(r"(?i)Collecting\s*Branch\s*:\s*([A-Z0-9]+)").unwrap();
    static ref COLLECTING_ANY: Regex = Regex::new(r"(?i)Collecting\s*Branch\s*:\s*(\S+)").unwrap();

    static ref SERVICING: Regex = Regex::new(r"(?i)Servicing\s*Branch\s*:\s*(.+)").unwrap();

    static ref HOLDER_TITLE: Regex = Regex::new(r"(?i)Smt\./Ms\./Shri\s*:\s*([A-Za-z.,\- ]+)").unwrap();
    static ref HOLDER_RECEIVED: Regex = Regex::new(r"(?i)Received.*?from\s*:\s*([A-Za-z][A-Za-z .&]+)").unwrap();
    static ref HOLDER_FROM: Regex = Regex::new(r"(?i)from\s*:\s*([A-Za-z][A-Za-z .&]+)").unwrap();

    static ref POLICY_LABELLED: Regex = Regex::new(r"(?i)\bPolicy\s*No\b\.?\s*:?\s*([0-9]{6,})").unwrap();
    static ref POLICY_ROW: Regex = Regex::new(
        r"(?i)\b(\d{6,})\b\s+[A-Za-z. ]+?\s+(?:(?:Yes|No)\s+)?\d{3}\s*/?\s*\d{1,2}"
    ).unwrap();

    static ref INST_PREM: Regex = Regex::new(r"(?i)Inst\.?\s*Prem\(Rs\)\s*([0-9,.]+)").unwrap();
    static ref INST_PREMIUM: Regex = Regex::new(r"(?i)Inst\.?\s*Premium\s*([0-9,.]+)").unwrap();

    static ref MODE: Regex = Regex::new(r"\bMode\b\s*([A-Z]+)\b").unwrap();

    static ref SUM_ASSURED: Regex = Regex::new(r"(?i)Sum\s*Assured\s*[,(Rs)]*\s*([0-9,.]+)").unwrap();

    static ref TOTAL_PREMIUM: Regex = Regex::new(r"(?i)Total\s*Premium\s*([0-9,.]+)").unwrap();

    static ref LATE_FEE: Regex = Regex::new(r"(?i)Late\s*Fee\s*([0-9,.]+)").unwrap();

    static ref CD_CHARGES: Regex = Regex::new(r"(?i)CD\s*Charges\s*([0-9,.]+)").unwrap();

    static ref GST_TAX: Regex = Regex::new(r"(?i)Tax\s*\*?\s*([0-9,.]+)").unwrap();

    static ref CGST: Regex = Regex::new(r"(?i)CGST\s*([0-9,.]+)").unwrap();

    static ref SGST: Regex = Regex::new(r"(?i)SGST/UTGST\s*([0-9,.]+)").unwrap();

    static ref TOTAL_AMT: Regex = Regex::new(r"(?i)Total\s*Amt\s*[(Rs)]*\s*([0-9,.]+)").unwrap();
    static ref TOTAL_AMOUNT: Regex = Regex::new(r"(?i)Total\s*Amount\s*([0-9,.]+)").unwrap();

    static ref NEXT_DUE: Regex = Regex::new(r"(?i)Next\s*Due\s*([0-9/]{4,})").unwrap();

    static ref REG_NO: Regex = Regex::new(r"(?i)Reg\.?\s*No\.?\s*([A-Z0-9]+)").unwrap();
    static ref GSTIN: Regex = Regex::new(r"(?i)\b(\d{2}[A-Z]{5}\d{4}[A-Z]\dZ\d)\b").unwrap();

    static ref REVIVAL: Regex = Regex::new(r"(?i)Revival\s*\(Yes/No\)\s*([A-Za-z]+)").unwrap();

    // Source name hints
    static ref FILE_YEAR: Regex = Regex::new(r"(?:^|[\s_\-/\\])(?P<period_year>(?:19|20)\d{2})(?:[\s_\-/\\.]|$)").unwrap();
    static ref FILE_MONTH: Regex = Regex::new(
        r"(?i)(?:^|[\s_\-/\\])(?P<period_month>jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)(?:[\s_\-/\\.]|$)"
    ).unwrap();

    // Parts of the date-time value
    static ref PAID_DATE: Regex = Regex::new(r"\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}").unwrap();
    static ref PAID_TIME: Regex = Regex::new(r"\d{2}:\d{2}(?::\d{2})?").unwrap();
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn format() -> FormatSpec {
    FormatSpec::new("lic", "LIC premium receipt", assemble)
        .with_marker(&MARKER)
        .with_header(HeaderExtractor::new(vec![
            field(
                "transaction_no",
                vec![
                    HeaderRule::pattern("labelled", &TRANSACTION_NO),
                    HeaderRule::pattern("pr_number", &PR_NUMBER),
                ],
            ),
            field(
                "receipt_no",
                vec![
                    HeaderRule::pattern("labelled", &RECEIPT_NO),
                    HeaderRule::pattern("pr_number", &RECEIPT_PR),
                ],
            ),
            field(
                "date_time",
                vec![
                    HeaderRule::pattern("bracketed", &DATE_TIME_BRACKETED),
                    HeaderRule::pattern("plain", &DATE_TIME_PLAIN),
                    HeaderRule::pattern("date_only", &DATE_ONLY),
                ],
            ),
            field(
                "collecting_branch",
                vec![
                    HeaderRule::pattern("code", &COLLECTING_CODE),
                    HeaderRule::pattern("any", &COLLECTING_ANY),
                ],
            ),
            field("servicing_branch", vec![HeaderRule::pattern("labelled", &SERVICING)]),
            field(
                "holder",
                vec![
                    HeaderRule::pattern("title", &HOLDER_TITLE),
                    HeaderRule::pattern("received_from", &HOLDER_RECEIVED),
                    HeaderRule::pattern("from", &HOLDER_FROM),
                ],
            ),
            field(
                "policy_no",
                vec![
                    HeaderRule::pattern("labelled", &POLICY_LABELLED),
                    HeaderRule::pattern("table_row", &POLICY_ROW),
                ],
            ),
            field(
                "installment_premium",
                vec![
                    HeaderRule::pattern("prem_rs", &INST_PREM),
                    HeaderRule::pattern("premium", &INST_PREMIUM),
                ],
            ),
            field("mode", vec![HeaderRule::pattern("labelled", &MODE)]),
            field("sum_assured", vec![HeaderRule::pattern("labelled", &SUM_ASSURED)]),
            field("total_premium", vec![HeaderRule::pattern("labelled", &TOTAL_PREMIUM)]),
            field("late_fee", vec![HeaderRule::pattern("labelled", &LATE_FEE)]),
            field("cd_charges", vec![HeaderRule::pattern("labelled", &CD_CHARGES)]),
            field("gst", vec![HeaderRule::pattern("labelled", &GST_TAX)]),
            field("cgst", vec![HeaderRule::pattern("labelled", &CGST)]),
            field("sgst", vec![HeaderRule::pattern("labelled", &SGST)]),
            field(
                "total_amount",
                vec![
                    HeaderRule::pattern("amt", &TOTAL_AMT),
                    HeaderRule::pattern("amount", &TOTAL_AMOUNT),
                ],
            ),
            field("next_due", vec![HeaderRule::pattern("labelled", &NEXT_DUE)]),
            field(
                "registration_no",
                vec![
                    HeaderRule::pattern("labelled", &REG_NO),
                    HeaderRule::pattern("gstin", &GSTIN),
                ],
            ),
            field("revival", vec![HeaderRule::pattern("labelled", &REVIVAL)]),
            HeaderField::new("period_year", vec![HeaderRule::pattern("file_name", &FILE_YEAR)]).from_source_name(),
            HeaderField::new("period_month", vec![HeaderRule::pattern("file_name", &FILE_MONTH)]).from_source_name(),
        ]))
        .with_header_record()
}

fn field(name: &'static str, rules: Vec<HeaderRule>) -> HeaderField {
    HeaderField::new(name, rules).with_strip(&TRAILING_LABELS)
}

/// Full month name for a month token (`dec`, `Sept`, `june`).
fn month_name(token: &str) -> Option<&'static str> {
    let prefix: String = token.chars().take(3).collect::<String>().to_lowercase();
    MONTHS
        .iter()
        .find(|m| m[..3].eq_ignore_ascii_case(&prefix))
        .copied()
}

fn assemble(_fields: &FieldSet, ctx: &DocumentContext<'_>) -> RecordBody {
    let date_time = ctx.text("date_time");
    let paid_on = date_time
        .as_deref()
        .and_then(|dt| PAID_DATE.find(dt))
        .and_then(|m| parse_date(m.as_str()));
    let paid_at = date_time
        .as_deref()
        .and_then(|dt| PAID_TIME.find(dt))
        .and_then(|m| parse_time(m.as_str()));

    RecordBody::Premium(PremiumRecord {
        policy_no: ctx.text("policy_no"),
        holder: ctx.text("holder"),
        transaction_no: ctx.text("transaction_no"),
        receipt_no: ctx.text("receipt_no"),
        paid_on,
        paid_at,
        collecting_branch: ctx.text("collecting_branch"),
        servicing_branch: ctx.text("servicing_branch"),
        installment_premium: ctx.amount("installment_premium"),
        mode: ctx.text("mode"),
        sum_assured: ctx.amount("sum_assured"),
        total_premium: ctx.amount("total_premium"),
        late_fee: ctx.amount("late_fee"),
        cd_charges: ctx.amount("cd_charges"),
        gst: ctx.amount("gst"),
        cgst: ctx.amount("cgst"),
        sgst: ctx.amount("sgst"),
        total_amount: ctx.amount("total_amount"),
        next_due: ctx.text("next_due"),
        registration_no: ctx.text("registration_no"),
        revival: ctx.text("revival"),
        period_year: ctx.header.get("period_year").and_then(|y| y.parse().ok()),
        period_month: ctx.header.get("period_month").and_then(month_name).map(str::to_string),
    })
}
