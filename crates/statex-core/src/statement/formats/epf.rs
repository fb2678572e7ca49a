//! EPF member passbooks.
//!
//! Monthly contribution rows plus the yearly interest and closing balance
//! lines. Passbook files are named `<ESTABLISHMENT>_<YEAR>.pdf`, which
//! supplies the year and a fallback establishment id.

use lazy_static::lazy_static;
use regex::Regex;

use super::FormatSpec;
use crate::models::{PassbookEntry, PassbookRecord, RecordBody};
use crate::statement::anchor::{AnchorScan, ChunkGrammar, ChunkSpan};
use crate::statement::assemble::{DocumentContext, squash};
use crate::statement::direct::DirectRowParser;
use crate::statement::header::{HeaderExtractor, HeaderField, HeaderRule};
use crate::statement::orchestrator::SummaryRule;
use crate::statement::rules::patterns::PIPES;
use crate::statement::rules::{FieldSet, PatternSet};
use crate::text::View;

lazy_static! {
    static ref MARKER: Regex = Regex::new(r"(?i)Member Passbook|Establishment ID/Name|Cont\.\s+For\s+Due-?Month").unwrap();

    static ref ROW: Regex = Regex::new(
        r"(?P<wage_month>[A-Za-z]{3}-\d{4})\s+(?P<date>\d{2}-\d{2}-\d{4})\s+(?P<type_code>[A-Z]{2})\s+(?P<particulars>Cont\.\s+For\s+Due-?Month\s+\d{6})\s+(?P<wages>[0-9,]+)\s+(?P<contribution>[0-9,]+)\s+(?P<employee_share>[0-9,]+)\s+(?P<employer_share>[0-9,]+)\s+(?P<pension_share>[0-9,]+)"
    ).unwrap();

    static ref ROW_START: Regex = Regex::new(r"\b[A-Za-z]{3}-\d{4}\s+\d{2}-\d{2}-\d{4}").unwrap();

    // Header
    static ref ESTABLISHMENT: Regex = Regex::new(
        r"Establishment ID/Name\s+(?P<establishment_id>[A-Z0-9]+)\s*/\s*(?P<establishment_name>.*?)\s+Member"
    ).unwrap();

    static ref MEMBER: Regex = Regex::new(
        r"Member ID/Name\s+(?P<member_id>[A-Z0-9]+)\s*/\s*(?P<member_name>.*?)\s+Date of Birth"
    ).unwrap();

    static ref DATE_OF_BIRTH: Regex = Regex::new(r"Date of Birth\s+([0-9]{2}-[0-9]{2}-[0-9]{4})").unwrap();

    static ref UAN: Regex = Regex::new(r"UAN\s+([0-9]{9,})").unwrap();

    static ref FILE_NAME: Regex = Regex::new(
        r"(?i)(?:^|[/\\])(?P<file_establishment_id>[A-Z0-9]+)_(?P<year>\d{4})\.pdf$"
    ).unwrap();

    // Yearly lines
    static ref INTEREST: Regex = Regex::new(
        r"(?i)Int\.\s+Updated\s+upto\s+(?P<date>\d{2}/\d{2}/\d{4})\s+(?P<employee_share>[0-9,]+)\s+(?P<employer_share>[0-9,]+)\s+(?P<pension_share>[0-9,]+)"
    ).unwrap();

    static ref CLOSING: Regex = Regex::new(
        r"(?i)Closing\s+Balance\s+as\s+on\s+(?P<date>\d{2}/\d{2}/\d{4})\s+(?P<employee_share>[0-9,]+)\s+(?P<employer_share>[0-9,]+)\s+(?P<pension_share>[0-9,]+)"
    ).unwrap();
}

pub fn format() -> FormatSpec {
    let rows = PatternSet::new().variant("contribution", &ROW);

    FormatSpec::new("epf", "EPF member passbook", assemble_contribution)
        .with_marker(&MARKER)
        .with_header(
            HeaderExtractor::new(vec![
                HeaderField::new("establishment_id", vec![HeaderRule::pattern("labelled", &ESTABLISHMENT)]),
                HeaderField::new("establishment_name", vec![HeaderRule::pattern("labelled", &ESTABLISHMENT)]),
                HeaderField::new("member_id", vec![HeaderRule::pattern("labelled", &MEMBER)]),
                HeaderField::new("member_name", vec![HeaderRule::pattern("labelled", &MEMBER)]),
                HeaderField::new("date_of_birth", vec![HeaderRule::pattern("labelled", &DATE_OF_BIRTH)]),
                HeaderField::new("uan", vec![HeaderRule::pattern("labelled", &UAN)]),
                HeaderField::new("file_establishment_id", vec![HeaderRule::pattern("file_name", &FILE_NAME)])
                    .from_source_name(),
                HeaderField::new("year", vec![HeaderRule::pattern("file_name", &FILE_NAME)]).from_source_name(),
            ])
            .with_view(View::Flat),
        )
        .with_direct(DirectRowParser::new(rows.clone()))
        .with_anchor(AnchorScan::new(&ROW_START, ChunkSpan::FollowingAnchor, ChunkGrammar::Patterns(rows)))
        .with_summary(SummaryRule::new(
            "interest",
            PatternSet::new().variant("int_updated", &INTEREST),
            assemble_interest,
        ))
        .with_summary(SummaryRule::new(
            "closing_balance",
            PatternSet::new().variant("closing", &CLOSING),
            assemble_closing,
        ))
}

/// Pipes become spaces and whitespace runs collapse.
fn clean(value: &str) -> String {
    squash(&PIPES.replace_all(value, " "))
}

fn clean_field(fields: &FieldSet, name: &str) -> Option<String> {
    fields.get(name).map(clean).filter(|s| !s.is_empty())
}

fn passbook(fields: &FieldSet, ctx: &DocumentContext<'_>, entry: PassbookEntry) -> PassbookRecord {
    let header = |name: &str| ctx.header.get(name).map(clean).filter(|s| !s.is_empty());

    PassbookRecord {
        establishment_id: header("establishment_id").or_else(|| header("file_establishment_id")),
        establishment_name: header("establishment_name"),
        member_id: header("member_id"),
        member_name: header("member_name"),
        date_of_birth: ctx.date("date_of_birth"),
        uan: header("uan"),
        year: ctx.header.get("year").and_then(|y| y.parse().ok()),
        entry,
        wage_month: clean_field(fields, "wage_month"),
        date: fields.date("date"),
        type_code: clean_field(fields, "type_code"),
        particulars: clean_field(fields, "particulars"),
        wages: fields.amount("wages"),
        contribution: fields.amount("contribution"),
        employee_share: fields.amount("employee_share"),
        employer_share: fields.amount("employer_share"),
        pension_share: fields.amount("pension_share"),
    }
}

fn assemble_contribution(fields: &FieldSet, ctx: &DocumentContext<'_>) -> RecordBody {
    RecordBody::Passbook(passbook(fields, ctx, PassbookEntry::Contribution))
}

fn assemble_interest(fields: &FieldSet, ctx: &DocumentContext<'_>) -> RecordBody {
    let mut record = passbook(fields, ctx, PassbookEntry::Interest);
    record.type_code = Some("CR".to_string());
    record.particulars = Some("Interest Updated".to_string());
    RecordBody::Passbook(record)
}

fn assemble_closing(fields: &FieldSet, ctx: &DocumentContext<'_>) -> RecordBody {
    let mut record = passbook(fields, ctx, PassbookEntry::ClosingBalance);
    record.type_code = Some("CR".to_string());
    record.particulars = Some("Closing Balance".to_string());
    RecordBody::Passbook(record)
}
