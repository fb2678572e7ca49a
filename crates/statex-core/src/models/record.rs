//! Transaction records produced by the extraction engine.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Where a record came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    /// Source document identifier.
    pub source: String,
    /// Page the record starts on (1-indexed).
    pub page: u32,
}

impl Provenance {
    pub fn new(source: impl Into<String>, page: u32) -> Self {
        Self {
            source: source.into(),
            page,
        }
    }
}

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Parse the side tokens used on contract notes (`B`, `Buy`, `SELL`, ...).
    pub fn from_token(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "b" | "buy" | "purchase" => Some(Self::Buy),
            "s" | "sell" | "sale" => Some(Self::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        }
    }
}

/// One executed trade on a contract note or transaction statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Contract note or reference number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_no: Option<String>,

    /// Exchange-side contract number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_contract_no: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_no: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_date: Option<NaiveDate>,

    /// Exchange code (NSE, BSE).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,

    /// Market segment (CASH, EQ, FO).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,

    /// Security name as printed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,

    /// Instrument identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,

    /// Price per unit before brokerage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_rate: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_total: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brokerage_per_unit: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_brokerage: Option<Decimal>,

    /// Price per unit after brokerage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_rate: Option<Decimal>,

    /// Net trade value; negative when the client is debited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<Decimal>,

    /// Statutory charges keyed by charge name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub charges: BTreeMap<String, Decimal>,

    /// Sum of the non-tax charges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_charges_total: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_payable: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_no: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_time: Option<NaiveTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_no: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_time: Option<NaiveTime>,
}

/// Settlement summary printed once per settlement cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub settlement_no: Option<String>,
    pub settlement_date: Option<NaiveDate>,
    pub contract_date: Option<NaiveDate>,
    pub stt: Option<Decimal>,
    pub transaction_charges: Option<Decimal>,
    pub stamp_duty: Option<Decimal>,
    pub net_payable: Option<Decimal>,
}

/// Corporate benefit (dividend, bonus, split) credited against a holding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenefitRecord {
    pub isin: Option<String>,
    pub security: Option<String>,
    /// Nature of the benefit, e.g. "Interim Dividend".
    pub nature: Option<String>,
    pub record_date: Option<NaiveDate>,
    pub units: Option<Decimal>,
    /// Percentage, ratio or per-unit value as printed.
    pub ratio: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
}

/// Kind of passbook entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassbookEntry {
    Contribution,
    Interest,
    ClosingBalance,
}

impl PassbookEntry {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contribution => "Contribution",
            Self::Interest => "Interest",
            Self::ClosingBalance => "ClosingBalance",
        }
    }
}

/// Provident fund passbook line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassbookRecord {
    pub establishment_id: Option<String>,
    pub establishment_name: Option<String>,
    pub member_id: Option<String>,
    pub member_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    /// Universal account number.
    pub uan: Option<String>,
    /// Passbook year, usually taken from the file name.
    pub year: Option<i32>,
    pub entry: PassbookEntry,
    /// Wage month as printed, e.g. "Apr-2020".
    pub wage_month: Option<String>,
    pub date: Option<NaiveDate>,
    /// Credit/debit code (CR, DR).
    pub type_code: Option<String>,
    pub particulars: Option<String>,
    pub wages: Option<Decimal>,
    pub contribution: Option<Decimal>,
    pub employee_share: Option<Decimal>,
    pub employer_share: Option<Decimal>,
    pub pension_share: Option<Decimal>,
}

/// Insurance premium receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PremiumRecord {
    pub policy_no: Option<String>,
    pub holder: Option<String>,
    pub transaction_no: Option<String>,
    pub receipt_no: Option<String>,
    pub paid_on: Option<NaiveDate>,
    pub paid_at: Option<NaiveTime>,
    pub collecting_branch: Option<String>,
    pub servicing_branch: Option<String>,
    pub installment_premium: Option<Decimal>,
    /// Payment mode (YLY, HLY, QLY, MLY).
    pub mode: Option<String>,
    pub sum_assured: Option<Decimal>,
    pub total_premium: Option<Decimal>,
    pub late_fee: Option<Decimal>,
    pub cd_charges: Option<Decimal>,
    pub gst: Option<Decimal>,
    pub cgst: Option<Decimal>,
    pub sgst: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    /// Next due period as printed, e.g. "03/2021".
    pub next_due: Option<String>,
    pub registration_no: Option<String>,
    pub revival: Option<String>,
    /// Year hint from the file name.
    pub period_year: Option<i32>,
    /// Month hint from the file name.
    pub period_month: Option<String>,
}

/// Record payload, one variant per document class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordBody {
    Trade(TradeRecord),
    Settlement(SettlementRecord),
    Benefit(BenefitRecord),
    Passbook(PassbookRecord),
    Premium(PremiumRecord),
}

/// Record class, used to group output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Trade,
    Settlement,
    Benefit,
    Passbook,
    Premium,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::Settlement => "settlement",
            Self::Benefit => "benefit",
            Self::Passbook => "passbook",
            Self::Premium => "premium",
        }
    }
}

impl RecordBody {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Trade(_) => RecordKind::Trade,
            Self::Settlement(_) => RecordKind::Settlement,
            Self::Benefit(_) => RecordKind::Benefit,
            Self::Passbook(_) => RecordKind::Passbook,
            Self::Premium(_) => RecordKind::Premium,
        }
    }

    /// Check the fields that identify a record of this class.
    pub fn check_mandatory(&self) -> Result<(), ExtractionError> {
        let missing = |name: &str| -> Result<(), ExtractionError> {
            Err(ExtractionError::MissingField(name.to_string()))
        };

        match self {
            Self::Trade(t) => {
                if t.isin.is_none() && t.security.is_none() {
                    return missing("isin");
                }
                if t.side.is_none() {
                    return missing("side");
                }
            }
            Self::Settlement(s) => {
                if s.settlement_no.is_none() {
                    return missing("settlement_no");
                }
            }
            Self::Benefit(b) => {
                if b.isin.is_none() {
                    return missing("isin");
                }
                if b.record_date.is_none() {
                    return missing("record_date");
                }
            }
            Self::Passbook(p) => {
                if p.date.is_none() {
                    return missing("date");
                }
            }
            Self::Premium(p) => {
                if p.policy_no.is_none() {
                    return missing("policy_no");
                }
                if p.paid_on.is_none() {
                    return missing("paid_on");
                }
            }
        }

        Ok(())
    }

    /// The date a record is ordered by downstream.
    pub fn primary_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Trade(t) => t.trade_date.or(t.order_date).or(t.settlement_date),
            Self::Settlement(s) => s.settlement_date.or(s.contract_date),
            Self::Benefit(b) => b.record_date,
            Self::Passbook(p) => p.date,
            Self::Premium(p) => p.paid_on,
        }
    }
}

/// A record with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Source document and page.
    pub provenance: Provenance,

    /// Identifier of the statement format that produced the record.
    pub format: String,

    #[serde(flatten)]
    pub body: RecordBody,
}

impl TransactionRecord {
    pub fn kind(&self) -> RecordKind {
        self.body.kind()
    }

    pub fn primary_date(&self) -> Option<NaiveDate> {
        self.body.primary_date()
    }
}

/// Result of extracting one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParseOutcome {
    /// Every candidate record was assembled.
    Success { records: Vec<TransactionRecord> },
    /// Some records were produced but part of the document was lost.
    PartialFailure {
        reason: String,
        records: Vec<TransactionRecord>,
    },
    /// Nothing extractable.
    Empty,
}

impl ParseOutcome {
    /// Classify a record set given the number of dropped candidates.
    pub fn from_records(records: Vec<TransactionRecord>, dropped: usize) -> Self {
        match (records.is_empty(), dropped) {
            (true, _) => Self::Empty,
            (false, 0) => Self::Success { records },
            (false, n) => Self::PartialFailure {
                reason: format!("{} candidate record(s) dropped for missing mandatory fields", n),
                records,
            },
        }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        match self {
            Self::Success { records } | Self::PartialFailure { records, .. } => records,
            Self::Empty => &[],
        }
    }

    pub fn into_records(self) -> Vec<TransactionRecord> {
        match self {
            Self::Success { records } | Self::PartialFailure { records, .. } => records,
            Self::Empty => Vec::new(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Short status label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::PartialFailure { .. } => "partial",
            Self::Empty => "empty",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn trade() -> TradeRecord {
        TradeRecord {
            security: Some("RELIANCE IND".to_string()),
            side: Some(Side::Buy),
            quantity: Some(Decimal::from(10)),
            ..Default::default()
        }
    }

    #[test]
    fn test_side_tokens() {
        assert_eq!(Side::from_token("B"), Some(Side::Buy));
        assert_eq!(Side::from_token("SELL"), Some(Side::Sell));
        assert_eq!(Side::from_token(" buy "), Some(Side::Buy));
        assert_eq!(Side::from_token("X"), None);
    }

    #[test]
    fn test_trade_mandatory_fields() {
        assert!(RecordBody::Trade(trade()).check_mandatory().is_ok());

        let mut no_side = trade();
        no_side.side = None;
        let err = RecordBody::Trade(no_side).check_mandatory().unwrap_err();
        assert!(matches!(err, ExtractionError::MissingField(f) if f == "side"));

        let mut no_instrument = trade();
        no_instrument.security = None;
        assert!(RecordBody::Trade(no_instrument).check_mandatory().is_err());
    }

    #[test]
    fn test_premium_requires_date() {
        let premium = PremiumRecord {
            policy_no: Some("123456789".to_string()),
            ..Default::default()
        };
        assert!(RecordBody::Premium(premium).check_mandatory().is_err());
    }

    #[test]
    fn test_outcome_classification() {
        let record = TransactionRecord {
            provenance: Provenance::new("a.pdf", 1),
            format: "geojit".to_string(),
            body: RecordBody::Trade(trade()),
        };

        assert!(ParseOutcome::from_records(vec![], 3).is_empty());
        assert_eq!(ParseOutcome::from_records(vec![record.clone()], 0).label(), "success");
        let partial = ParseOutcome::from_records(vec![record], 2);
        assert_eq!(partial.label(), "partial");
        assert_eq!(partial.record_count(), 1);
    }

    #[test]
    fn test_record_serializes_kind_inline() {
        let record = TransactionRecord {
            provenance: Provenance::new("a.pdf", 2),
            format: "geojit".to_string(),
            body: RecordBody::Trade(TradeRecord {
                net_amount: Some(Decimal::from_str("-2495.00").unwrap()),
                ..trade()
            }),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "trade");
        assert_eq!(json["side"], "buy");
        assert_eq!(json["provenance"]["page"], 2);
        assert!(json.get("isin").is_none());
    }
}
