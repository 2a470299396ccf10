use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::error::{IngestError, Result};

/// The five fields every parsed transaction must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Date,
    Payee,
    Amount,
    Currency,
    AccountId,
}

impl Field {
    /// Canonical column order.
    pub const ALL: [Field; 5] = [
        Field::Date,
        Field::Payee,
        Field::Amount,
        Field::Currency,
        Field::AccountId,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Payee => "payee",
            Self::Amount => "amount",
            Self::Currency => "currency",
            Self::AccountId => "account_id",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A date as it arrives from a parser or a caller. All variants coerce to a
/// plain calendar date before hashing.
#[derive(Debug, Clone, PartialEq)]
pub enum DateValue {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<FixedOffset>),
    Text(String),
}

impl DateValue {
    /// Coerce to a calendar date. Timestamps keep their own offset's date.
    pub fn to_date(&self) -> Result<NaiveDate> {
        match self {
            Self::Date(d) => Ok(*d),
            Self::DateTime(dt) => Ok(dt.date()),
            Self::Timestamp(ts) => Ok(ts.date_naive()),
            Self::Text(s) => parse_iso_date(s).ok_or_else(|| IngestError::InvalidDate {
                value: s.clone(),
            }),
        }
    }

    /// ISO-8601 text form used in the stored raw record.
    pub fn to_iso(&self) -> String {
        match self {
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Self::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<NaiveDate> for DateValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveDateTime> for DateValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl From<DateTime<FixedOffset>> for DateValue {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<&str> for DateValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for DateValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Accepts `YYYY-MM-DD` and ISO date-times with an optional offset.
fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.date_naive());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
    ] {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Some(ts.date_naive());
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// One parsed transaction prior to persistence.
///
/// Fields are optional so a parser can report what it could not find; the
/// validation gate in [`crate::ingest`] rejects any row with a gap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalRow {
    pub date: Option<DateValue>,
    pub payee: Option<String>,
    /// Negative = debit/outflow.
    pub amount: Option<f64>,
    /// ISO-4217 code.
    pub currency: Option<String>,
    pub account_id: Option<String>,
}

impl CanonicalRow {
    pub fn new(
        date: impl Into<DateValue>,
        payee: &str,
        amount: f64,
        currency: &str,
        account_id: &str,
    ) -> Self {
        Self {
            date: Some(date.into()),
            payee: Some(payee.to_string()),
            amount: Some(amount),
            currency: Some(currency.to_string()),
            account_id: Some(account_id.to_string()),
        }
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| match f {
                Field::Date => self.date.is_none(),
                Field::Payee => self.payee.is_none(),
                Field::Amount => self.amount.is_none(),
                Field::Currency => self.currency.is_none(),
                Field::AccountId => self.account_id.is_none(),
            })
            .collect()
    }

    /// JSON-safe copy of the row: dates become ISO-8601 strings.
    pub fn to_raw(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "date".into(),
            self.date
                .as_ref()
                .map_or(Value::Null, |d| Value::String(d.to_iso())),
        );
        map.insert(
            "payee".into(),
            self.payee.clone().map_or(Value::Null, Value::String),
        );
        map.insert(
            "amount".into(),
            self.amount.map_or(Value::Null, Value::from),
        );
        map.insert(
            "currency".into(),
            self.currency.clone().map_or(Value::Null, Value::String),
        );
        map.insert(
            "account_id".into(),
            self.account_id.clone().map_or(Value::Null, Value::String),
        );
        Value::Object(map)
    }
}

/// Owning entity for a group of transactions; `name` is the external
/// account identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub currency: String,
    pub institution: String,
}

/// One persisted, deduplicated transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: Option<i64>,
    pub account_id: i64,
    pub date: NaiveDate,
    pub payee: String,
    pub amount: f64,
    pub currency: String,
    pub tx_hash: String,
    pub raw: Value,
}
