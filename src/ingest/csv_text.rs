use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::{IngestError, Result};
use crate::models::{CanonicalRow, DateValue};

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Pick the delimiter that splits the header line into the most fields.
/// Delimiters inside double quotes do not count. Ties go to the earlier
/// candidate; no hit at all means comma.
pub fn sniff_delimiter(header_line: &str) -> u8 {
    let mut counts = [0usize; DELIMITERS.len()];
    let mut in_quotes = false;
    for b in header_line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = DELIMITERS.iter().position(|d| *d == b) {
            counts[i] += 1;
        }
    }
    let mut best = 0;
    for i in 1..DELIMITERS.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    DELIMITERS[best]
}

/// A delimited file loaded as raw text: trimmed headers plus every record.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub records: Vec<StringRecord>,
}

impl Table {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        Self::from_text(text)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        let header_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        let delimiter = sniff_delimiter(header_line);
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            records.push(record);
        }
        Ok(Self { headers, records })
    }

    /// Index of the first header that equals any of `names`.
    pub fn find(&self, names: &[&str]) -> Option<usize> {
        self.headers.iter().position(|h| names.contains(&h.as_str()))
    }

    /// Index of the first header matching `pred`.
    pub fn find_by(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.headers.iter().position(|h| pred(h))
    }
}

/// Strip space thousands separators (including no-break spaces), optionally
/// turn a decimal comma into a period, then parse. Blank input is missing;
/// anything else that fails to parse, or parses to NaN or infinity, is an
/// error.
pub fn normalize_amount(raw: &str, decimal_comma: bool) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let mut s: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    if decimal_comma {
        s = s.replace(',', ".");
    } else {
        s = s.replace(',', "");
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(IngestError::InvalidAmount {
            value: raw.to_string(),
        }),
    }
}

/// Lenient date parse: anything that does not match `format` is missing.
pub fn parse_date_lenient(raw: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format).ok()
}

/// Where each canonical value lives in a [`Table`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Columns {
    pub date: Option<usize>,
    pub payee: Option<usize>,
    pub amount: Option<usize>,
    pub account: Option<usize>,
    pub currency: Option<usize>,
}

/// Per-institution normalization settings.
#[derive(Debug, Clone)]
pub struct RowRules<'a> {
    pub date_format: &'a str,
    pub decimal_comma: bool,
    /// Used only when the table has no currency column.
    pub default_currency: &'a str,
    /// Used only when the table has no account column.
    pub fallback_account: String,
}

/// Build canonical rows from a table. A missing column leaves the field
/// unset in every row so the validation gate can name it.
pub fn canonical_rows(table: &Table, cols: &Columns, rules: &RowRules) -> Result<Vec<CanonicalRow>> {
    let mut rows = Vec::with_capacity(table.records.len());
    for record in &table.records {
        let cell = |idx: Option<usize>| idx.map(|i| record.get(i).unwrap_or(""));

        let date = cell(cols.date)
            .and_then(|v| parse_date_lenient(v, rules.date_format))
            .map(DateValue::Date);

        let payee = cell(cols.payee).map(|v| v.trim().to_string());

        let amount = match cell(cols.amount) {
            Some(v) => normalize_amount(v, rules.decimal_comma)?,
            None => None,
        };

        let account_id = match cols.account {
            Some(_) => cell(cols.account)
                .map(|v| v.chars().filter(|c| !c.is_whitespace()).collect::<String>())
                .filter(|v| !v.is_empty()),
            None => Some(rules.fallback_account.clone()),
        };

        let currency = match cols.currency {
            Some(_) => cell(cols.currency)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            None => Some(rules.default_currency.to_string()),
        };

        rows.push(CanonicalRow {
            date,
            payee,
            amount,
            currency,
            account_id,
        });
    }
    Ok(rows)
}

/// File name without its extension, used as the account of single-account
/// exports.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("Datum;Text;Belopp"), b';');
        assert_eq!(sniff_delimiter("Date,Description,Amount"), b',');
        assert_eq!(sniff_delimiter("Date\tText\tAmount"), b'\t');
        assert_eq!(sniff_delimiter("\"Text, long\";Belopp;Saldo"), b';');
        assert_eq!(sniff_delimiter("Date"), b',');
    }

    #[test]
    fn test_normalize_amount_swedish_format() {
        assert_eq!(normalize_amount("1 234,56", true).unwrap(), Some(1234.56));
        assert_eq!(normalize_amount("-45,00", true).unwrap(), Some(-45.0));
        assert_eq!(normalize_amount("12\u{a0}000,5", true).unwrap(), Some(12000.5));
        assert_eq!(normalize_amount("  ", true).unwrap(), None);
    }

    #[test]
    fn test_normalize_amount_period_format() {
        assert_eq!(normalize_amount("1,234.56", false).unwrap(), Some(1234.56));
        assert_eq!(normalize_amount("-9.99", false).unwrap(), Some(-9.99));
    }

    #[test]
    fn test_normalize_amount_is_strict() {
        let err = normalize_amount("12 kr", true).unwrap_err();
        assert!(matches!(err, IngestError::InvalidAmount { .. }));
    }

    #[test]
    fn test_normalize_amount_rejects_non_finite() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity"] {
            let err = normalize_amount(raw, true).unwrap_err();
            assert!(matches!(err, IngestError::InvalidAmount { ref value } if value == raw));
        }
    }

    #[test]
    fn test_parse_date_lenient() {
        assert_eq!(
            parse_date_lenient("2024-01-31", "%Y-%m-%d"),
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
        assert_eq!(parse_date_lenient("2024-02-30", "%Y-%m-%d"), None);
        assert_eq!(parse_date_lenient("31/01/2024", "%Y-%m-%d"), None);
        assert_eq!(parse_date_lenient("", "%Y-%m-%d"), None);
    }

    #[test]
    fn test_table_skips_blank_rows_and_trims_headers() {
        let table = Table::from_text(" Datum ; Belopp\n2024-01-01;1\n;\n2024-01-02;2\n").unwrap();
        assert_eq!(table.headers, vec!["Datum", "Belopp"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.find(&["Belopp"]), Some(1));
        assert_eq!(table.find(&["Amount"]), None);
    }

    #[test]
    fn test_canonical_rows_missing_column_leaves_field_unset() {
        let table = Table::from_text("Datum,Belopp\n2024-01-01,10\n").unwrap();
        let cols = Columns {
            date: Some(0),
            amount: Some(1),
            ..Default::default()
        };
        let rules = RowRules {
            date_format: "%Y-%m-%d",
            decimal_comma: true,
            default_currency: "SEK",
            fallback_account: "acct".into(),
        };
        let rows = canonical_rows(&table, &cols, &rules).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].payee, None);
        assert_eq!(rows[0].currency.as_deref(), Some("SEK"));
        assert_eq!(rows[0].account_id.as_deref(), Some("acct"));
    }
}
