use std::path::Path;

use tracing::debug;

use super::csv_text::{canonical_rows, file_stem, Columns, RowRules, Table};
use super::BankIngestor;
use crate::error::Result;
use crate::models::CanonicalRow;

// Header labels vary with the export language; both Swedish and English.
const DATE_COLS: &[&str] = &["Bokföringsdatum", "Datum", "Date"];
const AMOUNT_COLS: &[&str] = &["Belopp", "Amount"];
const DESC_COLS: &[&str] = &["Text", "Meddelande", "Specifikation", "Description"];

const BANK_CODE: &str = "SEB";
const HOME_CURRENCY: &str = "SEK";

/// SEB (Skandinaviska Enskilda Banken) CSV exports.
#[derive(Debug, Default, Clone, Copy)]
pub struct SebIngestor;

impl BankIngestor for SebIngestor {
    fn name(&self) -> &str {
        "SEB"
    }

    fn institution(&self) -> &str {
        BANK_CODE
    }

    // Rejects any sample mentioning "SEB", so a genuine export whose header
    // carries the bank name is missed.
    fn sniff(&self, sample: &str) -> bool {
        DATE_COLS.iter().any(|c| sample.contains(c)) && !sample.contains(BANK_CODE)
    }

    fn parse(&self, path: &Path) -> Result<Vec<CanonicalRow>> {
        let table = Table::read(path)?;
        let cols = Columns {
            date: table.find(DATE_COLS).or_else(|| table.find(&["date"])),
            payee: table.find(DESC_COLS).or_else(|| table.find(&["payee"])),
            amount: table.find(AMOUNT_COLS).or_else(|| table.find(&["amount"])),
            account: table.find_by(|h| h.to_lowercase().starts_with("konto")),
            currency: table.find(&["currency"]),
        };
        debug!(?cols, headers = ?table.headers, "SEB column layout");
        let rules = RowRules {
            date_format: "%Y-%m-%d",
            decimal_comma: true,
            default_currency: HOME_CURRENCY,
            fallback_account: file_stem(path),
        };
        canonical_rows(&table, &cols, &rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use crate::ingest::ingest;
    use crate::models::DateValue;
    use chrono::NaiveDate;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn date(s: &str) -> Option<DateValue> {
        Some(DateValue::Date(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()))
    }

    #[test]
    fn test_sniff() {
        let seb = SebIngestor;
        assert!(seb.sniff("Bokföringsdatum;Valutadatum;Verifikationsnummer;Text;Belopp;Saldo"));
        assert!(seb.sniff("Date,Description,Amount"));
        assert!(!seb.sniff("SEB export\nBokföringsdatum;Text;Belopp"));
        assert!(!seb.sniff("Buchungstag;Verwendungszweck;Betrag"));
    }

    #[test]
    fn test_parse_semicolon_export_with_account_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "export.csv",
            "Bokföringsdatum;Valutadatum;Text;Belopp;Saldo;Kontonummer\n\
             2024-01-02;2024-01-02;ICA Nära ;-1 234,56;10 000,00;5357 12 345 67\n\
             2024-01-03;2024-01-03;Lön;25 000,00;35 000,00;5357 12 345 67\n",
        );
        let rows = ingest(&SebIngestor, &path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date("2024-01-02"));
        assert_eq!(rows[0].payee.as_deref(), Some("ICA Nära"));
        assert_eq!(rows[0].amount, Some(-1234.56));
        assert_eq!(rows[0].currency.as_deref(), Some("SEK"));
        assert_eq!(rows[0].account_id.as_deref(), Some("53571234567"));
        assert_eq!(rows[1].amount, Some(25000.0));
    }

    #[test]
    fn test_parse_comma_export_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "5357-1234567.csv",
            "Date,Description,Amount\n2024-02-01,Spotify,\"-109,00\"\n",
        );
        let rows = ingest(&SebIngestor, &path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].account_id.as_deref(), Some("5357-1234567"));
        assert_eq!(rows[0].amount, Some(-109.0));
    }

    #[test]
    fn test_parse_keeps_existing_currency_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "eur.csv",
            "Datum;Text;Belopp;currency\n2024-03-01;Hotel;-120,50;EUR\n",
        );
        let rows = ingest(&SebIngestor, &path).unwrap();
        assert_eq!(rows[0].currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_currency_column_must_match_canonical_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "eur.csv",
            "Datum;Text;Belopp;Currency\n2024-03-01;Hotel;-120,50;EUR\n",
        );
        let rows = ingest(&SebIngestor, &path).unwrap();
        assert_eq!(rows[0].currency.as_deref(), Some("SEK"));
    }

    #[test]
    fn test_blank_payee_becomes_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.csv", "Datum;Text;Belopp\n2024-03-01;;5,00\n");
        let rows = ingest(&SebIngestor, &path).unwrap();
        assert_eq!(rows[0].payee.as_deref(), Some(""));
    }

    #[test]
    fn test_bad_date_is_lenient_until_the_gate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.csv", "Datum;Text;Belopp\n01/03/2024;Shop;5,00\n");
        let parsed = SebIngestor.parse(&path).unwrap();
        assert_eq!(parsed[0].date, None);
        let err = ingest(&SebIngestor, &path).unwrap_err();
        assert!(matches!(err, IngestError::Schema { ref missing } if missing == &["date"]));
    }

    #[test]
    fn test_bad_amount_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.csv", "Datum;Text;Belopp\n2024-03-01;Shop;abc\n");
        let err = SebIngestor.parse(&path).unwrap_err();
        assert!(matches!(err, IngestError::InvalidAmount { .. }));
    }

    #[test]
    fn test_missing_amount_column_fails_gate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.csv", "Datum;Text\n2024-03-01;Shop\n");
        let err = ingest(&SebIngestor, &path).unwrap_err();
        assert!(matches!(err, IngestError::Schema { ref missing } if missing == &["amount"]));
    }
}
