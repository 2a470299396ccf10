use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::csv_text::{canonical_rows, file_stem, Columns, RowRules, Table};
use super::BankIngestor;
use crate::error::Result;
use crate::models::CanonicalRow;

/// Declarative ingestor definition, as written in settings.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedIngestorConfig {
    pub name: String,
    pub institution: String,
    /// Regex matched against the sample.
    pub detect: String,
    /// Literal that, when present in the sample, vetoes detection.
    #[serde(default)]
    pub exclude: Option<String>,
    pub date_columns: Vec<String>,
    pub amount_columns: Vec<String>,
    pub payee_columns: Vec<String>,
    #[serde(default)]
    pub account_column: Option<String>,
    #[serde(default)]
    pub currency_column: Option<String>,
    pub default_currency: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub decimal_comma: bool,
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

/// An ingestor whose layout comes entirely from a [`MappedIngestorConfig`].
#[derive(Debug, Clone)]
pub struct MappedIngestor {
    config: MappedIngestorConfig,
    detect: Regex,
}

impl MappedIngestor {
    pub fn new(config: MappedIngestorConfig) -> Result<Self> {
        let detect = Regex::new(&config.detect)?;
        Ok(Self { config, detect })
    }
}

fn find_any(table: &Table, names: &[String]) -> Option<usize> {
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    table.find(&names)
}

impl BankIngestor for MappedIngestor {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn institution(&self) -> &str {
        &self.config.institution
    }

    fn sniff(&self, sample: &str) -> bool {
        if let Some(exclude) = &self.config.exclude {
            if sample.contains(exclude.as_str()) {
                return false;
            }
        }
        self.detect.is_match(sample)
    }

    fn parse(&self, path: &Path) -> Result<Vec<CanonicalRow>> {
        let table = Table::read(path)?;
        let cfg = &self.config;
        let cols = Columns {
            date: find_any(&table, &cfg.date_columns),
            payee: find_any(&table, &cfg.payee_columns),
            amount: find_any(&table, &cfg.amount_columns),
            account: cfg
                .account_column
                .as_deref()
                .and_then(|c| table.find(&[c])),
            currency: cfg
                .currency_column
                .as_deref()
                .and_then(|c| table.find(&[c])),
        };
        let rules = RowRules {
            date_format: &cfg.date_format,
            decimal_comma: cfg.decimal_comma,
            default_currency: &cfg.default_currency,
            fallback_account: file_stem(path),
        };
        canonical_rows(&table, &cols, &rules)
    }
}
