//! Bank-statement ingestors: format detection plus parsing into canonical
//! rows.

pub mod csv_text;
pub mod mapped;
pub mod registry;
pub mod seb;

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use crate::error::{IngestError, Result};
use crate::models::{CanonicalRow, Field};

pub use mapped::{MappedIngestor, MappedIngestorConfig};
pub use registry::{get_matching_ingestor, IngestorRegistry, PluginCatalog};
pub use seb::SebIngestor;

/// One institution's statement export format.
pub trait BankIngestor {
    /// Human-readable name, e.g. for logs.
    fn name(&self) -> &str;

    /// Short institution code recorded on accounts created from this
    /// ingestor's rows.
    fn institution(&self) -> &str;

    /// Return true when `sample` (the first few lines of a file) looks like
    /// this format. Must not touch the filesystem.
    fn sniff(&self, sample: &str) -> bool;

    /// Parse `path` into canonical rows. Callers go through [`ingest`].
    fn parse(&self, path: &Path) -> Result<Vec<CanonicalRow>>;
}

/// Parse `path` with `ingestor` and pass the result through the validation
/// gate. This is the only entry point callers should use.
pub fn ingest(ingestor: &dyn BankIngestor, path: &Path) -> Result<Vec<CanonicalRow>> {
    let rows = ingestor.parse(path)?;
    require_fields(&rows)?;
    debug!(ingestor = ingestor.name(), rows = rows.len(), "parsed statement");
    Ok(rows)
}

/// Canonical fields that at least one row lacks, in canonical order.
pub fn missing_fields(rows: &[CanonicalRow]) -> BTreeSet<Field> {
    rows.iter().flat_map(|r| r.missing_fields()).collect()
}

/// Fail with a schema error naming every canonical field some row lacks.
pub fn require_fields(rows: &[CanonicalRow]) -> Result<()> {
    let missing = missing_fields(rows);
    if missing.is_empty() {
        return Ok(());
    }
    Err(IngestError::Schema {
        missing: missing.iter().map(|f| f.name().to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct FixedIngestor(Vec<CanonicalRow>);

    impl BankIngestor for FixedIngestor {
        fn name(&self) -> &str {
            "fixed"
        }
        fn institution(&self) -> &str {
            "TEST"
        }
        fn sniff(&self, _sample: &str) -> bool {
            true
        }
        fn parse(&self, _path: &Path) -> Result<Vec<CanonicalRow>> {
            Ok(self.0.clone())
        }
    }

    fn full_row() -> CanonicalRow {
        CanonicalRow::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            "Coffee",
            -35.0,
            "SEK",
            "1234",
        )
    }

    #[test]
    fn test_ingest_passes_complete_rows() {
        let ing = FixedIngestor(vec![full_row(), full_row()]);
        let rows = ingest(&ing, Path::new("unused.csv")).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_ingest_rejects_rows_with_gaps() {
        let mut bad = full_row();
        bad.date = None;
        let mut worse = full_row();
        worse.currency = None;
        let ing = FixedIngestor(vec![full_row(), bad, worse]);
        match ingest(&ing, Path::new("unused.csv")) {
            Err(IngestError::Schema { missing }) => {
                assert_eq!(missing, vec!["date".to_string(), "currency".to_string()]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_require_fields_accepts_empty_batch() {
        assert!(require_fields(&[]).is_ok());
    }
}
