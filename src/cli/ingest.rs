use std::io::Write;
use std::path::Path;

use crate::error::{IngestError, Result};
use crate::hashing::float_text;
use crate::ingest::ingest;
use crate::models::{CanonicalRow, Field};

use super::Context;

pub fn run(ctx: &Context, file: &Path) -> Result<()> {
    let ingestor = ctx
        .registry
        .find_for_file(file)?
        .ok_or_else(|| IngestError::NoIngestor(file.display().to_string()))?;
    let rows = ingest(ingestor, file)?;
    let stdout = std::io::stdout();
    write_canonical_csv(&rows, stdout.lock())
}

/// Canonical rows as CSV with a header, in canonical column order.
pub fn write_canonical_csv<W: Write>(rows: &[CanonicalRow], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(Field::ALL.iter().map(|f| f.name()))?;
    for row in rows {
        wtr.write_record([
            row.date.as_ref().map(|d| d.to_iso()).unwrap_or_default(),
            row.payee.clone().unwrap_or_default(),
            row.amount.map(float_text).unwrap_or_default(),
            row.currency.clone().unwrap_or_default(),
            row.account_id.clone().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
