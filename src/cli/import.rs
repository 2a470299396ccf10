use std::path::Path;

use crate::db::{get_connection, init_db, session_scope};
use crate::error::{IngestError, Result};
use crate::ingest::ingest;
use crate::store::add_transactions_for;

use super::Context;

pub struct ImportResult {
    pub parsed: usize,
    pub inserted: usize,
}

impl ImportResult {
    pub fn skipped(&self) -> usize {
        self.parsed - self.inserted
    }
}

pub fn import_file(ctx: &Context, file: &Path) -> Result<ImportResult> {
    let ingestor = ctx
        .registry
        .find_for_file(file)?
        .ok_or_else(|| IngestError::NoIngestor(file.display().to_string()))?;
    let rows = ingest(ingestor, file)?;

    let mut conn = get_connection(&ctx.db_path)?;
    init_db(&conn)?;
    let inserted = session_scope(&mut conn, |tx| {
        add_transactions_for(tx, &rows, ingestor.institution())
    })?;

    Ok(ImportResult {
        parsed: rows.len(),
        inserted,
    })
}

pub fn run(ctx: &Context, file: &Path) -> Result<()> {
    let result = import_file(ctx, file)?;
    println!("{} inserted, {} skipped (duplicates)", result.inserted, result.skipped());
    Ok(())
}
