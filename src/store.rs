//! Deduplicating insert of canonical rows.

use std::collections::{HashMap, HashSet};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::hashing::tx_hash;
use crate::ingest::require_fields;
use crate::models::{Account, CanonicalRow, Field, Transaction};

/// Institution recorded on accounts created without an explicit one.
pub const DEFAULT_INSTITUTION: &str = "SEB";

fn required<T>(value: Option<T>, field: Field) -> Result<T> {
    value.ok_or_else(|| IngestError::Schema {
        missing: vec![field.name().to_string()],
    })
}

/// Every `tx_hash` already stored, in one query.
pub fn existing_hashes(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT tx_hash FROM transactions")?;
    let hashes = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(hashes)
}

pub fn find_account(conn: &Connection, name: &str) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            "SELECT id, name, currency, institution FROM accounts WHERE name = ?1",
            [name],
            |row| {
                Ok(Account {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    currency: row.get(2)?,
                    institution: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(account)
}

/// Return the account called `name`, creating it with `currency` and
/// `institution` when it does not exist yet.
pub fn get_or_create_account(
    conn: &Connection,
    name: &str,
    currency: &str,
    institution: &str,
) -> Result<Account> {
    if let Some(account) = find_account(conn, name)? {
        return Ok(account);
    }
    conn.execute(
        "INSERT INTO accounts (name, currency, institution) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, currency, institution],
    )?;
    info!(account = name, currency, institution, "created account");
    Ok(Account {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        currency: currency.to_string(),
        institution: institution.to_string(),
    })
}

/// Insert `rows`, skipping any whose hash is already stored or already seen
/// earlier in the batch. Returns how many were inserted.
///
/// The caller owns the transaction on `conn`; nothing here commits or rolls
/// back.
pub fn add_transactions(conn: &Connection, rows: &[CanonicalRow]) -> Result<usize> {
    add_transactions_for(conn, rows, DEFAULT_INSTITUTION)
}

/// [`add_transactions`] with the institution used for newly created accounts.
pub fn add_transactions_for(
    conn: &Connection,
    rows: &[CanonicalRow],
    institution: &str,
) -> Result<usize> {
    require_fields(rows)?;

    // Statements on `conn` run immediately, so earlier writes in the same
    // transaction are already visible to this read.
    let mut seen = existing_hashes(conn)?;

    // Every date coerces and every hash is computed before the first write.
    let mut fresh = Vec::new();
    for row in rows {
        let account_id = required(row.account_id.as_deref(), Field::AccountId)?;
        let date = required(row.date.as_ref(), Field::Date)?.to_date()?;
        let payee = required(row.payee.as_deref(), Field::Payee)?;
        let amount = required(row.amount, Field::Amount)?;
        if !amount.is_finite() {
            return Err(IngestError::InvalidAmount {
                value: amount.to_string(),
            });
        }
        let currency = required(row.currency.as_deref(), Field::Currency)?;

        let hash = tx_hash(account_id, date, payee, amount, currency);
        if !seen.insert(hash.clone()) {
            continue;
        }
        fresh.push((row, account_id, date, payee, amount, currency, hash));
    }

    let mut accounts: HashMap<String, Account> = HashMap::new();
    let mut staged: Vec<Transaction> = Vec::with_capacity(fresh.len());
    for (row, account_id, date, payee, amount, currency, hash) in fresh {
        let account = match accounts.get(account_id) {
            Some(a) => a.clone(),
            None => {
                let a = get_or_create_account(conn, account_id, currency, institution)?;
                accounts.insert(account_id.to_string(), a.clone());
                a
            }
        };

        staged.push(Transaction {
            id: None,
            account_id: account.id,
            date,
            payee: payee.to_string(),
            amount,
            currency: currency.to_string(),
            tx_hash: hash,
            raw: row.to_raw(),
        });
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO transactions (account_id, date, payee, amount, currency, tx_hash, raw) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for tx in &staged {
        stmt.execute(rusqlite::params![
            tx.account_id,
            tx.date.format("%Y-%m-%d").to_string(),
            tx.payee,
            tx.amount,
            tx.currency,
            tx.tx_hash,
            serde_json::to_string(&tx.raw)?,
        ])?;
    }

    debug!(
        inserted = staged.len(),
        skipped = rows.len() - staged.len(),
        "added transactions"
    );
    Ok(staged.len())
}

pub fn transaction_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?)
}

/// Accounts by name, each with its transaction count.
pub fn list_accounts(conn: &Connection) -> Result<Vec<(Account, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.name, a.currency, a.institution, count(t.id) \
         FROM accounts a LEFT JOIN transactions t ON t.account_id = a.id \
         GROUP BY a.id ORDER BY a.name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                Account {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    currency: row.get(2)?,
                    institution: row.get(3)?,
                },
                row.get(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
