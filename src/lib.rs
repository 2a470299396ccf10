//! Bank-statement ingestion: detect an export's format, normalize it into
//! canonical rows, and store them with hash-based deduplication.

pub mod cli;
pub mod db;
pub mod error;
pub mod hashing;
pub mod ingest;
pub mod models;
pub mod settings;
pub mod store;

pub use error::{IngestError, Result};
pub use ingest::{ingest, BankIngestor, IngestorRegistry, PluginCatalog};
pub use models::{Account, CanonicalRow, DateValue, Field, Transaction};
pub use store::add_transactions;
