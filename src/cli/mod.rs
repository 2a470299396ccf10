pub mod accounts;
pub mod import;
pub mod ingest;
pub mod init;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::ingest::{IngestorRegistry, PluginCatalog};
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(name = "budget", about = "Ingest bank-statement files into canonical rows and a deduplicated ledger.")]
pub struct Cli {
    /// Database file (default: from settings or BUDGET_DATABASE_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a statement file and write canonical CSV to stdout.
    Ingest {
        /// Path to the statement export
        file: PathBuf,
    },
    /// Parse a statement file and store new transactions.
    Import {
        /// Path to the statement export
        file: PathBuf,
    },
    /// Create the database and its tables.
    Init,
    /// List accounts with their transaction counts.
    Accounts,
}

/// The ingestor registry and database path resolved from settings.
pub struct Context {
    pub registry: IngestorRegistry,
    pub db_path: PathBuf,
}

impl Context {
    pub fn new(settings: Settings, catalog: &PluginCatalog, db: Option<PathBuf>) -> Result<Self> {
        let registry = IngestorRegistry::from_settings(&settings, catalog)?;
        let db_path = db.unwrap_or_else(|| PathBuf::from(&settings.database_path));
        Ok(Self { registry, db_path })
    }
}

/// Dispatch a parsed command line. Binaries that contribute their own
/// ingestors pass them in through `catalog`.
pub fn run(cli: Cli, catalog: &PluginCatalog) -> Result<()> {
    let ctx = Context::new(load_settings(), catalog, cli.db)?;
    match cli.command {
        Commands::Ingest { file } => ingest::run(&ctx, &file),
        Commands::Import { file } => import::run(&ctx, &file),
        Commands::Init => init::run(&ctx),
        Commands::Accounts => accounts::list(&ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_flag_overrides_settings_path() {
        let settings = Settings {
            database_path: "/tmp/from-settings.db".to_string(),
            ..Settings::default()
        };
        let ctx = Context::new(settings.clone(), &PluginCatalog::new(), None).unwrap();
        assert_eq!(ctx.db_path, PathBuf::from("/tmp/from-settings.db"));

        let flag = PathBuf::from("/tmp/from-flag.db");
        let ctx = Context::new(settings, &PluginCatalog::new(), Some(flag.clone())).unwrap();
        assert_eq!(ctx.db_path, flag);
    }
}
