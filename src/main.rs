use std::sync::Once;

use anyhow::Context as _;
use clap::Parser;

use budget_ingest::cli::{self, Cli};
use budget_ingest::PluginCatalog;

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("budget_ingest=warn"));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

fn run(args: Cli) -> anyhow::Result<()> {
    let command = match &args.command {
        cli::Commands::Ingest { file } => format!("ingest {}", file.display()),
        cli::Commands::Import { file } => format!("import {}", file.display()),
        cli::Commands::Init => "init".to_string(),
        cli::Commands::Accounts => "accounts".to_string(),
    };
    cli::run(args, &PluginCatalog::new()).with_context(|| format!("`{command}` failed"))
}

fn main() {
    init_tracing();
    let args = Cli::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
