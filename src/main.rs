mod cli;
mod mcp;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries JSON output and the MCP transport
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memory_bank=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let docs_dir = cli.docs_dir.as_deref();
    let index = cli.index.as_deref();

    match &cli.command {
        Commands::Analyze { path } => {
            let config = cli::load_config(path, docs_dir, index)?;
            cli::analyze(path, &config)?;
        }
        Commands::Validate { path } => {
            let config = cli::load_config(path, docs_dir, index)?;
            cli::validate(path, &config)?;
        }
        Commands::Sync { path } => {
            let config = cli::load_config(path, docs_dir, index)?;
            cli::sync(path, &config)?;
        }
        Commands::Resolve { path, yes } => {
            let config = cli::load_config(path, docs_dir, index)?;
            cli::resolve(path, &config, *yes)?;
        }
        Commands::Serve => {
            cli::run_mcp_server().await?;
        }
    }

    Ok(())
}
