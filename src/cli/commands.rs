use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use memory_bank::analysis::ProjectAnalyzer;
use memory_bank::config::BankConfig;
use memory_bank::error::{MemoryBankError, Result};
use memory_bank::memory::{
    ConflictPlanner, InteractiveResolver, MemoryBankValidator, ResolutionSession, ResolverState,
    StdFs, SyncReconciler,
};

#[derive(Parser)]
#[command(name = "memory-bank")]
#[command(about = "Source analysis and memory bank synchronization using tree-sitter")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Analyze the current project
    memory-bank analyze

    # Check the memory bank against the index document
    memory-bank sync ./my-app

    # Walk through the proposed fixes one by one
    memory-bank resolve ./my-app

    # Apply every proposed fix without asking
    memory-bank resolve ./my-app --yes

    # Use a custom layout
    memory-bank --docs-dir docs/bank --index AGENTS.md validate

    # Start MCP server
    memory-bank serve
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Memory bank directory, relative to the project root
    #[arg(long, global = true)]
    pub docs_dir: Option<String>,

    /// Index document, relative to the project root
    #[arg(long, global = true)]
    pub index: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze project sources, patterns and complexity
    Analyze {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Check that the core memory bank documents exist
    Validate {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Compare the memory bank with the index document and plan fixes
    Sync {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Resolve sync conflicts interactively
    Resolve {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Accept every proposed action
        #[arg(long)]
        yes: bool,
    },

    /// Start MCP server
    Serve,
}

/// Layout for `path`: `.memory-bank.toml` when present, then CLI overrides.
pub fn load_config(path: &Path, docs_dir: Option<&str>, index: Option<&str>) -> Result<BankConfig> {
    let mut config = BankConfig::load(path)?;
    if let Some(docs_dir) = docs_dir {
        config = config.with_docs_dir(docs_dir);
    }
    if let Some(index) = index {
        config = config.with_index_path(index);
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn analyze(path: &Path, config: &BankConfig) -> Result<()> {
    print_json(&ProjectAnalyzer::new(config).analyze(path)?)
}

pub fn validate(path: &Path, config: &BankConfig) -> Result<()> {
    print_json(&MemoryBankValidator::new(&StdFs, config).validate(path)?)
}

/// Report, conflict and the planned actions as one JSON object.
pub fn sync(path: &Path, config: &BankConfig) -> Result<()> {
    let snapshot = SyncReconciler::new(config).check(&StdFs, path)?;
    let actions = ConflictPlanner::new(config).plan_snapshot(&snapshot);

    print_json(&serde_json::json!({
        "report": snapshot.report,
        "conflict": snapshot.conflict,
        "actions": actions,
    }))
}

/// Questions go to stderr so stdout carries only the final JSON result.
pub fn resolve(path: &Path, config: &BankConfig, accept_all: bool) -> Result<()> {
    let snapshot = SyncReconciler::new(config).check(&StdFs, path)?;
    let actions = ConflictPlanner::new(config).plan_snapshot(&snapshot);

    let resolver = InteractiveResolver::new(&StdFs, config, path);
    let mut session = resolver.start(actions)?;

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    while session.state == ResolverState::AwaitingResponse {
        if accept_all {
            resolver.respond(&mut session, "yes")?;
            continue;
        }

        print_question(&session)?;
        match lines.next() {
            Some(Ok(line)) if matches!(line.trim(), "q" | "quit" | "abort") => {
                resolver.abort(&mut session, Some("cancelled by user"))?;
            }
            Some(Ok(line)) => {
                resolver.respond(&mut session, &line)?;
            }
            Some(Err(e)) => return Err(MemoryBankError::Io(e)),
            None => {
                resolver.abort(&mut session, Some("input closed"))?;
            }
        }
    }

    print_json(&resolver.finish(&session)?)
}

fn print_question(session: &ResolutionSession) -> Result<()> {
    let mut stderr = std::io::stderr();

    for step in session.conversation_log.iter().rev().take(2).rev() {
        writeln!(stderr, "[{}] {}", step.step, step.content)?;
    }
    if let Some(options) = session.pending_options() {
        let choices: Vec<String> = options
            .iter()
            .enumerate()
            .map(|(i, o)| format!("{}) {}", i + 1, o))
            .collect();
        write!(stderr, "{} / q) abort > ", choices.join("  "))?;
    }
    stderr.flush()?;
    Ok(())
}

pub async fn run_mcp_server() -> Result<()> {
    use crate::mcp::McpServer;
    use rmcp::ServiceExt;

    tracing::info!("Starting memory bank MCP server");

    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let server = McpServer::new()
        .serve(transport)
        .await
        .map_err(|e| MemoryBankError::Mcp(e.to_string()))?;

    server
        .waiting()
        .await
        .map_err(|e| MemoryBankError::Mcp(e.to_string()))?;

    tracing::info!("Memory bank MCP server stopped");
    Ok(())
}
