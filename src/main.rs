//! # Commentary Search CLI (`csearch`)
//!
//! ## Usage
//!
//! ```bash
//! csearch --config ./config/commentary.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `csearch search "<query>"` | Hybrid search with reranking and page-window citations |
//! | `csearch tools list` | Print the agent tool catalog |
//! | `csearch tools call <name> --params <json>` | Invoke a tool with JSON parameters |
//! | `csearch completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Search the default namespace
//! csearch search "What does the commentary say about fasting?"
//!
//! # Search another corpus and print the full outcome as JSON
//! csearch search "zakat" --namespace quran-urdu-tafseer-e-kabir --json
//!
//! # Call the agent tool directly
//! csearch tools call search_commentary --params '{"query": "fasting"}'
//! ```
//!
//! Logs go to stderr; set `RUST_LOG=commentary_search=debug` to trace
//! each pipeline stage.

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use commentary_search::config;
use commentary_search::search;
use commentary_search::traits::{ToolContext, ToolRegistry};

/// Commentary Search: hybrid retrieval over scripture commentary for
/// answer-generating agents.
#[derive(Parser)]
#[command(
    name = "csearch",
    about = "Hybrid dense + sparse commentary search with reranking and cited context windows",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/commentary.toml`. API keys are read from the
    /// environment variables the file names, never from the file itself.
    #[arg(long, global = true, default_value = "./config/commentary.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the commentary.
    ///
    /// Prints citation records joined by `---` separators, or a notice
    /// when nothing relevant was found.
    Search {
        /// The question to search for.
        query: String,

        /// Namespace (corpus) to search. Defaults to `retrieval.default_namespace`.
        #[arg(long)]
        namespace: Option<String>,

        /// Print the full outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Agent tool catalog and invocation.
    Tools {
        #[command(subcommand)]
        action: ToolAction,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ToolAction {
    /// List all registered tools with their parameter schemas.
    List,
    /// Invoke a tool.
    Call {
        /// Tool name (e.g. `search_commentary`).
        name: String,
        /// Tool parameters as a JSON object.
        #[arg(long, default_value = "{}")]
        params: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "csearch",
                &mut std::io::stdout(),
            );
            return Ok(());
        }
        Commands::Tools {
            action: ToolAction::List,
        } => {
            let registry = ToolRegistry::with_builtins();
            println!("{}", serde_json::to_string_pretty(&registry.list())?);
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search {
            query,
            namespace,
            json,
        } => {
            search::run_search(&cfg, &query, namespace.as_deref(), json).await?;
        }
        Commands::Tools {
            action: ToolAction::Call { name, params },
        } => {
            let params: serde_json::Value =
                serde_json::from_str(&params).context("--params must be valid JSON")?;
            let ctx = ToolContext::new(Arc::new(cfg))?;
            let registry = ToolRegistry::with_builtins();
            let result = registry.call(&name, params, &ctx).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Tools {
            action: ToolAction::List,
        }
        | Commands::Completions { .. } => {}
    }

    Ok(())
}
