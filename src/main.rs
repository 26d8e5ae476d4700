//! # RAG Context CLI (`ragctx`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragctx serve` | Start the JSON HTTP server |
//! | `ragctx documents` | List documents in the seeded knowledge base |
//! | `ragctx search "<query>"` | Print ranked retrieval results |
//! | `ragctx context "<query>"` | Print the formatted prompt context block |
//!
//! The knowledge base is in-memory: every command seeds it according to
//! the `[seed]` section before running.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use rag_context::config::{self, Config};
use rag_context::knowledge::KnowledgeBase;
use rag_context::{logging, seed, server};

/// RAG context engine: knowledge store, lexical retrieval, and prompt
/// context formatting.
#[derive(Parser)]
#[command(name = "ragctx", version, about)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// List documents in the knowledge base.
    Documents,

    /// Rank documents against a query.
    Search {
        /// Free-text query.
        query: String,

        /// Maximum number of results (defaults to `[retrieval].default_limit`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the context block a prompt would receive for a query.
    Context {
        /// Free-text query.
        query: String,

        /// Maximum number of results (defaults to `[retrieval].default_limit`).
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    logging::init_logging(&cfg.logging);

    let kb = Arc::new(KnowledgeBase::from_config(&cfg)?);
    seed::seed_from_config(&kb, &cfg.seed).await?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg, kb).await?;
        }
        Commands::Documents => {
            let docs = kb.get_documents().await?;
            if docs.is_empty() {
                println!("No documents.");
            }
            for doc in docs {
                println!("{}  {:?}  {}", doc.id, doc.status, doc.title);
                println!(
                    "    added: {}  tags: {}",
                    doc.date_added.format("%Y-%m-%dT%H:%M:%SZ"),
                    doc.tags.join(", ")
                );
            }
        }
        Commands::Search { query, limit } => {
            let results = kb.retrieve_context(&query, limit).await?;
            if results.is_empty() {
                println!("No results.");
            }
            for (i, r) in results.iter().enumerate() {
                let title = kb
                    .get_document(&r.document_id)
                    .await?
                    .map(|d| d.title)
                    .unwrap_or_else(|| "(removed)".to_string());
                println!("{}. [{:.2}] {}", i + 1, r.score, title);
                println!("    id: {}", r.document_id);
                let snippet: String = r.content.chars().take(160).collect();
                println!("    {}", snippet);
            }
        }
        Commands::Context { query, limit } => {
            let block = kb.build_context(&query, limit).await?;
            if block.context.is_empty() {
                eprintln!("No relevant context for this query.");
            } else {
                println!("{}", block.context);
            }
        }
    }

    Ok(())
}
