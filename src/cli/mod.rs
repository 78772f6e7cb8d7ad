//! Command-line interface for managing the knowledge base.
//!
//! Wraps the ingestion/retrieval library in four subcommands: `add` a
//! document from a file, `list` stored documents, `delete` one by id,
//! and `query` the store the way the chat layer would.

use crate::db::StoreProvider;
use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::OpenAiEmbedder;
use crate::rag::{format_context, Ingestor, Retriever};
use crate::types::AppError;
use crate::utils::Config;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Sunrise KB - knowledge-base manager for the Sunrise support chat.
#[derive(Parser, Debug)]
#[command(
    name = "sunrise-kb",
    version,
    about = "Manage the Sunrise Chat knowledge base",
    after_help = "EXAMPLES:\n    \
                  sunrise-kb add --title \"Coping Skills\" --file ./skills.txt\n    \
                  sunrise-kb list\n    \
                  sunrise-kb query \"feeling anxious before school\"\n    \
                  sunrise-kb delete 6f1c2a9e-..."
)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a document to the knowledge base
    Add {
        /// Document title
        #[arg(long)]
        title: String,

        /// Path to a UTF-8 text file with the document content
        #[arg(long)]
        file: PathBuf,
    },

    /// List all documents, newest first
    List,

    /// Delete a document and all of its chunks
    Delete {
        /// Document id as printed by `add` or `list`
        id: String,
    },

    /// Run a retrieval query and print the matching chunks
    Query {
        /// Query text
        text: String,

        /// Maximum number of matches to return
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum cosine similarity for a match
        #[arg(long)]
        threshold: Option<f32>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Execute a parsed CLI invocation.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let store = StoreProvider::from_env(config.embedding.dimensions)
        .create_store()
        .await?;

    match cli.command {
        Commands::Add { title, file } => {
            let content = std::fs::read_to_string(&file)
                .map_err(|e| AppError::InvalidInput(format!("Cannot read {}: {}", file.display(), e)))?;

            let embedder = build_embedder(&config)?;
            let ingestor = Ingestor::new(store, embedder)
                .with_chunker(TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap))
                .with_pacing_delay(Duration::from_millis(config.rag.pacing_ms));

            println!(
                "Adding document {} ({} characters)",
                title.bold(),
                content.len()
            );

            let metadata = json!({ "source": file_basename(&file) });
            let receipt = ingestor.add_document(&title, &content, metadata).await?;

            println!(
                "{} Document ID: {}, chunks stored: {}",
                "Done!".green().bold(),
                receipt.document_id,
                receipt.chunks
            );
        }

        Commands::List => {
            let documents = store.list_documents().await?;
            if documents.is_empty() {
                println!("No documents in the knowledge base.");
                return Ok(());
            }

            for doc in documents {
                println!(
                    "{}  {}  {}",
                    doc.id.dimmed(),
                    doc.created_at.format("%Y-%m-%d %H:%M"),
                    doc.title.bold()
                );
            }
        }

        Commands::Delete { id } => {
            if store.delete_document(&id).await? {
                println!("{} Document {} deleted.", "Done!".green().bold(), id);
            } else {
                return Err(AppError::NotFound(format!("Document '{}' not found", id)).into());
            }
        }

        Commands::Query {
            text,
            top_k,
            threshold,
        } => {
            let embedder = build_embedder(&config)?;
            let retriever = Retriever::new(store, embedder);

            let matches = retriever
                .retrieve(
                    &text,
                    top_k.unwrap_or(config.rag.top_k),
                    threshold.unwrap_or(config.rag.similarity_threshold),
                )
                .await;

            match format_context(&matches) {
                Some(context) => {
                    for m in &matches {
                        println!(
                            "{}  {}",
                            format!("{:.3}", m.similarity).cyan(),
                            m.title.bold()
                        );
                    }
                    println!("\n{}", context);
                }
                None => println!("No relevant chunks found."),
            }
        }
    }

    Ok(())
}

fn build_embedder(config: &Config) -> anyhow::Result<Arc<OpenAiEmbedder>> {
    Ok(Arc::new(
        OpenAiEmbedder::new(
            config.embedding.api_key.clone(),
            config.embedding.base_url.clone(),
            config.embedding.model.clone(),
            config.embedding.dimensions,
        )?
        .with_max_retries(config.embedding.max_retries),
    ))
}

fn file_basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
