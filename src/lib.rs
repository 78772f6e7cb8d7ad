//! # Sunrise KB
//!
//! Knowledge-base ingestion and vector retrieval engine for the Sunrise
//! support chat. Documents are split into overlapping sentence-bounded
//! chunks, embedded via an OpenAI-compatible provider, persisted with
//! their vectors, and retrieved by cosine similarity with a threshold
//! and result cap.
//!
//! The conversational layer (LLM calls, web transport, UI) lives
//! elsewhere; this crate owns everything between raw text and ranked
//! context chunks.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sunrise_kb::{
//!     db::StoreProvider,
//!     rag::{Ingestor, OpenAiEmbedder, Retriever},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = StoreProvider::Local {
//!         path: "sunrise.db".into(),
//!         dimensions: 1536,
//!     }
//!     .create_store()
//!     .await?;
//!
//!     let embedder = Arc::new(OpenAiEmbedder::new(
//!         std::env::var("OPENAI_API_KEY")?,
//!         "https://api.openai.com/v1",
//!         "text-embedding-3-small",
//!         1536,
//!     )?);
//!
//!     let ingestor = Ingestor::new(store.clone(), embedder.clone());
//!     let receipt = ingestor
//!         .add_document("Coping Skills", &std::fs::read_to_string("skills.txt")?, Default::default())
//!         .await?;
//!     println!("ingested {} chunks", receipt.chunks);
//!
//!     let retriever = Retriever::new(store, embedder);
//!     for hit in retriever.retrieve("feeling anxious", 3, 0.7).await {
//!         println!("{:.2} {}", hit.similarity, hit.title);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`rag`] - chunking, embeddings, ingestion, retrieval
//! - [`db`] - document store trait and backends (libsql, in-memory)
//! - [`types`] - shared types and error handling
//! - [`utils`] - environment configuration

#![warn(missing_docs)]

/// Command-line interface for managing the knowledge base.
pub mod cli;
/// Document store trait and backends.
pub mod db;
/// RAG pipeline components.
pub mod rag;
/// Core types (summaries, matches, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use db::{DocumentStore, LibsqlStore, MemoryStore, StoreProvider};
pub use rag::{format_context, EmbeddingClient, Ingestor, OpenAiEmbedder, Retriever, TextChunker};
pub use types::{AppError, ChunkMatch, DocumentSummary, IngestReceipt, Result};
pub use utils::Config;
