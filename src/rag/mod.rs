//! Retrieval Augmented Generation (RAG) pipeline.
//!
//! Core components for turning raw documents into retrievable context:
//!
//! - [`chunker`] - sentence-boundary text chunking
//! - [`embeddings`] - embedding provider client
//! - [`ingest`] - document ingestion orchestration
//! - [`retriever`] - similarity retrieval and context formatting
//!
//! # Pipeline
//!
//! 1. **Ingestion** - a document is chunked, each chunk embedded and
//!    persisted ([`ingest::Ingestor::add_document`])
//! 2. **Retrieval** - a query is embedded and the store's similarity
//!    operator returns the closest chunks ([`retriever::Retriever::retrieve`])
//! 3. **Generation** - the chat layer (out of scope here) folds the
//!    formatted context into its prompt

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod retriever;

pub use chunker::TextChunker;
pub use embeddings::{EmbeddingClient, OpenAiEmbedder};
pub use ingest::Ingestor;
pub use retriever::{format_context, Retriever};
