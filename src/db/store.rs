//! Document store abstraction.
//!
//! [`DocumentStore`] is the persistence seam for the knowledge base:
//! documents with their chunk+embedding records, plus the vector
//! similarity operator the retriever delegates to. Backends implement
//! the ordering and threshold contract of [`DocumentStore::similarity_search`];
//! how they index vectors is their own business.
//!
//! # Example
//!
//! ```rust,ignore
//! use sunrise_kb::db::StoreProvider;
//!
//! // In-process store (tests, ephemeral runs)
//! let store = StoreProvider::Memory { dimensions: 1536 }.create_store().await?;
//!
//! // File-backed libsql store
//! let store = StoreProvider::Local { path: "sunrise.db".into(), dimensions: 1536 }
//!     .create_store()
//!     .await?;
//! ```

use crate::types::{AppError, ChunkMatch, DocumentSummary, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Minimum accepted document content length, in characters after trimming.
///
/// Matches the minimum viable chunk length, so any accepted document can
/// in principle produce at least one chunk.
pub const MIN_CONTENT_LEN: usize = 50;

/// Store backend configuration.
#[derive(Debug, Clone)]
pub enum StoreProvider {
    /// In-process store (ephemeral, lost on drop).
    Memory {
        /// Embedding dimensionality enforced on insert.
        dimensions: usize,
    },
    /// Local libsql database file (`:memory:` for an ephemeral database).
    Local {
        /// Path to the database file.
        path: String,
        /// Embedding dimensionality of the chunk vector column.
        dimensions: usize,
    },
    /// Remote Turso database.
    #[cfg(feature = "turso")]
    Turso {
        /// Database URL (e.g. `libsql://your-db.turso.io`).
        url: String,
        /// Authentication token.
        auth_token: String,
        /// Embedding dimensionality of the chunk vector column.
        dimensions: usize,
    },
}

impl StoreProvider {
    /// Create a store from this provider configuration.
    pub async fn create_store(&self) -> Result<Arc<dyn DocumentStore>> {
        match self {
            StoreProvider::Memory { dimensions } => {
                Ok(Arc::new(super::memory::MemoryStore::new(*dimensions)))
            }
            StoreProvider::Local { path, dimensions } => {
                let store = super::libsql::LibsqlStore::new_local(path, *dimensions).await?;
                Ok(Arc::new(store))
            }
            #[cfg(feature = "turso")]
            StoreProvider::Turso {
                url,
                auth_token,
                dimensions,
            } => {
                let store = super::libsql::LibsqlStore::new_remote(
                    url.clone(),
                    auth_token.clone(),
                    *dimensions,
                )
                .await?;
                Ok(Arc::new(store))
            }
        }
    }

    /// Resolve a provider from environment variables.
    ///
    /// Checks Turso credentials first (requires the `turso` feature),
    /// then `DATABASE_PATH`, and falls back to an in-memory database.
    pub fn from_env(dimensions: usize) -> Self {
        #[cfg(feature = "turso")]
        {
            if let (Ok(url), Ok(auth_token)) = (
                std::env::var("TURSO_DATABASE_URL"),
                std::env::var("TURSO_AUTH_TOKEN"),
            ) {
                if !url.is_empty() && !auth_token.is_empty() {
                    return StoreProvider::Turso {
                        url,
                        auth_token,
                        dimensions,
                    };
                }
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            if !path.is_empty() {
                return StoreProvider::Local { path, dimensions };
            }
        }

        StoreProvider::Local {
            path: ":memory:".into(),
            dimensions,
        }
    }
}

/// Persistence operations for documents and their embedded chunks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document record and return its id.
    ///
    /// # Errors
    ///
    /// [`AppError::InvalidInput`] when the title is empty or the trimmed
    /// content is shorter than [`MIN_CONTENT_LEN`].
    async fn insert_document(
        &self,
        title: &str,
        content: &str,
        metadata: &serde_json::Value,
    ) -> Result<String>;

    /// Insert one chunk with its embedding for an existing document.
    ///
    /// `index` is the chunk's 0-based position in the original text.
    /// Embeddings whose length differs from the store's configured
    /// dimensionality are rejected.
    async fn insert_chunk(
        &self,
        document_id: &str,
        index: usize,
        text: &str,
        embedding: &[f32],
    ) -> Result<()>;

    /// List all documents, newest first.
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>>;

    /// Delete a document and all of its chunks.
    ///
    /// Returns `Ok(false)` when no document with that id exists; absence
    /// is a signal to the caller, not an error.
    async fn delete_document(&self, document_id: &str) -> Result<bool>;

    /// Find the chunks most similar to `query_embedding`.
    ///
    /// Results are ordered by cosine similarity descending, contain only
    /// entries with similarity at or above `threshold`, and are capped
    /// at `limit`.
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<ChunkMatch>>;
}

/// Shared document validation applied by every backend before insert.
pub(crate) fn validate_document(title: &str, content: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidInput("Document title must not be empty".into()));
    }
    if content.trim().len() < MIN_CONTENT_LEN {
        return Err(AppError::InvalidInput(format!(
            "Document content must be at least {} characters",
            MIN_CONTENT_LEN
        )));
    }
    Ok(())
}
