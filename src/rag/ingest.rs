//! Document ingestion orchestration.
//!
//! Coordinates chunker -> embedding client -> document store for a full
//! document. Chunk embeddings are requested strictly sequentially with a
//! pacing delay between calls, keeping provider quota consumption
//! predictable. A failed chunk is logged and skipped; it never aborts the
//! rest of the ingestion.

use crate::db::DocumentStore;
use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::EmbeddingClient;
use crate::types::{AppError, IngestReceipt, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default delay between successive embedding requests.
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(100);

/// Runs the full ingestion pipeline for one document at a time.
pub struct Ingestor {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingClient>,
    chunker: TextChunker,
    pacing_delay: Duration,
}

impl Ingestor {
    /// Create an ingestor with the default chunker and pacing delay.
    pub fn new(store: Arc<dyn DocumentStore>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            store,
            embedder,
            chunker: TextChunker::default(),
            pacing_delay: DEFAULT_PACING_DELAY,
        }
    }

    /// Replace the default chunker.
    pub fn with_chunker(mut self, chunker: TextChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Delay inserted between successive embedding requests.
    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay = delay;
        self
    }

    /// Ingest a document: validate, chunk, then embed and persist each
    /// chunk in order.
    ///
    /// Validation and chunking happen before any insert or provider
    /// call, so an undersized document never leaves a partial record
    /// behind. The receipt's `chunks` field counts chunks actually
    /// persisted, which may be lower than the number chunked when
    /// individual embedding or insert calls fail.
    pub async fn add_document(
        &self,
        title: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> Result<IngestReceipt> {
        crate::db::store::validate_document(title, content)?;

        let chunks = self.chunker.chunk(content);
        if chunks.is_empty() {
            // Content passed the length check but nothing survived the
            // chunk filter; treat it like undersized input.
            return Err(AppError::InvalidInput(
                "Document content produced no usable chunks".into(),
            ));
        }

        let document_id = self.store.insert_document(title, content, &metadata).await?;
        info!(
            document_id = %document_id,
            title,
            chunk_count = chunks.len(),
            "Ingesting document"
        );

        let mut persisted = 0;
        for (index, chunk) in chunks.iter().enumerate() {
            match self.embed_and_insert(&document_id, index, chunk).await {
                Ok(()) => persisted += 1,
                Err(e) => {
                    warn!(
                        document_id = %document_id,
                        chunk_index = index,
                        error = %e,
                        "Skipping failed chunk"
                    );
                }
            }

            if index + 1 < chunks.len() {
                tokio::time::sleep(self.pacing_delay).await;
            }
        }

        Ok(IngestReceipt {
            document_id,
            chunks: persisted,
        })
    }

    async fn embed_and_insert(&self, document_id: &str, index: usize, text: &str) -> Result<()> {
        let embedding = self.embedder.embed(text).await?;
        self.store
            .insert_chunk(document_id, index, text, &embedding)
            .await
    }
}
