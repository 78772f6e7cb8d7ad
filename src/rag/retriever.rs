//! Best-effort similarity retrieval.
//!
//! Retrieval supplies supplementary context to the conversational flow
//! and is never a hard dependency of it: any embedder or store failure
//! is logged and swallowed into an empty result set.

use crate::db::DocumentStore;
use crate::rag::embeddings::EmbeddingClient;
use crate::types::{ChunkMatch, Result};
use std::sync::Arc;
use tracing::warn;

/// Default number of matches returned by a retrieval query.
pub const DEFAULT_TOP_K: usize = 3;

/// Default minimum cosine similarity for a match to count as relevant.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

/// Embeds queries and ranks stored chunks against them.
pub struct Retriever {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingClient>,
}

impl Retriever {
    /// Create a retriever over a store and an embedding client.
    pub fn new(store: Arc<dyn DocumentStore>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self { store, embedder }
    }

    /// Embed `query` and return up to `top_k` chunks with similarity at
    /// or above `threshold`, ordered by similarity descending. Failures
    /// yield an empty vec.
    pub async fn retrieve(&self, query: &str, top_k: usize, threshold: f32) -> Vec<ChunkMatch> {
        match self.try_retrieve(query, top_k, threshold).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "Retrieval failed, continuing without context");
                Vec::new()
            }
        }
    }

    async fn try_retrieve(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<ChunkMatch>> {
        let query_embedding = self.embedder.embed(query).await?;
        self.store
            .similarity_search(&query_embedding, top_k, threshold)
            .await
    }
}

/// Render retrieved matches as a numbered context block for prompt
/// assembly. Returns `None` when there is nothing to cite.
pub fn format_context(matches: &[ChunkMatch]) -> Option<String> {
    if matches.is_empty() {
        return None;
    }

    let blocks: Vec<String> = matches
        .iter()
        .enumerate()
        .map(|(i, m)| format!("[{}] From \"{}\":\n{}\n", i + 1, m.title, m.text))
        .collect();

    Some(blocks.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk_match(title: &str, text: &str, similarity: f32) -> ChunkMatch {
        ChunkMatch {
            text: text.to_string(),
            title: title.to_string(),
            document_id: "doc-1".to_string(),
            similarity,
            metadata: json!({}),
        }
    }

    #[test]
    fn format_context_numbers_matches() {
        let matches = vec![
            chunk_match("Coping Skills", "Take a slow breath.", 0.91),
            chunk_match("Sleep Guide", "Keep a steady bedtime.", 0.82),
        ];

        let context = format_context(&matches).unwrap();
        assert!(context.starts_with("[1] From \"Coping Skills\":\nTake a slow breath."));
        assert!(context.contains("[2] From \"Sleep Guide\":\nKeep a steady bedtime."));
    }

    #[test]
    fn format_context_is_empty_for_no_matches() {
        assert!(format_context(&[]).is_none());
    }
}
