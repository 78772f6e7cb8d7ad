//! In-process document store.
//!
//! Exact cosine scan over everything; fine for tests and ephemeral runs,
//! not meant for large corpora.

use crate::db::store::{validate_document, DocumentStore};
use crate::types::{AppError, ChunkMatch, DocumentSummary, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// In-process [`DocumentStore`] backed by plain collections.
pub struct MemoryStore {
    dimensions: usize,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    // Monotonic insertion counter used as a list-ordering tiebreak when
    // two documents share a creation timestamp.
    seq: u64,
    documents: HashMap<String, StoredDocument>,
    chunks: Vec<StoredChunk>,
}

struct StoredDocument {
    title: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    seq: u64,
}

struct StoredChunk {
    document_id: String,
    index: usize,
    text: String,
    embedding: Vec<f32>,
}

impl MemoryStore {
    /// Create a store that accepts embeddings of the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            inner: RwLock::new(Inner::default()),
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(
        &self,
        title: &str,
        content: &str,
        metadata: &serde_json::Value,
    ) -> Result<String> {
        validate_document(title, content)?;

        let id = Uuid::new_v4().to_string();
        let mut inner = self.inner.write();
        inner.seq += 1;
        let seq = inner.seq;
        inner.documents.insert(
            id.clone(),
            StoredDocument {
                title: title.to_string(),
                metadata: metadata.clone(),
                created_at: Utc::now(),
                seq,
            },
        );

        Ok(id)
    }

    async fn insert_chunk(
        &self,
        document_id: &str,
        index: usize,
        text: &str,
        embedding: &[f32],
    ) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(AppError::InvalidInput(format!(
                "Expected {}-dimensional embedding, got {}",
                self.dimensions,
                embedding.len()
            )));
        }

        let mut inner = self.inner.write();
        if !inner.documents.contains_key(document_id) {
            return Err(AppError::NotFound(format!(
                "Document '{}' not found",
                document_id
            )));
        }
        // Mirror the unique (document_id, chunk_index) constraint of the
        // libsql backend.
        if inner
            .chunks
            .iter()
            .any(|c| c.document_id == document_id && c.index == index)
        {
            return Err(AppError::Database(format!(
                "Chunk {} already exists for document '{}'",
                index, document_id
            )));
        }

        inner.chunks.push(StoredChunk {
            document_id: document_id.to_string(),
            index,
            text: text.to_string(),
            embedding: embedding.to_vec(),
        });

        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let inner = self.inner.read();
        let mut summaries: Vec<(u64, DocumentSummary)> = inner
            .documents
            .iter()
            .map(|(id, doc)| {
                (
                    doc.seq,
                    DocumentSummary {
                        id: id.clone(),
                        title: doc.title.clone(),
                        metadata: doc.metadata.clone(),
                        created_at: doc.created_at,
                    },
                )
            })
            .collect();

        summaries.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| seq_b.cmp(seq_a))
        });

        Ok(summaries.into_iter().map(|(_, summary)| summary).collect())
    }

    async fn delete_document(&self, document_id: &str) -> Result<bool> {
        let mut inner = self.inner.write();
        if inner.documents.remove(document_id).is_none() {
            return Ok(false);
        }

        inner.chunks.retain(|chunk| chunk.document_id != document_id);
        Ok(true)
    }

    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<ChunkMatch>> {
        let inner = self.inner.read();

        let mut matches: Vec<ChunkMatch> = inner
            .chunks
            .iter()
            .filter_map(|chunk| {
                let doc = inner.documents.get(&chunk.document_id)?;
                let similarity = Self::cosine_similarity(query_embedding, &chunk.embedding);
                if similarity >= threshold {
                    Some(ChunkMatch {
                        text: chunk.text.clone(),
                        title: doc.title.clone(),
                        document_id: chunk.document_id.clone(),
                        similarity,
                        metadata: doc.metadata.clone(),
                    })
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn long_content() -> String {
        "Stored content used by the memory store tests. ".repeat(3)
    }

    #[tokio::test]
    async fn insert_and_list_documents() {
        let store = MemoryStore::new(3);

        let id = store
            .insert_document("First", &long_content(), &json!({"source": "test"}))
            .await
            .unwrap();

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert_eq!(docs[0].title, "First");
        assert_eq!(docs[0].metadata, json!({"source": "test"}));
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let store = MemoryStore::new(3);

        let first = store
            .insert_document("Older", &long_content(), &json!({}))
            .await
            .unwrap();
        let second = store
            .insert_document("Newer", &long_content(), &json!({}))
            .await
            .unwrap();

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs[0].id, second);
        assert_eq!(docs[1].id, first);
    }

    #[tokio::test]
    async fn insert_document_validates_input() {
        let store = MemoryStore::new(3);

        let short = store.insert_document("Title", "too short", &json!({})).await;
        assert!(matches!(short, Err(AppError::InvalidInput(_))));

        let untitled = store.insert_document("", &long_content(), &json!({})).await;
        assert!(matches!(untitled, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn insert_chunk_rejects_wrong_dimensionality() {
        let store = MemoryStore::new(3);
        let id = store
            .insert_document("Doc", &long_content(), &json!({}))
            .await
            .unwrap();

        let result = store.insert_chunk(&id, 0, "some chunk text", &[1.0, 0.0]).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn insert_chunk_requires_existing_document() {
        let store = MemoryStore::new(2);
        let result = store
            .insert_chunk("missing", 0, "orphan", &[1.0, 0.0])
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn similarity_search_orders_filters_and_caps() {
        let store = MemoryStore::new(3);
        let id = store
            .insert_document("Doc", &long_content(), &json!({}))
            .await
            .unwrap();

        store.insert_chunk(&id, 0, "exact", &[1.0, 0.0, 0.0]).await.unwrap();
        store.insert_chunk(&id, 1, "close", &[0.9, 0.1, 0.0]).await.unwrap();
        store.insert_chunk(&id, 2, "far", &[0.0, 1.0, 0.0]).await.unwrap();

        let matches = store
            .similarity_search(&[1.0, 0.0, 0.0], 10, 0.5)
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].text, "exact");
        assert_eq!(matches[1].text, "close");
        assert!(matches[0].similarity >= matches[1].similarity);

        let capped = store
            .similarity_search(&[1.0, 0.0, 0.0], 1, 0.5)
            .await
            .unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].text, "exact");
    }

    #[tokio::test]
    async fn delete_cascades_to_chunks() {
        let store = MemoryStore::new(3);
        let id = store
            .insert_document("Doc", &long_content(), &json!({}))
            .await
            .unwrap();
        store.insert_chunk(&id, 0, "chunk", &[1.0, 0.0, 0.0]).await.unwrap();

        assert!(store.delete_document(&id).await.unwrap());
        assert!(store.list_documents().await.unwrap().is_empty());

        let matches = store
            .similarity_search(&[1.0, 0.0, 0.0], 10, 0.0)
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn delete_of_unknown_document_reports_not_found() {
        let store = MemoryStore::new(3);
        assert!(!store.delete_document("nonexistent-id").await.unwrap());
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((MemoryStore::cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(MemoryStore::cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert!((MemoryStore::cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 0.001);
        assert_eq!(MemoryStore::cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
