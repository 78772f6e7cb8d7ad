//! libsql-backed document store.
//!
//! Documents and chunks live in two tables; chunk embeddings are stored
//! in an `F32_BLOB` column and similarity search is delegated to the
//! engine's native vector operators (`vector32`, `vector_distance_cos`).
//! Cosine *distance* is converted to similarity as `1 - distance`, so the
//! threshold/ordering contract of [`DocumentStore`] holds unchanged.
//!
//! Works against a local database file, `:memory:`, or (with the `turso`
//! feature) a remote Turso database.

use crate::db::store::{validate_document, DocumentStore};
use crate::types::{AppError, ChunkMatch, DocumentSummary, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection};
use uuid::Uuid;

/// [`DocumentStore`] backed by a libsql database.
pub struct LibsqlStore {
    conn: Connection,
    dimensions: usize,
}

impl LibsqlStore {
    /// Open (or create) a local database file. Use `:memory:` for an
    /// ephemeral database.
    pub async fn new_local(path: &str, dimensions: usize) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        Self::from_database(db, dimensions).await
    }

    /// Connect to a remote Turso database.
    #[cfg(feature = "turso")]
    pub async fn new_remote(url: String, auth_token: String, dimensions: usize) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        Self::from_database(db, dimensions).await
    }

    async fn from_database(db: libsql::Database, dimensions: usize) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let store = Self { conn, dimensions };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS documents (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    metadata TEXT NOT NULL DEFAULT '{}',
                    created_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create documents table: {}", e)))?;

        // The vector column is sized to the embedding model in use, so
        // the dimensionality has to be interpolated into the DDL.
        self.conn
            .execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS document_chunks (
                        id TEXT PRIMARY KEY,
                        document_id TEXT NOT NULL,
                        chunk_index INTEGER NOT NULL,
                        chunk_text TEXT NOT NULL,
                        embedding F32_BLOB({}) NOT NULL,
                        FOREIGN KEY (document_id) REFERENCES documents(id),
                        UNIQUE (document_id, chunk_index)
                    )",
                    self.dimensions
                ),
                (),
            )
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to create document_chunks table: {}", e))
            })?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LibsqlStore {
    async fn insert_document(
        &self,
        title: &str,
        content: &str,
        metadata: &serde_json::Value,
    ) -> Result<String> {
        validate_document(title, content)?;

        let id = Uuid::new_v4().to_string();
        let metadata_json = metadata.to_string();
        let now = Utc::now().timestamp();

        self.conn
            .execute(
                "INSERT INTO documents (id, title, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id.as_str(), title, content, metadata_json.as_str(), now),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert document: {}", e)))?;

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

        let id = Uuid::new_v4().to_string();
        let embedding_json = serde_json::to_string(embedding)
            .map_err(|e| AppError::Database(format!("Failed to encode embedding: {}", e)))?;

        self.conn
            .execute(
                "INSERT INTO document_chunks (id, document_id, chunk_index, chunk_text, embedding)
                 VALUES (?1, ?2, ?3, ?4, vector32(?5))",
                (
                    id.as_str(),
                    document_id,
                    index as i64,
                    text,
                    embedding_json.as_str(),
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert chunk: {}", e)))?;

        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, title, metadata, created_at
                 FROM documents
                 ORDER BY created_at DESC, rowid DESC",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to list documents: {}", e)))?;

        let mut documents = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let metadata_json: String =
                row.get(2).map_err(|e| AppError::Database(e.to_string()))?;
            let created_at: i64 = row.get(3).map_err(|e| AppError::Database(e.to_string()))?;

            documents.push(DocumentSummary {
                id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
                title: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
                metadata: serde_json::from_str(&metadata_json)
                    .unwrap_or(serde_json::Value::Null),
                created_at: DateTime::<Utc>::from_timestamp(created_at, 0).unwrap_or_default(),
            });
        }

        Ok(documents)
    }

    async fn delete_document(&self, document_id: &str) -> Result<bool> {
        // Chunk rows go first so a successful delete never leaves
        // orphans; both statements commit together.
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "DELETE FROM document_chunks WHERE document_id = ?1",
            [document_id],
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete chunks: {}", e)))?;

        let deleted = tx
            .execute("DELETE FROM documents WHERE id = ?1", [document_id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete document: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit delete: {}", e)))?;

        Ok(deleted > 0)
    }

    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<ChunkMatch>> {
        let query_json = serde_json::to_string(query_embedding)
            .map_err(|e| AppError::Database(format!("Failed to encode query vector: {}", e)))?;

        let mut rows = self
            .conn
            .query(
                "SELECT c.chunk_text, d.title, d.id,
                        (1.0 - vector_distance_cos(c.embedding, vector32(?1))) AS similarity,
                        d.metadata
                 FROM document_chunks c
                 JOIN documents d ON d.id = c.document_id
                 WHERE (1.0 - vector_distance_cos(c.embedding, vector32(?1))) >= ?2
                 ORDER BY similarity DESC
                 LIMIT ?3",
                (query_json.as_str(), threshold as f64, limit as i64),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to run similarity search: {}", e)))?;

        let mut matches = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let similarity: f64 = row.get(3).map_err(|e| AppError::Database(e.to_string()))?;
            let metadata_json: String =
                row.get(4).map_err(|e| AppError::Database(e.to_string()))?;

            matches.push(ChunkMatch {
                text: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
                title: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
                document_id: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
                similarity: similarity as f32,
                metadata: serde_json::from_str(&metadata_json)
                    .unwrap_or(serde_json::Value::Null),
            });
        }

        Ok(matches)
    }
}
