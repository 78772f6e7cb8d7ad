#![allow(missing_docs)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============= Knowledge Base Types =============

/// A document as listed by the store (without its content or chunks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A retrieved chunk together with its provenance and similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMatch {
    pub text: String,
    pub title: String,
    pub document_id: String,
    pub similarity: f32,
    pub metadata: serde_json::Value,
}

/// Outcome of a document ingestion.
///
/// `chunks` counts the chunks actually persisted, which may be lower than
/// the number produced by the chunker when individual embedding or insert
/// calls failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub document_id: String,
    pub chunks: usize,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
