#![allow(missing_docs)]

use crate::rag::chunker::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::rag::embeddings::{DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL};
use crate::rag::retriever::{DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K};
use crate::types::{AppError, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub pacing_ms: u64,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            embedding: EmbeddingConfig {
                api_key: env::var("OPENAI_API_KEY")
                    .map_err(|_| AppError::Config("OPENAI_API_KEY is not set".into()))?,
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
                dimensions: parse_var("EMBEDDING_DIMENSIONS", DEFAULT_EMBEDDING_DIMENSIONS)?,
                max_retries: parse_var("EMBED_MAX_RETRIES", 3)?,
            },
            rag: RagConfig {
                chunk_size: parse_var("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
                chunk_overlap: parse_var("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
                top_k: parse_var("RAG_TOP_K", DEFAULT_TOP_K)?,
                similarity_threshold: parse_var("SIMILARITY_THRESHOLD", DEFAULT_SIMILARITY_THRESHOLD)?,
                pacing_ms: parse_var("EMBED_PACING_MS", 100)?,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid value for {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}
