//! Ingestion and semantic search
//!
//! ingest: read -> chunk -> embed -> upsert. search: embed -> query.

use crate::errors::{FolioError, Result};
use crate::gemini::GeminiClient;
use crate::retrieval::chunker::chunk_text;
use crate::retrieval::store::{ChunkRecord, DocumentIndex, SearchHit};
use async_trait::async_trait;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Text embedding seam
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        GeminiClient::embed(self, text).await
    }
}

/// Ingestion counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub chunks: usize,
    /// Files that could not be read, with the reason
    pub skipped: Vec<(String, String)>,
}

/// Chunk, embed and store one document
pub async fn ingest_text<E, I>(
    embedder: &E,
    index: &I,
    source: &str,
    text: &str,
    chunk_size: usize,
) -> Result<usize>
where
    E: Embedder + ?Sized,
    I: DocumentIndex + ?Sized,
{
    let chunks = chunk_text(text, chunk_size);
    let mut records = Vec::with_capacity(chunks.len());

    for (i, chunk) in chunks.into_iter().enumerate() {
        let embedding = embedder.embed(&chunk).await?;
        records.push(ChunkRecord {
            id: Uuid::new_v4().to_string(),
            document: chunk,
            source: source.to_string(),
            chunk: i,
            embedding,
        });
    }

    let count = records.len();
    index.upsert(records).await?;
    Ok(count)
}

/// Ingest text files; unreadable files are skipped and reported
pub async fn ingest<E, I, P>(
    embedder: &E,
    index: &I,
    paths: &[P],
    chunk_size: usize,
) -> Result<IngestReport>
where
    E: Embedder + ?Sized,
    I: DocumentIndex + ?Sized,
    P: AsRef<Path>,
{
    index.ensure_collection().await?;

    let mut report = IngestReport::default();
    for path in paths {
        let path = path.as_ref();
        let source = path.display().to_string();

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(source = %source, error = %e, "skipping unreadable file");
                report.skipped.push((source, e.to_string()));
                continue;
            }
        };

        let chunks = ingest_text(embedder, index, &source, &text, chunk_size).await?;
        info!(source = %source, chunks, "document ingested");
        report.files += 1;
        report.chunks += chunks;
    }

    Ok(report)
}

/// Embed the query and return the closest chunks
pub async fn search<E, I>(embedder: &E, index: &I, query: &str, top_k: usize) -> Result<Vec<SearchHit>>
where
    E: Embedder + ?Sized,
    I: DocumentIndex + ?Sized,
{
    if query.trim().is_empty() {
        return Err(FolioError::InvalidInput("search query is empty".to_string()));
    }

    let embedding = embedder.embed(query).await?;
    index.search(&embedding, top_k.max(1)).await
}
