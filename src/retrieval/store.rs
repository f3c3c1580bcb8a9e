//! Vector store over qdrant
//!
//! One collection per corpus, cosine distance, configured dimension.
//! Each point carries the chunk text (`document`), its `source` path and
//! the chunk index.

use crate::errors::{FolioError, Result};
use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        point_id::PointIdOptions, value::Kind, CreateCollectionBuilder, Distance, PointId,
        PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
        VectorParamsBuilder,
    },
    Qdrant,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// A chunk ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkRecord {
    pub id: String,
    pub document: String,
    pub source: String,
    pub chunk: usize,
    pub embedding: Vec<f32>,
}

/// Search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub document: String,
    pub source: String,
    pub chunk: Option<i64>,
}

/// Storage seam used by ingestion and search
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Create the collection if it does not exist
    async fn ensure_collection(&self) -> Result<()>;

    async fn upsert(&self, records: Vec<ChunkRecord>) -> Result<()>;

    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// Number of stored points
    async fn count(&self) -> Result<u64>;
}

/// qdrant-backed [`DocumentIndex`]
pub struct VectorStore {
    client: Qdrant,
    collection: String,
    dimension: u64,
    score_threshold: f32,
}

fn store_error(context: &str, err: impl std::fmt::Display) -> FolioError {
    FolioError::VectorStoreError(format!("{}: {}", context, err))
}

impl VectorStore {
    pub fn new(url: &str, collection: &str, dimension: u64, score_threshold: f32) -> Result<Self> {
        if collection.trim().is_empty() {
            return Err(FolioError::InvalidInput("collection name is empty".to_string()));
        }

        // Connections are lazy; the version handshake would block on a live server
        let client = Qdrant::from_url(url)
            .skip_compatibility_check()
            .build()
            .map_err(|e| store_error("failed to create qdrant client", e))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            dimension,
            score_threshold,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl DocumentIndex for VectorStore {
    async fn ensure_collection(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(self.collection.as_str())
            .await
            .map_err(|e| store_error("failed to check collection", e))?;

        if exists {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(self.collection.as_str())
                    .vectors_config(VectorParamsBuilder::new(self.dimension, Distance::Cosine)),
            )
            .await
            .map_err(|e| store_error(&format!("failed to create collection {}", self.collection), e))?;

        info!(collection = %self.collection, dimension = self.dimension, "collection created");
        Ok(())
    }

    async fn upsert(&self, records: Vec<ChunkRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        for record in &records {
            if record.embedding.len() as u64 != self.dimension {
                return Err(FolioError::VectorStoreError(format!(
                    "embedding has {} dimensions, collection expects {}",
                    record.embedding.len(),
                    self.dimension
                )));
            }
        }

        let count = records.len();
        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let mut payload: HashMap<String, QdrantValue> = HashMap::new();
                payload.insert("document".to_string(), QdrantValue::from(record.document));
                payload.insert("source".to_string(), QdrantValue::from(record.source));
                payload.insert("chunk".to_string(), QdrantValue::from(record.chunk as i64));
                PointStruct::new(record.id, record.embedding, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(self.collection.as_str(), points).wait(true))
            .await
            .map_err(|e| store_error("failed to upsert points", e))?;

        debug!(collection = %self.collection, count, "points upserted");
        Ok(())
    }

    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(self.collection.as_str(), embedding.to_vec(), limit as u64)
                    .with_payload(true)
                    .score_threshold(self.score_threshold),
            )
            .await
            .map_err(|e| store_error("failed to search points", e))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: point_id_to_string(point.id.as_ref()),
                score: point.score,
                document: payload_string(&point.payload, "document"),
                source: payload_string(&point.payload, "source"),
                chunk: point.payload.get("chunk").and_then(payload_integer),
            })
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        let info = self
            .client
            .collection_info(self.collection.as_str())
            .await
            .map_err(|e| store_error("failed to get collection info", e))?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }
}

fn payload_string(payload: &HashMap<String, QdrantValue>, key: &str) -> String {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => s.clone(),
        _ => String::new(),
    }
}

fn payload_integer(value: &QdrantValue) -> Option<i64> {
    match value.kind.as_ref()? {
        Kind::IntegerValue(i) => Some(*i),
        Kind::DoubleValue(f) => Some(*f as i64),
        _ => None,
    }
}

fn point_id_to_string(point_id: Option<&PointId>) -> String {
    match point_id.and_then(|id| id.point_id_options.as_ref()) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => "unknown".to_string(),
    }
}
