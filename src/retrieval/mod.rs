//! Document retrieval
//!
//! Text files are chunked, embedded with the Gemini embedding model and
//! stored in qdrant; queries are embedded the same way and answered by a
//! nearest-neighbour search.

pub mod chunker;
pub mod ingest;
pub mod store;

pub use chunker::chunk_text;
pub use ingest::{ingest, ingest_text, search, Embedder, IngestReport};
pub use store::{ChunkRecord, DocumentIndex, SearchHit, VectorStore};
