//! Data types for documents, chunks, and search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored document with its full extracted text.
///
/// Created on ingestion, destroyed (with its chunks) on delete, and never
/// mutated afterwards except for the denormalized chunk count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Row id assigned by the store on insert.
    pub id: i64,
    /// User-supplied file name.
    pub name: String,
    /// The full extracted text of the document.
    pub text: String,
    /// When the document was ingested (UTC).
    pub uploaded_at: DateTime<Utc>,
    /// Number of chunks stored for this document.
    pub chunk_count: i64,
}

/// Document metadata for listing, without the full text or embeddings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMeta {
    /// Row id of the document.
    pub id: i64,
    /// User-supplied file name.
    pub name: String,
    /// Number of chunks stored for this document.
    pub chunk_count: i64,
    /// Size of the extracted text in bytes.
    pub size_bytes: i64,
    /// When the document was ingested (UTC).
    pub uploaded_at: DateTime<Utc>,
}

/// A segment of a [`Document`] with its vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Row id of the chunk.
    pub id: i64,
    /// Id of the owning [`Document`].
    pub document_id: i64,
    /// The chunk text, a contiguous word window of the parent document.
    pub text: String,
    /// The embedding vector for this chunk's text.
    pub embedding: Vec<f32>,
}

/// A [`Chunk`] joined with its parent document's name, as yielded by a
/// full-corpus scan.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    /// Display name of the owning document, for citation.
    pub document_name: String,
    /// The stored chunk with its embedding.
    pub chunk: Chunk,
}

/// A retrieved chunk paired with a relevance score.
///
/// Ephemeral: constructed fresh per query and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Id of the owning document.
    pub document_id: i64,
    /// Display name of the owning document.
    pub document_name: String,
    /// Id of the matched chunk.
    pub chunk_id: i64,
    /// The matched chunk text.
    pub text: String,
    /// Cosine similarity of the query against this chunk (higher is better).
    pub score: f32,
}
