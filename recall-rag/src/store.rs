//! Storage trait for documents, chunks, and their embeddings.

use async_trait::async_trait;

use crate::document::{Document, DocumentMeta, StoredChunk};
use crate::error::Result;

/// Persistent storage for documents and their embedded chunks.
///
/// Every chunk belongs to exactly one document and is removed only as a
/// cascade of deleting its parent. The full-corpus scan
/// ([`all_chunks`](DocumentStore::all_chunks)) sits behind this trait on
/// purpose: retrieval is a brute-force scan today, and an index-backed
/// implementation can be substituted later without touching the retriever.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document row and return its assigned id.
    async fn insert_document(&self, name: &str, text: &str) -> Result<i64>;

    /// Bulk-insert chunks for a document and set its chunk count.
    ///
    /// Atomic: either every chunk row and the parent's `chunk_count` update
    /// commit together, or nothing does. Each embedding must have the
    /// store's dimensionality.
    async fn insert_chunks(&self, document_id: i64, chunks: &[(String, Vec<f32>)]) -> Result<()>;

    /// List document metadata, newest first, without full text or embeddings.
    async fn list_documents(&self) -> Result<Vec<DocumentMeta>>;

    /// Fetch a single document with its full text.
    async fn get_document(&self, document_id: i64) -> Result<Option<Document>>;

    /// Every stored chunk joined with its document's name, in insertion order.
    async fn all_chunks(&self) -> Result<Vec<StoredChunk>>;

    /// Delete a document and cascade to all its chunks.
    ///
    /// Returns whether a document existed to delete.
    async fn delete_document(&self, document_id: i64) -> Result<bool>;

    /// The embedding dimensionality this store accepts.
    fn dimensions(&self) -> usize;
}
