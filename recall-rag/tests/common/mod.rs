//! Shared test doubles: deterministic embedders and a fault-injecting store.
#![allow(dead_code)]

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use recall_rag::document::{Document, DocumentMeta, StoredChunk};
use recall_rag::embedding::EmbeddingProvider;
use recall_rag::error::{RecallError, Result};
use recall_rag::store::DocumentStore;

/// Deterministic bag-of-words embedder: each word increments one component
/// picked by its hash, and the vector is L2-normalized. Texts sharing words
/// score high against each other; identical text embeds identically.
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RecallError::Embedding {
                provider: "hash".to_string(),
                message: "cannot embed empty text".to_string(),
            });
        }
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            vector[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        for value in &mut vector {
            *value /= norm;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embedder that returns the same preset vector for every input.
pub struct ConstEmbedder {
    vector: Vec<f32>,
}

impl ConstEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl EmbeddingProvider for ConstEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.vector.clone())
    }

    fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Embedder that always fails.
pub struct FailingEmbedder {
    pub dimensions: usize,
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RecallError::Embedding {
            provider: "failing".to_string(),
            message: "injected embedding failure".to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Store wrapper that fails every chunk insert but delegates everything
/// else, for exercising mid-ingestion rollback.
pub struct ChunkInsertFailingStore<S> {
    pub inner: Arc<S>,
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for ChunkInsertFailingStore<S> {
    async fn insert_document(&self, name: &str, text: &str) -> Result<i64> {
        self.inner.insert_document(name, text).await
    }

    async fn insert_chunks(&self, _document_id: i64, _chunks: &[(String, Vec<f32>)]) -> Result<()> {
        Err(RecallError::Storage {
            backend: "failing".to_string(),
            message: "injected chunk insert failure".to_string(),
        })
    }

    async fn list_documents(&self) -> Result<Vec<DocumentMeta>> {
        self.inner.list_documents().await
    }

    async fn get_document(&self, document_id: i64) -> Result<Option<Document>> {
        self.inner.get_document(document_id).await
    }

    async fn all_chunks(&self) -> Result<Vec<StoredChunk>> {
        self.inner.all_chunks().await
    }

    async fn delete_document(&self, document_id: i64) -> Result<bool> {
        self.inner.delete_document(document_id).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
