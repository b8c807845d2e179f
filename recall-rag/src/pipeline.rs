//! Ingestion pipeline: chunk, embed, store.
//!
//! The [`IngestionPipeline`] coordinates a [`Chunker`], an
//! [`EmbeddingProvider`], and a [`DocumentStore`] to turn a (name, raw text)
//! pair into a stored document with embedded chunks. It is independent of
//! the query path; the store is the only shared resource.

use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::embedding::EmbeddingProvider;
use crate::error::{RecallError, Result};
use crate::store::DocumentStore;

/// The outcome of a successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Id assigned to the new document.
    pub document_id: i64,
    /// Number of chunks stored for it.
    pub chunk_count: usize,
}

/// Orchestrates document ingestion. Construct one via
/// [`IngestionPipeline::builder()`].
///
/// # Example
///
/// ```rust,ignore
/// use recall_rag::pipeline::IngestionPipeline;
///
/// let pipeline = IngestionPipeline::builder()
///     .chunker(Arc::new(chunker))
///     .embedding_provider(Arc::new(provider))
///     .store(Arc::new(store))
///     .build()?;
///
/// let report = pipeline.ingest("notes.txt", &raw_text).await?;
/// println!("stored {} chunks", report.chunk_count);
/// ```
pub struct IngestionPipeline {
    chunker: Arc<dyn Chunker>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn DocumentStore>,
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    /// Ingest one document: insert the document row, chunk the text, embed
    /// the chunks, and store them.
    ///
    /// A document that chunks to nothing is still recorded, with a chunk
    /// count of zero, so the upload stays visible rather than silently
    /// disappearing.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Ingestion`] on any embedding or storage
    /// failure. The document row created for the attempt is removed first:
    /// no half-populated document survives a failed ingestion.
    pub async fn ingest(&self, name: &str, text: &str) -> Result<IngestReport> {
        let document_id = self
            .store
            .insert_document(name, text)
            .await
            .map_err(|e| Self::wrap(name, e))?;

        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            info!(document_id, name, "document produced no searchable text");
            return Ok(IngestReport { document_id, chunk_count: 0 });
        }

        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = match self.embedding_provider.embed_batch(&texts).await {
            Ok(embeddings) => embeddings,
            Err(e) => return Err(self.roll_back(document_id, name, e).await),
        };
        if embeddings.len() != chunks.len() {
            let cause = RecallError::Embedding {
                provider: "embed_batch".to_string(),
                message: format!(
                    "returned {} embeddings for {} chunks",
                    embeddings.len(),
                    chunks.len(),
                ),
            };
            return Err(self.roll_back(document_id, name, cause).await);
        }

        let rows: Vec<(String, Vec<f32>)> = chunks.into_iter().zip(embeddings).collect();
        if let Err(e) = self.store.insert_chunks(document_id, &rows).await {
            return Err(self.roll_back(document_id, name, e).await);
        }

        info!(document_id, chunk_count = rows.len(), name, "ingested document");
        Ok(IngestReport { document_id, chunk_count: rows.len() })
    }

    /// Remove the document row of a failed ingestion, then wrap the cause.
    async fn roll_back(&self, document_id: i64, name: &str, cause: RecallError) -> RecallError {
        if let Err(e) = self.store.delete_document(document_id).await {
            error!(document_id, error = %e, "rollback after failed ingestion also failed");
        }
        error!(document = name, error = %cause, "ingestion failed");
        Self::wrap(name, cause)
    }

    fn wrap(name: &str, cause: RecallError) -> RecallError {
        RecallError::Ingestion { document: name.to_string(), message: cause.to_string() }
    }
}

/// Builder for constructing an [`IngestionPipeline`].
///
/// All fields are required. Call [`build()`](IngestionPipelineBuilder::build)
/// to validate and produce the pipeline.
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    chunker: Option<Arc<dyn Chunker>>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl IngestionPipelineBuilder {
    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the document store.
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the [`IngestionPipeline`], validating that all fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Config`] if any required field is missing.
    pub fn build(self) -> Result<IngestionPipeline> {
        let chunker = self
            .chunker
            .ok_or_else(|| RecallError::Config("chunker is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RecallError::Config("embedding_provider is required".to_string()))?;
        let store =
            self.store.ok_or_else(|| RecallError::Config("store is required".to_string()))?;

        Ok(IngestionPipeline { chunker, embedding_provider, store })
    }
}
