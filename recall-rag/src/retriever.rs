//! Query-time retrieval: embed the query, scan the corpus, rank by cosine
//! similarity.

use std::sync::Arc;

use tracing::{debug, info};

use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RecallError, Result};
use crate::store::DocumentStore;

/// Compute cosine similarity between two vectors.
///
/// Returns exactly `0.0` when either vector has zero magnitude, never NaN
/// and never a division error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Scores a query against every stored chunk and returns the top matches.
///
/// The scan is brute force: every chunk in the store is re-scored per query.
/// That is acceptable for a personal corpus of at most a few tens of
/// thousands of chunks and is the scalability ceiling of this design; past
/// that, swap the [`DocumentStore`] scan for an approximate-nearest-neighbor
/// index behind the same trait.
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn DocumentStore>,
    score_floor: Option<f32>,
}

impl Retriever {
    /// Create a retriever over the given embedder and store.
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn DocumentStore>) -> Self {
        Self { embedding_provider, store, score_floor: None }
    }

    /// Drop results scoring below `floor`. Off by default: even
    /// low-relevance chunks are returned if `top_k` asks for them.
    pub fn with_score_floor(mut self, floor: f32) -> Self {
        self.score_floor = Some(floor);
        self
    }

    /// Search for the chunks most similar to `query`.
    ///
    /// Results are sorted by descending score; ties keep insertion order, so
    /// identical inputs always rank identically. At most `top_k` results are
    /// returned; an empty corpus yields an empty `Vec`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Config`] if `top_k` is zero, and
    /// [`RecallError::Storage`] if the stored embeddings do not match the
    /// query embedding's dimensionality: a stale database must surface to
    /// the caller rather than produce garbage scores.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RecallError::Config("top_k must be greater than zero".to_string()));
        }

        let query_embedding = self.embedding_provider.embed(query).await?;
        let corpus = self.store.all_chunks().await?;
        debug!(corpus_size = corpus.len(), top_k, "scoring corpus");

        let mut results = Vec::with_capacity(corpus.len());
        for stored in corpus {
            if stored.chunk.embedding.len() != query_embedding.len() {
                return Err(RecallError::Storage {
                    backend: "store".to_string(),
                    message: format!(
                        "chunk {} has a {}-dimensional embedding but the query has {}; \
                         the index was built with a different model",
                        stored.chunk.id,
                        stored.chunk.embedding.len(),
                        query_embedding.len(),
                    ),
                });
            }
            let score = cosine_similarity(&query_embedding, &stored.chunk.embedding);
            results.push(SearchResult {
                document_id: stored.chunk.document_id,
                document_name: stored.document_name,
                chunk_id: stored.chunk.id,
                text: stored.chunk.text,
                score,
            });
        }

        // Stable sort: equal scores keep their insertion order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);
        if let Some(floor) = self.score_floor {
            results.retain(|r| r.score >= floor);
        }

        info!(result_count = results.len(), "search completed");
        Ok(results)
    }
}
