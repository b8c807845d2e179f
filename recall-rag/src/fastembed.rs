//! Local embedding backend built on [fastembed](https://docs.rs/fastembed).
//!
//! This module is only available when the `local` feature is enabled.

use std::sync::Mutex;

use async_trait::async_trait;
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use crate::embedding::EmbeddingProvider;
use crate::error::{RecallError, Result};

/// An [`EmbeddingProvider`] backed by a locally-loaded ONNX
/// sentence-embedding model.
///
/// The model is loaded once at construction (an expensive step: seconds,
/// plus a one-time weight download) and held for the lifetime of the
/// provider. Share one instance process-wide behind an `Arc`; never load a
/// model per call. Inference calls are serialized behind a single mutex, so
/// the provider is safe to call from concurrent tasks.
///
/// # Example
///
/// ```rust,ignore
/// use recall_rag::fastembed::FastEmbedProvider;
///
/// let provider = FastEmbedProvider::load("all-MiniLM-L6-v2")?;
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

/// Map a model name to the fastembed model identifier.
fn model_for_name(name: &str) -> Result<EmbeddingModel> {
    match name {
        "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "all-MiniLM-L12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        _ => Err(RecallError::Config(format!("unknown embedding model '{name}'"))),
    }
}

impl FastEmbedProvider {
    /// Load the named model and probe its output dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`RecallError::Config`] for an unknown model name and
    /// [`RecallError::Embedding`] if the model fails to load or produces
    /// no output for the probe input.
    pub fn load(name: &str) -> Result<Self> {
        let model = model_for_name(name)?;

        info!(model = name, "loading embedding model");
        let embedding =
            TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(false))
                .map_err(|e| RecallError::Embedding {
                    provider: "fastembed".to_string(),
                    message: format!("failed to load model '{name}': {e}"),
                })?;

        // The dimensionality is a fixed constant of the model; probe it once
        // so the store can pin it for the lifetime of the database.
        let probe =
            embedding.embed(vec!["dimension probe"], None).map_err(|e| RecallError::Embedding {
                provider: "fastembed".to_string(),
                message: format!("model '{name}' failed on probe input: {e}"),
            })?;
        let dimensions = probe.first().map(Vec::len).ok_or_else(|| RecallError::Embedding {
            provider: "fastembed".to_string(),
            message: format!("model '{name}' returned no output for probe input"),
        })?;

        info!(model = name, dimensions, "embedding model ready");
        Ok(Self {
            model: Mutex::new(embedding),
            model_name: name.to_string(),
            dimensions,
        })
    }

    /// The name of the loaded model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn run(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let count = texts.len();
        let model = self.model.lock().map_err(|_| RecallError::Embedding {
            provider: "fastembed".to_string(),
            message: "embedding model lock poisoned".to_string(),
        })?;
        let embeddings = model.embed(texts, None).map_err(|e| RecallError::Embedding {
            provider: "fastembed".to_string(),
            message: e.to_string(),
        })?;
        if embeddings.len() != count {
            return Err(RecallError::Embedding {
                provider: "fastembed".to_string(),
                message: format!("model returned {} embeddings for {count} inputs", embeddings.len()),
            });
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RecallError::Embedding {
                provider: "fastembed".to_string(),
                message: "cannot embed empty text".to_string(),
            });
        }
        let mut embeddings = self.run(vec![text])?;
        Ok(embeddings.remove(0))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(RecallError::Embedding {
                provider: "fastembed".to_string(),
                message: "cannot embed empty text".to_string(),
            });
        }
        self.run(texts.to_vec())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
