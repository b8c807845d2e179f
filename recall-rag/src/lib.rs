//! # recall-rag
//!
//! The retrieval core of Recall, a local semantic search engine for
//! personal documents: chunk raw text into overlapping word windows, embed
//! each window with a sentence-embedding model, persist the vectors in an
//! embedded SQLite database, and answer queries by cosine-scoring every
//! stored chunk.
//!
//! ## Components
//!
//! - [`chunking::WordWindowChunker`] — overlapping word-window segmentation
//! - [`embedding::EmbeddingProvider`] — embedding backend trait;
//!   [`fastembed::FastEmbedProvider`] (feature `local`) runs a model in-process
//! - [`store::DocumentStore`] — persistence trait; [`sqlite::SqliteStore`]
//!   keeps documents, chunks, and embedding blobs in one database file
//! - [`retriever::Retriever`] — query embedding, brute-force cosine scan,
//!   top-k ranking
//! - [`pipeline::IngestionPipeline`] — chunk → embed → store orchestration
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use recall_rag::{
//!     IngestionPipeline, Retriever, SqliteStore, WordWindowChunker,
//!     fastembed::FastEmbedProvider,
//! };
//!
//! let provider = Arc::new(FastEmbedProvider::load("all-MiniLM-L6-v2")?);
//! let store = Arc::new(SqliteStore::open("recall.db", provider.dimensions())?);
//!
//! let pipeline = IngestionPipeline::builder()
//!     .chunker(Arc::new(WordWindowChunker::new(500, 50)?))
//!     .embedding_provider(provider.clone())
//!     .store(store.clone())
//!     .build()?;
//! pipeline.ingest("notes.txt", &raw_text).await?;
//!
//! let retriever = Retriever::new(provider, store);
//! for result in retriever.search("what did I write about lighthouses?", 5).await? {
//!     println!("[{:.4}] {}: {}", result.score, result.document_name, result.text);
//! }
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod pipeline;
pub mod retriever;
pub mod sqlite;
pub mod store;

#[cfg(feature = "local")]
pub mod fastembed;

pub use chunking::{Chunker, WordWindowChunker};
pub use config::{RecallConfig, RecallConfigBuilder};
pub use document::{Chunk, Document, DocumentMeta, SearchResult, StoredChunk};
pub use embedding::EmbeddingProvider;
pub use error::{RecallError, Result};
pub use pipeline::{IngestReport, IngestionPipeline, IngestionPipelineBuilder};
pub use retriever::{Retriever, cosine_similarity};
pub use sqlite::SqliteStore;
pub use store::DocumentStore;

#[cfg(feature = "local")]
pub use crate::fastembed::FastEmbedProvider;
